//! Signing Error Types
//!
//! Every variant of [`SignError`] is fatal to a signing run. Per-file
//! signing misses are not errors; they surface as
//! [`FileOutcome::Skipped`](crate::FileOutcome::Skipped) instead.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the crate
pub type SignResult<T> = Result<T, SignError>;

/// Fatal signing errors
#[derive(Debug, Error)]
pub enum SignError {
    /// A required external program is not on `PATH`
    #[error("Cannot sign UEFI binaries ({0} not found)")]
    MissingTool(String),

    /// A key or certificate file does not exist
    #[error("{role}: {}", path.display())]
    MissingKeyFile { role: &'static str, path: PathBuf },

    /// Rewriting a binary section failed
    #[error("Section injection failed: {section} in {}", path.display())]
    InjectionFailed { path: PathBuf, section: String },

    /// Copying the signed artifact over the target failed
    #[error("Install failed: {}", path.display())]
    InstallFailed { path: PathBuf },

    /// The installed artifact did not pass verification
    #[error("Verification failed: {}", path.display())]
    VerificationFailed { path: PathBuf },

    /// The caller supplied an unusable glob pattern
    #[error("Invalid glob pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The scratch workspace could not be created
    #[error("Cannot create signing workspace: {0}")]
    Workspace(#[source] std::io::Error),

    /// An external program could not be started at all
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl SignError {
    /// Create a MissingTool error
    pub fn missing_tool(name: impl Into<String>) -> Self {
        Self::MissingTool(name.into())
    }

    /// Create a MissingKeyFile error
    pub fn missing_key_file(role: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingKeyFile {
            role,
            path: path.into(),
        }
    }

    /// Create an InjectionFailed error
    pub fn injection_failed(path: &Path, section: impl Into<String>) -> Self {
        Self::InjectionFailed {
            path: path.to_path_buf(),
            section: section.into(),
        }
    }

    /// Create an InstallFailed error
    pub fn install_failed(path: &Path) -> Self {
        Self::InstallFailed {
            path: path.to_path_buf(),
        }
    }

    /// Create a VerificationFailed error
    pub fn verification_failed(path: &Path) -> Self {
        Self::VerificationFailed {
            path: path.to_path_buf(),
        }
    }

    /// Create an InvalidPattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error happened before any file was touched
    pub fn is_preflight(&self) -> bool {
        matches!(self, Self::MissingTool(_) | Self::MissingKeyFile { .. })
    }

    /// The file this error is about, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingKeyFile { path, .. }
            | Self::InjectionFailed { path, .. }
            | Self::InstallFailed { path }
            | Self::VerificationFailed { path } => Some(path),
            _ => None,
        }
    }
}
