//! Run context and progress reporting
//!
//! The entry point builds one [`SignContext`] per run and hands it to the
//! components that report progress. Per-file signing progress goes through
//! a [`ProgressReporter`]. Low-level diagnostics (tool lookup, command
//! lines, workspace creation, unreadable directory entries, failed section
//! rewrites) are emitted with `tracing` directly and reach whatever
//! subscriber the binary installed.

use std::path::Path;
use std::sync::Arc;

/// Progress events emitted during a signing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    /// A file is about to be signed
    Signing(&'a Path),
    /// The signing tool is being invoked with these arguments
    SignCommand(&'a str),
    /// A section is about to be rewritten
    UpdatingSection { path: &'a Path, section: &'a str },
    /// Signature removal did not succeed; not an error
    RemovalIgnored(&'a Path),
    /// The file could not be signed and was left untouched
    CannotSign(&'a Path),
    /// The file was signed, installed and verified
    Verified(&'a Path),
}

/// Sink for progress events
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent<'_>);
}

/// Reporter that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent<'_>) {
        match event {
            ProgressEvent::Signing(path) => {
                tracing::info!("signing efi file {}", path.display())
            }
            ProgressEvent::SignCommand(cmd) => tracing::info!("running sbsign: {}", cmd),
            ProgressEvent::UpdatingSection { path, section } => {
                let name = path.file_name().map(|n| n.to_string_lossy());
                tracing::info!(
                    "updating section {} in {}",
                    section,
                    name.as_deref().unwrap_or("<unnamed>")
                )
            }
            ProgressEvent::RemovalIgnored(path) => {
                tracing::debug!("no signature removed from {}", path.display())
            }
            ProgressEvent::CannotSign(path) => tracing::warn!("cannot sign {}", path.display()),
            ProgressEvent::Verified(path) => tracing::debug!("verified {}", path.display()),
        }
    }
}

/// Shared state for one signing run
#[derive(Clone)]
pub struct SignContext {
    reporter: Arc<dyn ProgressReporter>,
}

impl Default for SignContext {
    fn default() -> Self {
        Self::new(Arc::new(TracingReporter))
    }
}

impl std::fmt::Debug for SignContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignContext").finish_non_exhaustive()
    }
}

impl SignContext {
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self { reporter }
    }

    pub fn report(&self, event: ProgressEvent<'_>) {
        self.reporter.report(event);
    }
}
