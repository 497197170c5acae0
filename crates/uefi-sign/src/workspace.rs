//! Scratch directory for signed copies

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{SignError, SignResult};

/// Private scratch directory owned by one signing run.
///
/// Signed copies are written here before being installed over their
/// targets. The directory and everything in it is removed when the value is
/// dropped, which also happens when a fatal error unwinds the run.
#[derive(Debug)]
pub struct SigningWorkspace {
    dir: TempDir,
}

impl SigningWorkspace {
    pub fn create() -> SignResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("uefi-sign.")
            .tempdir()
            .map_err(SignError::Workspace)?;
        tracing::debug!("created signing workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Location of the signed copy of `target`, named after the target file
    pub fn signed_path_for(&self, target: &Path) -> PathBuf {
        match target.file_name() {
            Some(name) => self.dir.path().join(name),
            None => self.dir.path().join("signed.efi"),
        }
    }
}
