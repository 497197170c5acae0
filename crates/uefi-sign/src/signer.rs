//! Per-file sign, install and verify protocol

use std::path::{Path, PathBuf};

use crate::context::{ProgressEvent, SignContext};
use crate::error::{SignError, SignResult};
use crate::keys::KeyMaterial;
use crate::tools::{SignRequest, SigningTools};
use crate::workspace::SigningWorkspace;

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Signed, installed over the original and verified
    Signed(PathBuf),
    /// The signing program rejected the file; it was left untouched
    Skipped { path: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Signed(path) | Self::Skipped { path, .. } => path,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed(_))
    }
}

/// Signs EFI binaries one at a time using a shared workspace
pub struct FileSigner<'a, T: SigningTools> {
    tools: &'a T,
    keys: &'a KeyMaterial,
    workspace: &'a SigningWorkspace,
    ctx: &'a SignContext,
}

impl<'a, T: SigningTools> FileSigner<'a, T> {
    pub fn new(
        tools: &'a T,
        keys: &'a KeyMaterial,
        workspace: &'a SigningWorkspace,
        ctx: &'a SignContext,
    ) -> Self {
        Self {
            tools,
            keys,
            workspace,
            ctx,
        }
    }

    /// Sign `target` in place, if possible.
    ///
    /// A signing failure leaves the file as it was and yields
    /// [`FileOutcome::Skipped`]. A verification failure is fatal and leaves
    /// the freshly installed copy in place.
    pub fn sign_file(&self, target: &Path) -> SignResult<FileOutcome> {
        self.ctx.report(ProgressEvent::Signing(target));

        // The file may never have been signed.
        match self.tools.remove_signature(target) {
            Ok(done) if done.is_success() => {}
            _ => self.ctx.report(ProgressEvent::RemovalIgnored(target)),
        }

        let signed = self.workspace.signed_path_for(target);
        let request = SignRequest {
            private_key: self.keys.private_key(),
            cert: self.keys.sign_cert(),
            output: &signed,
            input: target,
            pkcs11: self.keys.is_private_key_pkcs11(),
        };
        let rendered = request
            .to_args()
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.ctx.report(ProgressEvent::SignCommand(&rendered));

        let done = self.tools.sign(&request)?;
        if !done.is_success() {
            self.ctx.report(ProgressEvent::CannotSign(target));
            return Ok(FileOutcome::Skipped {
                path: target.to_path_buf(),
                reason: format!("sbsign exited with {:?}", done),
            });
        }

        if !self.tools.install(&signed, target)?.is_success() {
            return Err(SignError::install_failed(target));
        }

        if !self.tools.verify(target, self.keys.verify_cert())?.is_success() {
            return Err(SignError::verification_failed(target));
        }

        self.ctx.report(ProgressEvent::Verified(target));
        Ok(FileOutcome::Signed(target.to_path_buf()))
    }
}
