//! Key material used by a signing run

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{SignError, SignResult};

/// URI scheme marking a private key held in a hardware security module
pub const PKCS11_URI_PREFIX: &str = "pkcs11:";

/// Keys and certificates for one signing run.
///
/// `private_key` is either a filesystem path or a PKCS#11 URI. The value is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    private_key: OsString,
    sign_cert: PathBuf,
    verify_cert: PathBuf,
    kernel_subkey_vbpubk: PathBuf,
}

impl KeyMaterial {
    pub fn new(
        private_key: impl Into<OsString>,
        sign_cert: impl Into<PathBuf>,
        verify_cert: impl Into<PathBuf>,
        kernel_subkey_vbpubk: impl Into<PathBuf>,
    ) -> Self {
        Self {
            private_key: private_key.into(),
            sign_cert: sign_cert.into(),
            verify_cert: verify_cert.into(),
            kernel_subkey_vbpubk: kernel_subkey_vbpubk.into(),
        }
    }

    /// Private key reference as handed to the signing tool
    pub fn private_key(&self) -> &std::ffi::OsStr {
        &self.private_key
    }

    pub fn sign_cert(&self) -> &Path {
        &self.sign_cert
    }

    pub fn verify_cert(&self) -> &Path {
        &self.verify_cert
    }

    pub fn kernel_subkey_vbpubk(&self) -> &Path {
        &self.kernel_subkey_vbpubk
    }

    /// Whether the private key is a PKCS#11 URI rather than a local file
    pub fn is_private_key_pkcs11(&self) -> bool {
        self.private_key
            .to_string_lossy()
            .starts_with(PKCS11_URI_PREFIX)
    }

    /// Check that every key artifact that lives on disk is a regular file.
    ///
    /// The private key is only checked when it is a local path.
    pub fn validate(&self) -> SignResult<()> {
        ensure_file_exists(&self.verify_cert, "No verification cert")?;
        ensure_file_exists(&self.sign_cert, "No signing cert")?;
        ensure_file_exists(&self.kernel_subkey_vbpubk, "No kernel subkey public key")?;
        if !self.is_private_key_pkcs11() {
            ensure_file_exists(Path::new(&self.private_key), "No signing key")?;
        }
        Ok(())
    }
}

fn ensure_file_exists(path: &Path, role: &'static str) -> SignResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SignError::missing_key_file(role, path))
    }
}
