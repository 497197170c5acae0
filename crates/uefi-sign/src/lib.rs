//! UEFI Secure Boot signing
//!
//! Signs the bootloaders and kernels of a boot directory with external
//! tools (`sbsign`, `sbverify`, `sbattach`, `objcopy`). For crdyboot the
//! embedded kernel subkey is replaced before signing.
//!
//! ```no_run
//! use uefi_sign::{sign_directory, CommandTools, KeyMaterial, SignContext, ToolConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), uefi_sign::SignError> {
//! let config = ToolConfig::default();
//! config.check_available()?;
//! let keys = KeyMaterial::new(
//!     "pkcs11:token=uefi;object=db",
//!     "/keys/db.pem",
//!     "/keys/db.crt",
//!     "/keys/kernel_subkey.vbpubk",
//! );
//! keys.validate()?;
//! let report = sign_directory(
//!     &CommandTools::new(config),
//!     &SignContext::default(),
//!     Path::new("/mnt/esp"),
//!     &keys,
//!     "*.efi",
//! )?;
//! println!("signed {} file(s)", report.signed.len());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod inject;
pub mod keys;
pub mod orchestrator;
pub mod signer;
pub mod tools;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use context::{ProgressEvent, ProgressReporter, SignContext, TracingReporter};
pub use error::{SignError, SignResult};
pub use inject::{inject_section, CRDYBOOT_GLOB, VBPUBK_SECTION};
pub use keys::{KeyMaterial, PKCS11_URI_PREFIX};
pub use orchestrator::{enumerate, sign_directory, SignReport};
pub use signer::{FileOutcome, FileSigner};
pub use tools::{CommandTools, Completion, SignRequest, SigningTools, ToolConfig};
pub use workspace::SigningWorkspace;
