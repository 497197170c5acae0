//! Embedded public key injection
//!
//! crdyboot carries a verification public key in its `.vbpubk` section.
//! Builds ship a development key there; before signing, the section is
//! overwritten with the real kernel subkey.

use std::path::Path;

use crate::context::{ProgressEvent, SignContext};
use crate::error::{SignError, SignResult};
use crate::tools::SigningTools;

/// Section of the crdyboot image holding the kernel subkey
pub const VBPUBK_SECTION: &str = ".vbpubk";

/// Bootloader family that needs [`VBPUBK_SECTION`] rewritten
pub const CRDYBOOT_GLOB: &str = "crdyboot*.efi";

/// Replace `section` in `binary` with the bytes of `data_file`, in place.
///
/// Any failure is fatal: a bootloader must never be signed with the wrong
/// key embedded.
pub fn inject_section<T: SigningTools>(
    tools: &T,
    ctx: &SignContext,
    binary: &Path,
    section: &str,
    data_file: &Path,
) -> SignResult<()> {
    ctx.report(ProgressEvent::UpdatingSection {
        path: binary,
        section,
    });
    match tools.update_section(binary, section, data_file) {
        Ok(done) if done.is_success() => Ok(()),
        Ok(done) => {
            tracing::error!("objcopy exited with {:?} for {}", done, binary.display());
            Err(SignError::injection_failed(binary, section))
        }
        Err(err) => {
            tracing::error!("{}", err);
            Err(SignError::injection_failed(binary, section))
        }
    }
}
