//! In-memory stand-in for the external signing programs

use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SignError, SignResult};
use crate::tools::{Completion, SignRequest, SigningTools};

pub const SIGNED_MARKER: &[u8] = b"+signed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Remove(PathBuf),
    Sign {
        key: OsString,
        input: PathBuf,
        output: PathBuf,
        pkcs11: bool,
    },
    Install { signed: PathBuf, target: PathBuf },
    Verify(PathBuf),
    UpdateSection { binary: PathBuf, section: String, data: PathBuf },
}

/// Records every call and mimics the programs' effect on disk.
///
/// Signing appends [`SIGNED_MARKER`] to the input bytes; installing copies
/// the signed file over the target.
#[derive(Default)]
pub struct FakeTools {
    pub calls: RefCell<Vec<Call>>,
    pub fail_remove: bool,
    pub fail_sign: HashSet<String>,
    pub fail_verify: bool,
    pub fail_inject: bool,
    pub fail_install: bool,
    /// Workspace seen by the last sign call
    pub last_output_dir: RefCell<Option<PathBuf>>,
}

fn completion(fail: bool) -> Completion {
    if fail {
        Completion::Failed(Some(1))
    } else {
        Completion::Success
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_sign(names: &[&str]) -> Self {
        Self {
            fail_sign: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Compact trace: `sign:<name>`, `inject:<name>`, one per call of interest
    pub fn trace(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Sign { input, .. } => Some(format!("sign:{}", file_name(&input))),
                Call::UpdateSection { binary, .. } => {
                    Some(format!("inject:{}", file_name(&binary)))
                }
                _ => None,
            })
            .collect()
    }
}

impl SigningTools for FakeTools {
    fn remove_signature(&self, target: &Path) -> SignResult<Completion> {
        self.calls.borrow_mut().push(Call::Remove(target.to_path_buf()));
        Ok(completion(self.fail_remove))
    }

    fn sign(&self, request: &SignRequest<'_>) -> SignResult<Completion> {
        self.calls.borrow_mut().push(Call::Sign {
            key: request.private_key.to_os_string(),
            input: request.input.to_path_buf(),
            output: request.output.to_path_buf(),
            pkcs11: request.pkcs11,
        });
        *self.last_output_dir.borrow_mut() = request.output.parent().map(Path::to_path_buf);
        if self.fail_sign.contains(&file_name(request.input)) {
            return Ok(Completion::Failed(Some(1)));
        }
        let mut bytes = fs::read(request.input).map_err(|source| SignError::Spawn {
            program: "fake-sbsign".to_string(),
            source,
        })?;
        bytes.extend_from_slice(SIGNED_MARKER);
        fs::write(request.output, bytes).map_err(|source| SignError::Spawn {
            program: "fake-sbsign".to_string(),
            source,
        })?;
        Ok(Completion::Success)
    }

    fn install(&self, signed: &Path, target: &Path) -> SignResult<Completion> {
        self.calls.borrow_mut().push(Call::Install {
            signed: signed.to_path_buf(),
            target: target.to_path_buf(),
        });
        if self.fail_install {
            return Ok(Completion::Failed(Some(1)));
        }
        fs::copy(signed, target).map_err(|source| SignError::Spawn {
            program: "fake-cp".to_string(),
            source,
        })?;
        Ok(Completion::Success)
    }

    fn verify(&self, target: &Path, _cert: &Path) -> SignResult<Completion> {
        self.calls.borrow_mut().push(Call::Verify(target.to_path_buf()));
        Ok(completion(self.fail_verify))
    }

    fn update_section(
        &self,
        binary: &Path,
        section: &str,
        data: &Path,
    ) -> SignResult<Completion> {
        self.calls.borrow_mut().push(Call::UpdateSection {
            binary: binary.to_path_buf(),
            section: section.to_string(),
            data: data.to_path_buf(),
        });
        Ok(completion(self.fail_inject))
    }
}

/// Key files in a temporary directory
pub struct TestKeys {
    pub dir: tempfile::TempDir,
}

impl TestKeys {
    pub fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["db.key", "db.pem", "db.crt", "kernel_subkey.vbpubk"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        Self { dir }
    }

    pub fn keys(&self) -> crate::KeyMaterial {
        let p = |name: &str| self.dir.path().join(name);
        crate::KeyMaterial::new(
            p("db.key"),
            p("db.pem"),
            p("db.crt"),
            p("kernel_subkey.vbpubk"),
        )
    }
}
