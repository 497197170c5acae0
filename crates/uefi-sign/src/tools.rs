//! External signing primitives
//!
//! Signing, verification, signature removal and section rewriting are all
//! delegated to external programs (`sbsign`, `sbverify`, `sbattach`,
//! `objcopy`). [`SigningTools`] is the seam between the signing protocol and
//! those programs; [`CommandTools`] is the implementation that actually runs
//! them.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{SignError, SignResult};

/// How an external program completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Success,
    /// Non-zero exit; `None` when killed by a signal
    Failed(Option<i32>),
}

impl Completion {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Arguments for one invocation of the signing primitive
#[derive(Debug, Clone, Copy)]
pub struct SignRequest<'a> {
    /// Private key path or PKCS#11 URI
    pub private_key: &'a OsStr,
    pub cert: &'a Path,
    /// Where the signed copy is written
    pub output: &'a Path,
    /// The unsigned input
    pub input: &'a Path,
    /// Route key operations through the PKCS#11 engine
    pub pkcs11: bool,
}

impl SignRequest<'_> {
    /// Argument vector for `sbsign`
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--key".into(),
            self.private_key.to_os_string(),
            "--cert".into(),
            self.cert.into(),
            "--output".into(),
            self.output.into(),
            self.input.into(),
        ];
        if self.pkcs11 {
            args.push("--engine".into());
            args.push("pkcs11".into());
        }
        args
    }
}

/// The opaque primitives a signing run depends on.
///
/// Every method returns `Ok` with the program's completion when the program
/// ran, and `Err` only when it could not be started.
pub trait SigningTools {
    /// Strip any embedded signature from `target`
    fn remove_signature(&self, target: &Path) -> SignResult<Completion>;

    /// Write a signed copy of `request.input` to `request.output`
    fn sign(&self, request: &SignRequest<'_>) -> SignResult<Completion>;

    /// Overwrite `target` with `signed`, keeping the target path
    fn install(&self, signed: &Path, target: &Path) -> SignResult<Completion>;

    /// Verify `target` against `cert`
    fn verify(&self, target: &Path, cert: &Path) -> SignResult<Completion>;

    /// Replace the contents of `section` in `binary` with the bytes of `data`
    fn update_section(&self, binary: &Path, section: &str, data: &Path)
        -> SignResult<Completion>;
}

/// Program names used by [`CommandTools`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub objcopy: PathBuf,
    pub sbattach: PathBuf,
    pub sbsign: PathBuf,
    pub sbverify: PathBuf,
    pub cp: PathBuf,
    /// Prefix for steps that modify files outside the workspace
    pub elevate: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            objcopy: "objcopy".into(),
            sbattach: "sbattach".into(),
            sbsign: "sbsign".into(),
            sbverify: "sbverify".into(),
            cp: "cp".into(),
            elevate: Some("sudo".into()),
        }
    }
}

impl ToolConfig {
    /// Run privileged steps directly instead of through `sudo`
    pub fn without_elevation(mut self) -> Self {
        self.elevate = None;
        self
    }

    /// Programs that must be on `PATH` before any file is touched
    pub fn required_tools(&self) -> Vec<&Path> {
        let mut tools = vec![
            self.objcopy.as_path(),
            self.sbattach.as_path(),
            self.sbsign.as_path(),
            self.sbverify.as_path(),
        ];
        if let Some(elevate) = &self.elevate {
            tools.push(elevate.as_path());
        }
        tools
    }

    /// Fail with [`SignError::MissingTool`] for the first program not found
    pub fn check_available(&self) -> SignResult<()> {
        for tool in self.required_tools() {
            if which::which(tool).is_err() {
                return Err(SignError::missing_tool(tool.display().to_string()));
            }
            tracing::debug!("found {}", tool.display());
        }
        Ok(())
    }
}

/// [`SigningTools`] backed by real processes
#[derive(Debug, Clone, Default)]
pub struct CommandTools {
    config: ToolConfig,
}

impl CommandTools {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    fn privileged(&self, program: &Path) -> Command {
        match &self.config.elevate {
            Some(elevate) => {
                let mut cmd = Command::new(elevate);
                cmd.arg(program);
                cmd
            }
            None => Command::new(program),
        }
    }

    fn run(mut cmd: Command) -> SignResult<Completion> {
        tracing::debug!("running {:?}", cmd);
        let status = cmd.status().map_err(|source| SignError::Spawn {
            program: cmd.get_program().to_string_lossy().to_string(),
            source,
        })?;
        if status.success() {
            Ok(Completion::Success)
        } else {
            Ok(Completion::Failed(status.code()))
        }
    }
}

impl SigningTools for CommandTools {
    fn remove_signature(&self, target: &Path) -> SignResult<Completion> {
        let mut cmd = self.privileged(&self.config.sbattach);
        cmd.arg("--remove").arg(target);
        Self::run(cmd)
    }

    fn sign(&self, request: &SignRequest<'_>) -> SignResult<Completion> {
        let mut cmd = Command::new(&self.config.sbsign);
        cmd.args(request.to_args());
        Self::run(cmd)
    }

    fn install(&self, signed: &Path, target: &Path) -> SignResult<Completion> {
        let mut cmd = self.privileged(&self.config.cp);
        cmd.arg("--force").arg(signed).arg(target);
        Self::run(cmd)
    }

    fn verify(&self, target: &Path, cert: &Path) -> SignResult<Completion> {
        let mut cmd = Command::new(&self.config.sbverify);
        cmd.arg("--cert").arg(cert).arg(target);
        Self::run(cmd)
    }

    fn update_section(
        &self,
        binary: &Path,
        section: &str,
        data: &Path,
    ) -> SignResult<Completion> {
        let mut spec = OsString::from(section);
        spec.push("=");
        spec.push(data);
        let mut cmd = self.privileged(&self.config.objcopy);
        cmd.arg("--update-section").arg(spec).arg(binary);
        Self::run(cmd)
    }
}
