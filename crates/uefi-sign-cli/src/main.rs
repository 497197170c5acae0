//! Sign the UEFI binaries in a boot directory.
//!
//! The target directory can be either the root of the ESP or `/boot` of the
//! root filesystem.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use uefi_sign::{
    sign_directory, CommandTools, KeyMaterial, SignContext, SignError, SignReport, ToolConfig,
};

use crate::logging::LogConfig;

#[derive(Parser, Debug)]
#[command(
    name = "sign_uefi",
    version,
    about = "Sign the UEFI binaries in the target directory",
    long_about = "Sign the UEFI binaries in the target directory.\n\n\
        The target directory can be either the root of the ESP or /boot of \
        the root filesystem."
)]
struct Cli {
    /// Path of a boot directory, either the root of the ESP or /boot of the root filesystem
    #[arg(long)]
    target_dir: PathBuf,

    /// Path of the private signing key, or a pkcs11: URI
    #[arg(long)]
    private_key: PathBuf,

    /// Path of the signing certificate
    #[arg(long)]
    sign_cert: PathBuf,

    /// Path of the verification certificate
    #[arg(long)]
    verify_cert: PathBuf,

    /// Path of the kernel subkey public key
    #[arg(long)]
    kernel_subkey_vbpubk: PathBuf,

    /// Glob pattern of EFI files to sign, e.g. '*.efi'
    #[arg(long)]
    efi_glob: String,

    /// Run privileged steps directly instead of through sudo
    #[arg(long)]
    no_sudo: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        LogConfig {
            verbose: self.verbose,
        }
    }

    fn tool_config(&self) -> ToolConfig {
        let config = ToolConfig::default();
        if self.no_sudo {
            config.without_elevation()
        } else {
            config
        }
    }

    fn keys(&self) -> KeyMaterial {
        KeyMaterial::new(
            self.private_key.clone(),
            self.sign_cert.clone(),
            self.verify_cert.clone(),
            self.kernel_subkey_vbpubk.clone(),
        )
    }
}

/// Exit status when the run failed before any file was touched
const EXIT_PREFLIGHT: u8 = 2;
/// Exit status for failures during signing
const EXIT_FAILED: u8 = 1;

fn run(cli: &Cli, config: ToolConfig) -> Result<SignReport> {
    config.check_available()?;

    let keys = cli.keys();
    keys.validate()?;

    let ctx = SignContext::default();
    let report = sign_directory(
        &CommandTools::new(config),
        &ctx,
        &cli.target_dir,
        &keys,
        &cli.efi_glob,
    )?;
    Ok(report)
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SignError>() {
        Some(sign_err) if sign_err.is_preflight() => EXIT_PREFLIGHT,
        _ => EXIT_FAILED,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_config());

    match run(&cli, cli.tool_config()) {
        Ok(report) => {
            tracing::info!(
                "signed {} file(s), skipped {}",
                report.signed.len(),
                report.skipped.len()
            );
            for path in &report.skipped {
                tracing::debug!("left unsigned: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            let status = exit_status(&err);
            if status == EXIT_PREFLIGHT {
                eprintln!("No files were modified.");
            }
            ExitCode::from(status)
        }
    }
}
