//! Boot directory signing
//!
//! Walks the conventional locations of a boot directory (the root of an ESP
//! or `/boot` of a root filesystem) and signs what it finds:
//!
//! 1. `efi/boot/<efi_glob>`: generic bootloaders
//! 2. `efi/boot/crdyboot*.efi`: key injection, then signing
//! 3. `syslinux/vmlinuz.?`: syslinux kernels
//! 4. `vmlinuz`: the root kernel image, symlinks resolved
//!
//! Categories run in that order; matches within a category run in sorted
//! path order. One workspace serves the whole call.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::context::SignContext;
use crate::error::{SignError, SignResult};
use crate::inject::{inject_section, CRDYBOOT_GLOB, VBPUBK_SECTION};
use crate::keys::KeyMaterial;
use crate::signer::{FileOutcome, FileSigner};
use crate::tools::SigningTools;
use crate::workspace::SigningWorkspace;

const BOOTLOADER_DIR: &str = "efi/boot";
const SYSLINUX_DIR: &str = "syslinux";
const SYSLINUX_KERNEL_GLOB: &str = "vmlinuz.?";
const KERNEL_NAME: &str = "vmlinuz";

/// Files handled by one [`sign_directory`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignReport {
    /// Signed, installed and verified
    pub signed: Vec<PathBuf>,
    /// Rejected by the signing program and left as they were
    pub skipped: Vec<PathBuf>,
}

impl SignReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Signed(path) => self.signed.push(path),
            FileOutcome::Skipped { path, .. } => self.skipped.push(path),
        }
    }

    pub fn total(&self) -> usize {
        self.signed.len() + self.skipped.len()
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Compile one path component of a caller-supplied glob.
///
/// An unclosed `[` is taken literally, as shell globbing does. Runs of `*`
/// mean the same as a single `*` inside one component.
fn compile_component(component: &str) -> SignResult<Pattern> {
    if let Ok(pattern) = Pattern::new(component) {
        return Ok(pattern);
    }
    let mut literal = String::with_capacity(component.len());
    let mut prev_star = false;
    for c in component.chars() {
        match c {
            '[' => literal.push_str("[[]"),
            '*' if prev_star => continue,
            _ => literal.push(c),
        }
        prev_star = c == '*';
    }
    Pattern::new(&literal).map_err(|e| SignError::invalid_pattern(component, e))
}

fn compile(pattern: &str) -> SignResult<Vec<Pattern>> {
    pattern
        .split('/')
        .filter(|c| !c.is_empty())
        .map(compile_component)
        .collect()
}

/// Regular files under `dir` matching `pattern`, sorted by path.
///
/// `dir` is listed directly rather than spliced into the pattern, so any
/// directory name works, UTF-8 or not. A missing `dir` simply yields no
/// matches. Directories and dangling symlinks are left out.
pub fn enumerate(dir: &Path, pattern: &str) -> SignResult<Vec<PathBuf>> {
    let components = compile(pattern)?;

    let mut candidates = vec![dir.to_path_buf()];
    for component in &components {
        let mut next = Vec::new();
        for parent in &candidates {
            let Ok(entries) = fs::read_dir(parent) else {
                continue;
            };
            for entry in entries {
                match entry {
                    Ok(entry) => {
                        let name = entry.file_name();
                        if component.matches_with(&name.to_string_lossy(), MATCH_OPTIONS) {
                            next.push(entry.path());
                        }
                    }
                    Err(e) => tracing::warn!("Cannot read entry in {}: {}", parent.display(), e),
                }
            }
        }
        candidates = next;
    }

    let mut files: Vec<PathBuf> = candidates.into_iter().filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

/// Sign the EFI binaries and kernels under `target_dir`.
///
/// Per-file signing failures are collected in the report. Key validation,
/// injection, install and verification failures abort the call; files
/// already installed stay installed, and the workspace is removed either way.
pub fn sign_directory<T: SigningTools>(
    tools: &T,
    ctx: &SignContext,
    target_dir: &Path,
    keys: &KeyMaterial,
    efi_glob: &str,
) -> SignResult<SignReport> {
    keys.validate()?;

    let bootloader_dir = target_dir.join(BOOTLOADER_DIR);
    let syslinux_dir = target_dir.join(SYSLINUX_DIR);

    // Patterns are checked before the workspace exists.
    compile(efi_glob)?;

    let workspace = SigningWorkspace::create()?;
    let signer = FileSigner::new(tools, keys, &workspace, ctx);
    let mut report = SignReport::default();

    for efi_file in enumerate(&bootloader_dir, efi_glob)? {
        report.record(signer.sign_file(&efi_file)?);
    }

    for efi_file in enumerate(&bootloader_dir, CRDYBOOT_GLOB)? {
        inject_section(
            tools,
            ctx,
            &efi_file,
            VBPUBK_SECTION,
            keys.kernel_subkey_vbpubk(),
        )?;
        report.record(signer.sign_file(&efi_file)?);
    }

    for kernel in enumerate(&syslinux_dir, SYSLINUX_KERNEL_GLOB)? {
        report.record(signer.sign_file(&kernel)?);
    }

    if let Ok(kernel) = target_dir.join(KERNEL_NAME).canonicalize() {
        if kernel.is_file() {
            report.record(signer.sign_file(&kernel)?);
        }
    }

    tracing::debug!(
        "signed {} file(s), skipped {}",
        report.signed.len(),
        report.skipped.len()
    );
    Ok(report)
}
