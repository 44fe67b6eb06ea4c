//! Preparing and building the native bridge.
//!
//! `setup` assembles the flags, splices them into the build template,
//! copies the bridge sources next to it and, unless told otherwise, runs
//! `make` there.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::fingerprint::{BridgeFingerprint, FINGERPRINT_FILE};
use crate::builder::flags::{assemble, FlagRequest, FlagSet};
use crate::builder::splice::{splice_into, DirectiveStyle};
use crate::util::process::{find_make, ProcessBuilder};

/// Options for the setup operation.
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub request: FlagRequest,
    /// Directory holding `Makefile.in` and the bridge sources
    pub source_dir: PathBuf,
    /// Where the spliced tree is written and built
    pub out_dir: PathBuf,
    pub style: DirectiveStyle,
    /// Stop after splicing
    pub no_build: bool,
    /// Build even when nothing changed
    pub force: bool,
}

/// Outcome of a setup run.
#[derive(Debug, Clone)]
pub struct SetupResult {
    pub flags: FlagSet,
    pub makefile: PathBuf,
    /// Expected location of the built bridge library
    pub library: PathBuf,
    /// Whether `make` ran
    pub rebuilt: bool,
}

/// File name of the bridge shared library on this platform.
pub fn library_file_name() -> String {
    format!(
        "{}xapian_bridge{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Whether a setup run invokes `make`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildDecision {
    /// `no_build` was requested
    Skip,
    /// Fingerprint matches and the library exists
    UpToDate,
    Build,
}

/// Decide whether the bridge must be rebuilt.
///
/// A stored fingerprint is only trusted together with the library.
pub fn decide_build(
    options: &SetupOptions,
    previous: Option<&BridgeFingerprint>,
    current: &BridgeFingerprint,
    library_exists: bool,
) -> BuildDecision {
    if options.no_build {
        BuildDecision::Skip
    } else if !options.force && library_exists && previous.is_some_and(|p| p.matches(current)) {
        BuildDecision::UpToDate
    } else {
        BuildDecision::Build
    }
}

/// Run setup.
pub fn setup(options: &SetupOptions) -> Result<SetupResult> {
    let flags = assemble(&options.request)?;

    let tree = splice_into(&options.source_dir, &options.out_dir, &flags, options.style)?;
    let library = options.out_dir.join(library_file_name());

    let fingerprint = BridgeFingerprint::compute(&flags, &tree.sources)?;
    let fingerprint_path = options.out_dir.join(FINGERPRINT_FILE);
    let previous = BridgeFingerprint::load(&fingerprint_path)?;

    let rebuilt = match decide_build(options, previous.as_ref(), &fingerprint, library.exists()) {
        BuildDecision::Skip => {
            tracing::info!("skipping native build");
            // the Makefile no longer matches whatever library is there
            if fingerprint_path.exists() {
                std::fs::remove_file(&fingerprint_path).with_context(|| {
                    format!("failed to remove {}", fingerprint_path.display())
                })?;
            }
            false
        }
        BuildDecision::UpToDate => {
            tracing::info!("bridge is up to date: {}", library.display());
            false
        }
        BuildDecision::Build => {
            run_make(&options.out_dir)?;
            fingerprint.save(&fingerprint_path)?;
            true
        }
    };

    Ok(SetupResult {
        flags,
        makefile: tree.build_file,
        library,
        rebuilt,
    })
}

fn run_make(dir: &Path) -> Result<()> {
    let make = find_make().context("make not found in PATH")?;
    tracing::info!("building bridge in {}", dir.display());

    let status = ProcessBuilder::new(&make).cwd(dir).status()?;
    if !status.success() {
        bail!(
            "`{}` failed in {} with exit code {:?}",
            make.display(),
            dir.display(),
            status.code()
        );
    }
    Ok(())
}
