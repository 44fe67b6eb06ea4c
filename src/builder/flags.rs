//! Compile and link flag assembly for the native bridge.
//!
//! [`assemble`] turns a [`FlagRequest`] into a [`FlagSet`]. It reads the
//! native tree (and, for [`Stage::Install`], runs the metadata tool) but
//! keeps no other state, so the same request always yields the same flags.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;

use super::config_header;
use super::errors::ConfigError;
use super::libtool::{self, LibtoolArchive};
use super::pkgconfig::{self, tokenize, PkgConfigFile};
use crate::util::config::{default_strip, Config};
use crate::util::fs::forward_slashes;
use crate::util::process::{find_pkg_config, ProcessBuilder};

/// Package name used to pick a descriptor when several exist.
pub const DEFAULT_PACKAGE: &str = "xapian-core";

/// Prefix every native library flag starts with.
const LIBRARY_FLAG_PREFIX: &str = "-lxapian";

/// Whether the native tree is only built or also installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Read the build tree directly.
    #[default]
    Build,
    /// Ask the metadata tool about the installed descriptor.
    Install,
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Stage::Build),
            "install" => Ok(Stage::Install),
            other => Err(format!("unknown stage `{}` (expected build or install)", other)),
        }
    }
}

/// Where the native flags come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreMode {
    /// Flags computed by an outer build system, used unchanged.
    WithCore { cxxflags: String, libs: String },
    /// Flags discovered from a xapian-core tree.
    WithoutCore { core_dir: PathBuf, stage: Stage },
}

/// Everything [`assemble`] needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRequest {
    pub mode: CoreMode,
    /// Exact descriptor path; skips the directory scan.
    pub pc_file: Option<PathBuf>,
    /// Defaults to `<core_dir>/config.h`.
    pub config_header: Option<PathBuf>,
    pub package: String,
    pub extra_cxxflags: Vec<String>,
    pub extra_cppflags: Vec<String>,
    pub extra_ldflags: Vec<String>,
    /// Compile flag prefixes to drop.
    pub strip: Vec<String>,
    pub min_version: Option<Version>,
}

impl FlagRequest {
    pub fn new(mode: CoreMode) -> Self {
        FlagRequest {
            mode,
            pc_file: None,
            config_header: None,
            package: DEFAULT_PACKAGE.to_string(),
            extra_cxxflags: Vec::new(),
            extra_cppflags: Vec::new(),
            extra_ldflags: Vec::new(),
            strip: default_strip(),
            min_version: None,
        }
    }

    /// A request for `core_dir` with defaults taken from `config`.
    pub fn from_config(mode: CoreMode, config: &Config) -> Self {
        let mut request = FlagRequest::new(mode);
        request.pc_file = config.core.pc_file.clone();
        request.config_header = config.core.config_header.clone();
        if let Some(package) = &config.core.package {
            request.package = package.clone();
        }
        request.extra_cxxflags = config.flags.cxxflags.clone();
        request.extra_cppflags = config.flags.cppflags.clone();
        request.extra_ldflags = config.flags.extra_ldflags.clone();
        request.strip = config.flags.strip();
        request
    }

    pub fn with_pc_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pc_file = Some(path.into());
        self
    }

    pub fn with_config_header(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_header = Some(path.into());
        self
    }

    pub fn with_min_version(mut self, version: Version) -> Self {
        self.min_version = Some(version);
        self
    }
}

/// The assembled flags, each whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FlagSet {
    /// Include paths and defines for the native headers.
    pub include_flags: String,
    /// Search path, rpath, library and its private dependencies.
    pub link_flags: String,
    pub cxxflags: String,
    pub cppflags: String,
    /// Object directory of an uninstalled build.
    pub library_dir: Option<PathBuf>,
    pub dlname: Option<String>,
    pub version: Option<String>,
}

/// Assemble the bridge's compile and link flags.
pub fn assemble(request: &FlagRequest) -> Result<FlagSet, ConfigError> {
    let mut flags = match &request.mode {
        CoreMode::WithCore { cxxflags, libs } => FlagSet {
            include_flags: normalize(tokenize(cxxflags)),
            link_flags: normalize(tokenize(libs)),
            ..Default::default()
        },
        CoreMode::WithoutCore { core_dir, stage } => {
            let pc_path =
                pkgconfig::locate_descriptor(core_dir, request.pc_file.as_deref(), &request.package)?;
            tracing::debug!(descriptor = %pc_path.display(), "using package metadata descriptor");
            let descriptor = PkgConfigFile::load(&pc_path)?;
            check_version(&descriptor, request.min_version.as_ref())?;

            let mut flags = match stage {
                Stage::Build => from_build_tree(core_dir, &descriptor, request)?,
                Stage::Install => from_metadata_tool(&pc_path)?,
            };
            flags.include_flags =
                normalize(strip_flags(tokenize(&flags.include_flags), &request.strip));
            flags.version = descriptor.version().map(str::to_string);
            flags
        }
    };

    flags.link_flags = normalize(
        tokenize(&flags.link_flags)
            .into_iter()
            .chain(request.extra_ldflags.iter().cloned()),
    );
    flags.cxxflags = normalize(strip_flags(request.extra_cxxflags.clone(), &request.strip));
    flags.cppflags = normalize(request.extra_cppflags.iter().cloned());

    tracing::debug!(
        include = %flags.include_flags,
        link = %flags.link_flags,
        "assembled bridge flags"
    );
    Ok(flags)
}

/// Flags for a tree that was built but not installed.
fn from_build_tree(
    core_dir: &Path,
    descriptor: &PkgConfigFile,
    request: &FlagRequest,
) -> Result<FlagSet, ConfigError> {
    let libs = descriptor.libs();
    if !libs.iter().any(|flag| flag.starts_with(LIBRARY_FLAG_PREFIX)) {
        return Err(ConfigError::MissingLibraryFlag {
            path: descriptor.path().to_path_buf(),
            package: LIBRARY_FLAG_PREFIX.trim_start_matches("-l").to_string(),
        });
    }

    let header = request
        .config_header
        .clone()
        .unwrap_or_else(|| core_dir.join("config.h"));
    let objdir = config_header::libtool_objdir(&header)?;
    let library_dir = core_dir.join(objdir.trim_end_matches(['/', '\\']));
    let library_dir_str = forward_slashes(&library_dir);

    let archive = match libtool::find_archive(core_dir) {
        Some(path) => Some(LibtoolArchive::load(&path)?),
        None => None,
    };

    let mut link = vec![
        format!("-L{}", library_dir_str),
        format!("-Wl,-rpath,{}", library_dir_str),
    ];
    link.extend(libs);
    link.extend(descriptor.libs_private());
    if let Some(archive) = &archive {
        link.extend(archive.dependency_libs.iter().cloned());
    }

    let installed_includes = install_include_flags(descriptor);
    let mut include = vec![format!("-I{}", forward_slashes(&core_dir.join("include")))];
    include.extend(
        descriptor
            .cflags()
            .into_iter()
            .filter(|flag| !installed_includes.contains(flag)),
    );

    Ok(FlagSet {
        include_flags: include.join(" ").replace('\\', "/"),
        link_flags: dedup(link).join(" ").replace('\\', "/"),
        library_dir: Some(library_dir),
        dlname: archive.and_then(|a| a.dlname),
        ..Default::default()
    })
}

/// Flags reported by the metadata tool for an installed descriptor.
fn from_metadata_tool(pc_path: &Path) -> Result<FlagSet, ConfigError> {
    let tool = find_pkg_config().ok_or_else(|| ConfigError::MetadataTool {
        tool: "pkg-config".to_string(),
        path: pc_path.to_path_buf(),
        message: "not found in PATH".to_string(),
    })?;

    let query = |arg: &str| -> Result<String, ConfigError> {
        let output = ProcessBuilder::new(&tool)
            .arg(pc_path)
            .arg(arg)
            .exec_and_check()
            .map_err(|e| ConfigError::MetadataTool {
                tool: tool.display().to_string(),
                path: pc_path.to_path_buf(),
                message: format!("{:#}", e),
            })?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    };

    Ok(FlagSet {
        include_flags: query("--cflags")?,
        link_flags: query("--libs")?,
        ..Default::default()
    })
}

/// `-I` flags pointing at the install prefix, which a build tree lacks.
fn install_include_flags(descriptor: &PkgConfigFile) -> Vec<String> {
    descriptor
        .variable("includedir")
        .map(|dir| vec![format!("-I{}", dir)])
        .unwrap_or_default()
}

fn check_version(descriptor: &PkgConfigFile, min: Option<&Version>) -> Result<(), ConfigError> {
    let Some(min) = min else {
        return Ok(());
    };
    let found = descriptor.version().unwrap_or("0.0.0");
    let parsed = Version::parse(found).map_err(|e| ConfigError::Malformed {
        path: descriptor.path().to_path_buf(),
        line: 0,
        message: format!("invalid Version `{}`: {}", found, e),
    })?;
    if parsed < *min {
        return Err(ConfigError::UnsupportedVersion {
            path: descriptor.path().to_path_buf(),
            found: found.to_string(),
            required: min.to_string(),
        });
    }
    Ok(())
}

/// Drop every token that starts with one of `prefixes`.
pub fn strip_flags(flags: Vec<String>, prefixes: &[String]) -> Vec<String> {
    flags
        .into_iter()
        .filter(|flag| !prefixes.iter().any(|p| !p.is_empty() && flag.starts_with(p.as_str())))
        .collect()
}

/// Remove repeated tokens, keeping the first occurrence.
fn dedup(flags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    flags
        .into_iter()
        .filter(|flag| seen.insert(flag.clone()))
        .collect()
}

fn normalize(flags: impl IntoIterator<Item = String>) -> String {
    flags
        .into_iter()
        .filter(|f| !f.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
