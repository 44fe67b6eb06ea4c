//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.xapian-bridge/config.toml` - User-wide defaults
//! - Project: `.xapian-bridge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. The bridge library
//! path can also be set with the `XAPIAN_BRIDGE_LIB` environment variable,
//! which beats both files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the compiled bridge library.
pub const LIBRARY_ENV: &str = "XAPIAN_BRIDGE_LIB";

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".xapian-bridge";

/// xapian-bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Runtime bridge settings
    pub bridge: BridgeConfig,

    /// Native source tree defaults
    pub core: CoreConfig,

    /// Flag assembly settings
    pub flags: FlagsConfig,
}

/// Where the compiled bridge lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Path to the compiled bridge shared library
    pub library: Option<PathBuf>,
}

/// Defaults for native library discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// xapian-core source or build tree
    pub source_dir: Option<PathBuf>,

    /// Exact path of the package metadata descriptor
    pub pc_file: Option<PathBuf>,

    /// Generated configuration header (defaults to `<source_dir>/config.h`)
    pub config_header: Option<PathBuf>,

    /// Package name used to pick between several descriptors
    pub package: Option<String>,
}

/// Flag assembly settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// Flag prefixes removed from compile flags; unset means [`default_strip`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip: Option<Vec<String>>,

    /// Extra linker flags appended to the link flags
    pub extra_ldflags: Vec<String>,

    /// Extra C++ compiler flags
    pub cxxflags: Vec<String>,

    /// Extra preprocessor flags
    pub cppflags: Vec<String>,
}

impl FlagsConfig {
    /// The configured strip list, or the default one.
    pub fn strip(&self) -> Vec<String> {
        self.strip.clone().unwrap_or_else(default_strip)
    }
}

/// Flags the bridge toolchain rejects.
pub fn default_strip() -> Vec<String> {
    vec!["-fstack-protector".to_string()]
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).with_context(|| "failed to serialize config")?;
        super::fs::write_string(path, &contents)
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.bridge.library.is_some() {
            self.bridge.library = other.bridge.library;
        }

        if other.core.source_dir.is_some() {
            self.core.source_dir = other.core.source_dir;
        }
        if other.core.pc_file.is_some() {
            self.core.pc_file = other.core.pc_file;
        }
        if other.core.config_header.is_some() {
            self.core.config_header = other.core.config_header;
        }
        if other.core.package.is_some() {
            self.core.package = other.core.package;
        }

        if other.flags.strip.is_some() {
            self.flags.strip = other.flags.strip;
        }
        if !other.flags.extra_ldflags.is_empty() {
            self.flags.extra_ldflags = other.flags.extra_ldflags;
        }
        if !other.flags.cxxflags.is_empty() {
            self.flags.cxxflags = other.flags.cxxflags;
        }
        if !other.flags.cppflags.is_empty() {
            self.flags.cppflags = other.flags.cppflags;
        }
    }

    /// The bridge library to load: `XAPIAN_BRIDGE_LIB`, then `[bridge] library`.
    pub fn bridge_library(&self) -> Option<PathBuf> {
        std::env::var_os(LIBRARY_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.bridge.library.clone())
    }
}

/// Get the global config directory (~/.xapian-bridge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.xapian-bridge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.xapian-bridge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("config.toml")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.xapian-bridge/config.toml)
/// 2. Global config (~/.xapian-bridge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}
