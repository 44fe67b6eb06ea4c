//! Libtool archive (`lib*.la`) parsing.
//!
//! The archive is a shell fragment of `name='value'` assignments; only the
//! handful of keys the flag assembler needs are kept.

use std::path::{Path, PathBuf};

use super::errors::ConfigError;
use super::pkgconfig::tokenize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibtoolArchive {
    pub path: PathBuf,
    /// Shared object name the dynamic loader looks for.
    pub dlname: Option<String>,
    pub library_names: Vec<String>,
    /// Link flags of the libraries this one depends on.
    pub dependency_libs: Vec<String>,
    pub libdir: Option<String>,
}

impl LibtoolArchive {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let mut archive = LibtoolArchive {
            path: path.to_path_buf(),
            ..Default::default()
        };

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(value.trim()).ok_or_else(|| ConfigError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                message: format!("unterminated quote in `{}`", key),
            })?;

            match key.trim() {
                "dlname" => archive.dlname = non_empty(value),
                "library_names" => archive.library_names = tokenize(value),
                "dependency_libs" => archive.dependency_libs = tokenize(value),
                "libdir" => archive.libdir = non_empty(value),
                _ => {}
            }
        }

        Ok(archive)
    }
}

fn unquote(value: &str) -> Option<&str> {
    match value.chars().next() {
        Some(quote @ ('\'' | '"')) => value[1..].strip_suffix(quote),
        _ => Some(value),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// The first `lib*.la` directly inside `core_dir`, if any.
pub fn find_archive(core_dir: &Path) -> Option<PathBuf> {
    crate::util::fs::glob_files(core_dir, &["lib*.la"])
        .ok()?
        .into_iter()
        .next()
}
