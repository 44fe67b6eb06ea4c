//! Lookups in the configure-generated `config.h`.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::errors::ConfigError;

/// Define naming the libtool object directory.
pub const LT_OBJDIR: &str = "LT_OBJDIR";

/// `#define NAME "value"`
static STRING_DEFINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#\s*define\s+([A-Za-z_][A-Za-z0-9_]*)\s+"((?:[^"\\]|\\.)*)""#)
        .expect("valid define pattern")
});

/// Value of the string define `name` in `content`.
pub fn find_define<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let caps = STRING_DEFINE.captures(line)?;
        if caps.get(1)?.as_str() == name {
            caps.get(2).map(|m| m.as_str())
        } else {
            None
        }
    })
}

/// Read the string define `name` from the header at `path`.
pub fn read_define(path: &Path, name: &str) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::MissingConfigHeader {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    find_define(&content, name)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingDefine {
            path: path.to_path_buf(),
            name: name.to_string(),
        })
}

/// The libtool object directory, relative to the core tree.
pub fn libtool_objdir(path: &Path) -> Result<String, ConfigError> {
    let objdir = read_define(path, LT_OBJDIR)?;
    tracing::debug!(header = %path.display(), objdir = %objdir, "found libtool object directory");
    Ok(objdir)
}
