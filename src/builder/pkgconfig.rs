//! Package metadata descriptors (`.pc` files).
//!
//! Only the subset of the format xapian-core's descriptors use is
//! supported: `name=value` variables with `${name}` references,
//! `Key: value` fields, `#` comments and backslash line continuations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::errors::ConfigError;

/// Directory under the native tree that holds the descriptors.
pub const DESCRIPTOR_DIR: &str = "pkgconfig";

/// A parsed package metadata descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgConfigFile {
    path: PathBuf,
    variables: BTreeMap<String, String>,
    fields: BTreeMap<String, String>,
}

impl PkgConfigFile {
    /// Read and parse the descriptor at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::MissingDescriptor {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(path, &content)
    }

    /// Parse descriptor text. `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let mut file = PkgConfigFile {
            path: path.to_path_buf(),
            variables: BTreeMap::new(),
            fields: BTreeMap::new(),
        };

        for (line_no, line) in logical_lines(content) {
            let line = strip_comment(&line);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let ident_end = line
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(line.len());
            let (ident, rest) = line.split_at(ident_end);
            let rest = rest.trim_start();

            if ident.is_empty() {
                return Err(file.malformed(line_no, format!("unexpected line `{}`", line)));
            }

            if let Some(value) = rest.strip_prefix(':') {
                let value = file.expand(line_no, value.trim())?;
                file.fields.insert(ident.to_string(), value);
            } else if let Some(value) = rest.strip_prefix('=') {
                let value = file.expand(line_no, value.trim())?;
                file.variables.insert(ident.to_string(), value);
            } else {
                tracing::debug!(path = %path.display(), line = line_no, "ignoring descriptor line");
            }
        }

        Ok(file)
    }

    fn malformed(&self, line: usize, message: impl Into<String>) -> ConfigError {
        ConfigError::Malformed {
            path: self.path.clone(),
            line,
            message: message.into(),
        }
    }

    /// Substitute `${name}` references with previously defined variables.
    fn expand(&self, line: usize, value: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            if let Some(escaped) = after.strip_prefix('$') {
                out.push('$');
                rest = escaped;
            } else if let Some(reference) = after.strip_prefix('{') {
                let end = reference
                    .find('}')
                    .ok_or_else(|| self.malformed(line, "unterminated `${` reference"))?;
                let name = &reference[..end];
                let value = self.variables.get(name).ok_or_else(|| {
                    self.malformed(line, format!("undefined variable `{}`", name))
                })?;
                out.push_str(value);
                rest = &reference[end + 1..];
            } else {
                out.push('$');
                rest = after;
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An expanded `Key:` field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// An expanded `name=` variable.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("Name")
    }

    pub fn version(&self) -> Option<&str> {
        self.field("Version")
    }

    pub fn libs(&self) -> Vec<String> {
        self.field_tokens("Libs")
    }

    pub fn libs_private(&self) -> Vec<String> {
        self.field_tokens("Libs.private")
    }

    pub fn cflags(&self) -> Vec<String> {
        self.field_tokens("Cflags")
    }

    fn field_tokens(&self, name: &str) -> Vec<String> {
        self.field(name).map(tokenize).unwrap_or_default()
    }
}

/// Split a flag string on whitespace.
pub fn tokenize(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Join backslash-continued lines, keeping the number of the first line.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let (start, mut text) = pending.take().unwrap_or((idx + 1, String::new()));
        match raw.strip_suffix('\\') {
            Some(head) => {
                text.push_str(head);
                text.push(' ');
                pending = Some((start, text));
            }
            None => {
                text.push_str(raw);
                lines.push((start, text));
            }
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Find the package metadata descriptor for a native tree.
///
/// An explicit path is used exactly as given. Otherwise
/// `<core_dir>/pkgconfig` is scanned in sorted order: a single `.pc` file
/// is used; with several, the one named `<package>.pc` wins and anything
/// else is ambiguous.
pub fn locate_descriptor(
    core_dir: &Path,
    explicit: Option<&Path>,
    package: &str,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::MissingDescriptor {
                path: path.to_path_buf(),
            });
        }
        return Ok(path.to_path_buf());
    }

    let dir = core_dir.join(DESCRIPTOR_DIR);
    if !dir.is_dir() {
        return Err(ConfigError::MissingDescriptorDir { dir });
    }

    let pattern = format!("{}/*.pc", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut candidates: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| ConfigError::Malformed {
            path: dir.clone(),
            line: 0,
            message: e.to_string(),
        })?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(ConfigError::MissingDescriptor {
            path: dir.join(format!("{}.pc", package)),
        }),
        1 => Ok(candidates.remove(0)),
        _ => {
            let wanted = candidates
                .iter()
                .position(|path| path.file_stem().is_some_and(|stem| stem == package));
            match wanted {
                Some(index) => Ok(candidates.remove(index)),
                None => Err(ConfigError::AmbiguousDescriptor { dir, candidates }),
            }
        }
    }
}
