//! Splicing assembled flags into the bridge build template.
//!
//! The template carries four marker lines. Each one is replaced by a single
//! directive line; every other line is copied through untouched. The
//! template itself is never rewritten, so splicing always starts from a
//! pristine copy.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::SpliceError;
use super::flags::FlagSet;

pub const LDFLAGS_MARKER: &str = "@XAPIAN_LDFLAGS@";
pub const CXXFLAGS_MARKER: &str = "@XAPIAN_CXXFLAGS@";
pub const EXTRA_CXXFLAGS_MARKER: &str = "@EXTRA_CXXFLAGS@";
pub const EXTRA_CPPFLAGS_MARKER: &str = "@EXTRA_CPPFLAGS@";

/// Bridge sources copied next to the spliced build file.
pub const BRIDGE_SOURCES: [&str; 2] = ["xapian_bridge.cc", "xapian_bridge.h"];

/// Template file name inside the bridge source directory.
pub const TEMPLATE_NAME: &str = "Makefile.in";

/// Which flag each marker receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Link,
    Include,
    ExtraCxx,
    ExtraCpp,
}

const MARKERS: [(&str, Slot); 4] = [
    (LDFLAGS_MARKER, Slot::Link),
    (CXXFLAGS_MARKER, Slot::Include),
    (EXTRA_CXXFLAGS_MARKER, Slot::ExtraCxx),
    (EXTRA_CPPFLAGS_MARKER, Slot::ExtraCpp),
];

/// How a directive line is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectiveStyle {
    /// `XAPIAN_LDFLAGS = ...`
    #[default]
    Make,
    /// `#cgo LDFLAGS: ...`
    Cgo,
}

impl DirectiveStyle {
    fn directive(self, slot: Slot, flags: &str) -> String {
        let line = match self {
            DirectiveStyle::Make => {
                let name = match slot {
                    Slot::Link => "XAPIAN_LDFLAGS",
                    Slot::Include => "XAPIAN_CXXFLAGS",
                    Slot::ExtraCxx => "EXTRA_CXXFLAGS",
                    Slot::ExtraCpp => "EXTRA_CPPFLAGS",
                };
                format!("{} = {}", name, flags)
            }
            DirectiveStyle::Cgo => {
                let name = match slot {
                    Slot::Link => "LDFLAGS",
                    Slot::Include | Slot::ExtraCxx => "CXXFLAGS",
                    Slot::ExtraCpp => "CPPFLAGS",
                };
                format!("#cgo {}: {}", name, flags)
            }
        };
        line.trim_end().to_string()
    }
}

fn slot_flags(flags: &FlagSet, slot: Slot) -> &str {
    match slot {
        Slot::Link => &flags.link_flags,
        Slot::Include => &flags.include_flags,
        Slot::ExtraCxx => &flags.cxxflags,
        Slot::ExtraCpp => &flags.cppflags,
    }
}

/// Replace the marker lines of `template` with directives.
///
/// `path` only names the template in errors. A template missing a marker,
/// including one that was already spliced, is rejected.
pub fn splice(
    template: &str,
    path: &Path,
    flags: &FlagSet,
    style: DirectiveStyle,
) -> Result<String, SpliceError> {
    for (marker, _) in MARKERS {
        let lines: Vec<usize> = template
            .lines()
            .enumerate()
            .filter(|(_, line)| line.trim() == marker)
            .map(|(idx, _)| idx + 1)
            .collect();
        match lines.len() {
            0 => {
                return Err(SpliceError::MissingMarker {
                    marker: marker.to_string(),
                    path: path.to_path_buf(),
                })
            }
            1 => {}
            _ => {
                return Err(SpliceError::DuplicateMarker {
                    marker: marker.to_string(),
                    path: path.to_path_buf(),
                    lines,
                })
            }
        }
    }

    let mut out = String::with_capacity(template.len() + 256);
    for line in template.lines() {
        let slot = MARKERS
            .iter()
            .find(|(marker, _)| line.trim() == *marker)
            .map(|(_, slot)| *slot);
        match slot {
            Some(slot) => out.push_str(&style.directive(slot, slot_flags(flags, slot))),
            None => out.push_str(line),
        }
        out.push('\n');
    }
    Ok(out)
}

/// Spliced build file plus the copied sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplicedTree {
    pub build_file: PathBuf,
    pub sources: Vec<PathBuf>,
}

/// Splice `<source_dir>/Makefile.in` into `<out_dir>/Makefile` and copy the
/// bridge sources alongside it.
pub fn splice_into(
    source_dir: &Path,
    out_dir: &Path,
    flags: &FlagSet,
    style: DirectiveStyle,
) -> Result<SplicedTree, SpliceError> {
    let template_path = source_dir.join(TEMPLATE_NAME);
    let template = std::fs::read_to_string(&template_path).map_err(|source| SpliceError::Io {
        path: template_path.clone(),
        source,
    })?;
    let spliced = splice(&template, &template_path, flags, style)?;

    std::fs::create_dir_all(out_dir).map_err(|source| SpliceError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let build_file = out_dir.join("Makefile");
    write_atomic(&build_file, spliced.as_bytes())?;

    let mut sources = Vec::new();
    for name in BRIDGE_SOURCES {
        let from = source_dir.join(name);
        let to = out_dir.join(name);
        let content = std::fs::read(&from).map_err(|source| SpliceError::Io {
            path: from.clone(),
            source,
        })?;
        write_atomic(&to, &content)?;
        sources.push(to);
    }

    tracing::debug!(build_file = %build_file.display(), "spliced bridge template");
    Ok(SplicedTree {
        build_file,
        sources,
    })
}

/// Write through a temporary file in the same directory, then rename.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SpliceError> {
    let io_err = |source| SpliceError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(content).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
