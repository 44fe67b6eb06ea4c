//! Build configuration error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Fatal error while discovering the native library's build flags.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigError {
    #[error("package metadata directory not found: {}", dir.display())]
    #[diagnostic(code(xapian_bridge::config::missing_descriptor_dir))]
    MissingDescriptorDir { dir: PathBuf },

    #[error("package metadata descriptor not found: {}", path.display())]
    #[diagnostic(code(xapian_bridge::config::missing_descriptor))]
    MissingDescriptor { path: PathBuf },

    #[error("several package metadata descriptors in {}", dir.display())]
    #[diagnostic(
        code(xapian_bridge::config::ambiguous_descriptor),
        help("pass the descriptor explicitly with --pc-file")
    )]
    AmbiguousDescriptor {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("configuration header not found: {}", path.display())]
    #[diagnostic(code(xapian_bridge::config::missing_config_header))]
    MissingConfigHeader { path: PathBuf },

    #[error("`#define {name}` not found in {}", path.display())]
    #[diagnostic(code(xapian_bridge::config::missing_define))]
    MissingDefine { path: PathBuf, name: String },

    #[error("no `-l{package}` library flag in {}", path.display())]
    #[diagnostic(code(xapian_bridge::config::missing_library_flag))]
    MissingLibraryFlag { path: PathBuf, package: String },

    #[error("`{tool}` failed for {}: {message}", path.display())]
    #[diagnostic(code(xapian_bridge::config::metadata_tool))]
    MetadataTool {
        tool: String,
        path: PathBuf,
        message: String,
    },

    #[error("{}:{line}: {message}", path.display())]
    #[diagnostic(code(xapian_bridge::config::malformed))]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("xapian-core {found} is older than the required {required}")]
    #[diagnostic(code(xapian_bridge::config::unsupported_version))]
    UnsupportedVersion {
        path: PathBuf,
        found: String,
        required: String,
    },

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(xapian_bridge::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// The file or directory the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ConfigError::MissingDescriptorDir { dir } | ConfigError::AmbiguousDescriptor { dir, .. } => dir,
            ConfigError::MissingDescriptor { path }
            | ConfigError::MissingConfigHeader { path }
            | ConfigError::MissingDefine { path, .. }
            | ConfigError::MissingLibraryFlag { path, .. }
            | ConfigError::MetadataTool { path, .. }
            | ConfigError::Malformed { path, .. }
            | ConfigError::UnsupportedVersion { path, .. }
            | ConfigError::Io { path, .. } => path,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).with_location(self.path());

        match self {
            ConfigError::MissingDescriptorDir { .. } | ConfigError::MissingDescriptor { .. } => {
                diag.with_suggestion(suggestions::CONFIGURE_CORE)
                    .with_suggestion(suggestions::PC_FILE)
            }

            ConfigError::AmbiguousDescriptor { candidates, .. } => {
                let mut diag = diag;
                for candidate in candidates {
                    diag = diag.with_context(format!("candidate: {}", candidate.display()));
                }
                diag.with_suggestion(suggestions::PC_FILE)
            }

            ConfigError::MissingConfigHeader { .. } | ConfigError::MissingDefine { .. } => diag
                .with_context("the header is generated by xapian-core's configure script")
                .with_suggestion(suggestions::CONFIGURE_CORE),

            ConfigError::MissingLibraryFlag { package, .. } => diag
                .with_context(format!("`Libs:` must name the {} library", package))
                .with_suggestion(suggestions::PC_FILE),

            ConfigError::MetadataTool { .. } => diag
                .with_suggestion(suggestions::PKG_CONFIG)
                .with_suggestion("Use --stage build to read the build tree directly"),

            ConfigError::Malformed { .. } => {
                diag.with_suggestion("Regenerate the file by re-running configure")
            }

            ConfigError::UnsupportedVersion { required, .. } => {
                diag.with_suggestion(format!("Build against xapian-core {} or newer", required))
            }

            ConfigError::Io { source, .. } => diag.with_context(source.to_string()),
        }
    }
}

/// Error while splicing flags into the bridge template.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum SpliceError {
    /// Also what an already spliced file produces.
    #[error("marker `{marker}` not found in {}", path.display())]
    #[diagnostic(
        code(xapian_bridge::splice::missing_marker),
        help("splice from the pristine template, never from a spliced output")
    )]
    MissingMarker { marker: String, path: PathBuf },

    #[error("marker `{marker}` appears on several lines of {}: {lines:?}", path.display())]
    #[diagnostic(code(xapian_bridge::splice::duplicate_marker))]
    DuplicateMarker {
        marker: String,
        path: PathBuf,
        lines: Vec<usize>,
    },

    #[error("I/O error on {}", path.display())]
    #[diagnostic(code(xapian_bridge::splice::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpliceError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SpliceError::MissingMarker { path, .. } => Diagnostic::error(self.to_string())
                .with_location(path)
                .with_suggestion(suggestions::PRISTINE_TEMPLATE),
            SpliceError::DuplicateMarker { path, lines, .. } => Diagnostic::error(self.to_string())
                .with_location(path)
                .with_context(format!("lines {:?}", lines))
                .with_suggestion("Keep exactly one line per marker in the template"),
            SpliceError::Io { path, source } => Diagnostic::error(self.to_string())
                .with_location(path)
                .with_context(source.to_string()),
        }
    }
}
