//! Error translation between the native engine and callers.
//!
//! Native failures arrive as a single `"<ExceptionKind>: <message>"`
//! payload. [`translate`] matches the kind against a closed table of known
//! exception classes. Recognized kinds become [`Error::Native`]; anything
//! else is passed through untouched as [`Error::Unrecognized`] so no
//! diagnostic detail is lost.

use std::fmt;

use thiserror::Error;

use crate::native::{HandleKind, LoadError, NativeFailure};

pub type Result<T> = std::result::Result<T, Error>;

/// Native exception classes the binding recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeErrorKind {
    DatabaseNotFound,
    DatabaseOpening,
    DatabaseCorrupt,
    DatabaseCreate,
    DatabaseLock,
    DatabaseModified,
    DatabaseVersion,
    DatabaseClosed,
    Database,
    DocNotFound,
    InvalidArgument,
    InvalidOperation,
    Unimplemented,
    FeatureUnavailable,
    QueryParser,
    Range,
    Serialisation,
    Network,
    NetworkTimeout,
    Internal,
    Assertion,
    Wildcard,
}

/// Exception class name to kind.
const KNOWN_KINDS: &[(&str, NativeErrorKind)] = &[
    ("DatabaseNotFoundError", NativeErrorKind::DatabaseNotFound),
    ("DatabaseOpeningError", NativeErrorKind::DatabaseOpening),
    ("DatabaseCorruptError", NativeErrorKind::DatabaseCorrupt),
    ("DatabaseCreateError", NativeErrorKind::DatabaseCreate),
    ("DatabaseLockError", NativeErrorKind::DatabaseLock),
    ("DatabaseModifiedError", NativeErrorKind::DatabaseModified),
    ("DatabaseVersionError", NativeErrorKind::DatabaseVersion),
    ("DatabaseClosedError", NativeErrorKind::DatabaseClosed),
    ("DatabaseError", NativeErrorKind::Database),
    ("DocNotFoundError", NativeErrorKind::DocNotFound),
    ("InvalidArgumentError", NativeErrorKind::InvalidArgument),
    ("InvalidOperationError", NativeErrorKind::InvalidOperation),
    ("UnimplementedError", NativeErrorKind::Unimplemented),
    ("FeatureUnavailableError", NativeErrorKind::FeatureUnavailable),
    ("QueryParserError", NativeErrorKind::QueryParser),
    ("RangeError", NativeErrorKind::Range),
    ("SerialisationError", NativeErrorKind::Serialisation),
    ("NetworkError", NativeErrorKind::Network),
    ("NetworkTimeoutError", NativeErrorKind::NetworkTimeout),
    ("InternalError", NativeErrorKind::Internal),
    ("AssertionError", NativeErrorKind::Assertion),
    ("WildcardError", NativeErrorKind::Wildcard),
];

impl NativeErrorKind {
    /// Look up a native exception class name.
    pub fn from_class_name(name: &str) -> Option<Self> {
        KNOWN_KINDS
            .iter()
            .find(|(class, _)| *class == name)
            .map(|(_, kind)| *kind)
    }

    /// The native exception class name.
    pub fn class_name(self) -> &'static str {
        KNOWN_KINDS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(class, _)| *class)
            .unwrap_or("Error")
    }

    /// Coarse classification for callers.
    pub fn category(self) -> ErrorCategory {
        match self {
            NativeErrorKind::DatabaseNotFound | NativeErrorKind::DocNotFound => {
                ErrorCategory::NotFound
            }
            NativeErrorKind::DatabaseOpening
            | NativeErrorKind::DatabaseCorrupt
            | NativeErrorKind::DatabaseCreate
            | NativeErrorKind::DatabaseLock
            | NativeErrorKind::DatabaseModified
            | NativeErrorKind::DatabaseVersion
            | NativeErrorKind::DatabaseClosed
            | NativeErrorKind::Database
            | NativeErrorKind::InvalidArgument
            | NativeErrorKind::InvalidOperation
            | NativeErrorKind::QueryParser
            | NativeErrorKind::Range
            | NativeErrorKind::Serialisation
            | NativeErrorKind::Wildcard => ErrorCategory::Invalid,
            NativeErrorKind::Unimplemented
            | NativeErrorKind::FeatureUnavailable
            | NativeErrorKind::Network
            | NativeErrorKind::NetworkTimeout
            | NativeErrorKind::Internal
            | NativeErrorKind::Assertion => ErrorCategory::Unclassified,
        }
    }
}

impl fmt::Display for NativeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// What kind of problem an [`Error`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The resource does not exist.
    NotFound,
    /// The resource exists but is invalid, locked, or the request was bad.
    Invalid,
    /// An internal or unclassified native failure.
    Unclassified,
    /// The caller broke the handle lifetime or argument contract.
    Misuse,
}

/// Errors returned by the wrapper layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A native failure of a recognized kind.
    #[error("{kind}: {message}")]
    Native {
        kind: NativeErrorKind,
        message: String,
    },

    /// A native failure whose kind is not in the translation table.
    #[error("{0}")]
    Unrecognized(NativeFailure),

    /// The handle was already released.
    #[error("{kind} used after it was disposed")]
    Disposed { kind: HandleKind },

    /// Malformed query construction.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A host-side argument that cannot be passed to the native side.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The bridge library could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Native { kind, .. } => kind.category(),
            Error::Unrecognized(_) | Error::Load(_) => ErrorCategory::Unclassified,
            Error::Disposed { .. } | Error::InvalidQuery(_) | Error::InvalidArgument(_) => {
                ErrorCategory::Misuse
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// The native kind, if this is a recognized native failure.
    pub fn native_kind(&self) -> Option<NativeErrorKind> {
        match self {
            Error::Native { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<NativeFailure> for Error {
    fn from(failure: NativeFailure) -> Self {
        translate(failure)
    }
}

/// Convert a native failure into a typed error.
///
/// Only an exact class-name match is recognized; the original failure is
/// returned unchanged otherwise.
pub fn translate(failure: NativeFailure) -> Error {
    match NativeErrorKind::from_class_name(failure.kind()) {
        Some(kind) => {
            tracing::debug!(kind = %kind, "translated native failure");
            Error::Native {
                kind,
                message: failure.message().to_string(),
            }
        }
        None => {
            tracing::debug!(payload = failure.payload(), "unrecognized native failure");
            Error::Unrecognized(failure)
        }
    }
}
