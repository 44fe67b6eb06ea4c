//! The foreign-function boundary.
//!
//! Everything the wrapper layer knows about the native engine goes through
//! the [`NativeApi`] trait. Each method maps to exactly one native operation
//! and reports native failures as a [`NativeFailure`] carrying the raw
//! `"<ExceptionKind>: <message>"` payload produced on the native side.
//!
//! The production implementation is [`BridgeLibrary`], which loads the
//! compiled C ABI bridge (`bridge/xapian_bridge.cc`) at runtime.

mod ffi;

use std::fmt;
use std::path::Path;

pub use ffi::{BridgeLibrary, LoadError};

/// Result of a single native call.
pub type NativeResult<T> = std::result::Result<T, NativeFailure>;

/// Native document identifier.
pub type DocId = u32;

/// An opaque reference to memory owned by the native library.
///
/// The value is only meaningful to the [`NativeApi`] implementation that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(usize);

impl RawHandle {
    /// Wrap a raw address or slot number.
    pub fn from_raw(value: usize) -> Self {
        RawHandle(value)
    }

    /// The underlying address or slot number.
    pub fn as_raw(self) -> usize {
        self.0
    }
}

/// The native type a handle refers to.
///
/// Release must use the same kind the handle was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum HandleKind {
    Document = 1,
    Database = 2,
    WritableDatabase = 3,
    TermGenerator = 4,
    Stem = 5,
    QueryParser = 6,
    Query = 7,
    Enquire = 8,
    MSet = 9,
}

impl HandleKind {
    /// Stable integer code shared with the C bridge.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Native class name, used in messages.
    pub fn name(self) -> &'static str {
        match self {
            HandleKind::Document => "Document",
            HandleKind::Database => "Database",
            HandleKind::WritableDatabase => "WritableDatabase",
            HandleKind::TermGenerator => "TermGenerator",
            HandleKind::Stem => "Stem",
            HandleKind::QueryParser => "QueryParser",
            HandleKind::Query => "Query",
            HandleKind::Enquire => "Enquire",
            HandleKind::MSet => "MSet",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native failure as it crossed the boundary.
///
/// The payload is kept verbatim so unrecognized failures can be propagated
/// without losing any diagnostic detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFailure {
    payload: String,
}

impl NativeFailure {
    pub fn new(payload: impl Into<String>) -> Self {
        NativeFailure {
            payload: payload.into(),
        }
    }

    /// Build a payload from an exception kind and message.
    pub fn with_kind(kind: &str, message: impl fmt::Display) -> Self {
        NativeFailure {
            payload: format!("{}: {}", kind, message),
        }
    }

    /// The full `"<Kind>: <message>"` payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The exception kind, i.e. everything before the first `": "`.
    ///
    /// Qualified names such as `std::exception` stay whole.
    pub fn kind(&self) -> &str {
        match self.payload.split_once(": ") {
            Some((kind, _)) => kind.trim(),
            None => self.payload.trim(),
        }
    }

    /// The message after the kind separator, or the whole payload if there
    /// is no separator.
    pub fn message(&self) -> &str {
        match self.payload.split_once(": ") {
            Some((_, message)) => message.trim_start(),
            None => &self.payload,
        }
    }
}

impl fmt::Display for NativeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

impl std::error::Error for NativeFailure {}

/// How a writable database is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum OpenMode {
    /// Create if absent, open if present.
    #[default]
    CreateOrOpen = 1,
    /// Create if absent, overwrite if present.
    CreateOrOverwrite = 2,
    /// Create, failing if a database already exists.
    Create = 3,
    /// Open, failing if no database exists.
    Open = 4,
}

impl OpenMode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Query operators understood by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum QueryOp {
    And = 0,
    Or = 1,
    AndNot = 2,
    Xor = 3,
    AndMaybe = 4,
    Filter = 5,
    Near = 6,
    Phrase = 7,
    ValueRange = 8,
    EliteSet = 10,
    ValueGe = 11,
    ValueLe = 12,
    Synonym = 13,
    Max = 14,
}

impl QueryOp {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Operator name as it appears in query descriptions.
    pub fn name(self) -> &'static str {
        match self {
            QueryOp::And => "AND",
            QueryOp::Or => "OR",
            QueryOp::AndNot => "AND_NOT",
            QueryOp::Xor => "XOR",
            QueryOp::AndMaybe => "AND_MAYBE",
            QueryOp::Filter => "FILTER",
            QueryOp::Near => "NEAR",
            QueryOp::Phrase => "PHRASE",
            QueryOp::ValueRange => "VALUE_RANGE",
            QueryOp::EliteSet => "ELITE_SET",
            QueryOp::ValueGe => "VALUE_GE",
            QueryOp::ValueLe => "VALUE_LE",
            QueryOp::Synonym => "SYNONYM",
            QueryOp::Max => "MAX",
        }
    }

    /// Whether this operator combines subqueries (as opposed to the value
    /// operators, which take a slot and bounds).
    pub fn is_combining(self) -> bool {
        !matches!(self, QueryOp::ValueRange | QueryOp::ValueGe | QueryOp::ValueLe)
    }

    /// Whether the operator takes a window or set-size parameter.
    pub fn takes_parameter(self) -> bool {
        matches!(self, QueryOp::Near | QueryOp::Phrase | QueryOp::EliteSet)
    }
}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stemming strategy used by the query parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum StemStrategy {
    None = 0,
    #[default]
    Some = 1,
    All = 2,
    AllZ = 3,
}

impl StemStrategy {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// One entry of a match set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchItem {
    pub docid: DocId,
    pub rank: u32,
    pub weight: f64,
    pub percent: i32,
}

/// The native operations the wrapper layer forwards to.
///
/// Implementations must be callable from any thread; callers guarantee
/// that a given handle is never used concurrently.
pub trait NativeApi: Send + Sync {
    /// Version string of the native library.
    fn version(&self) -> String;

    /// Release a handle. Called exactly once per handle.
    fn release(&self, kind: HandleKind, handle: RawHandle);

    // Document
    fn document_new(&self) -> NativeResult<RawHandle>;
    fn document_set_data(&self, doc: RawHandle, data: &[u8]) -> NativeResult<()>;
    fn document_get_data(&self, doc: RawHandle) -> NativeResult<Vec<u8>>;
    fn document_add_term(&self, doc: RawHandle, term: &str, wdf_inc: u32) -> NativeResult<()>;
    fn document_add_posting(
        &self,
        doc: RawHandle,
        term: &str,
        pos: u32,
        wdf_inc: u32,
    ) -> NativeResult<()>;
    fn document_add_boolean_term(&self, doc: RawHandle, term: &str) -> NativeResult<()>;
    fn document_add_value(&self, doc: RawHandle, slot: u32, value: &[u8]) -> NativeResult<()>;
    fn document_terms(&self, doc: RawHandle) -> NativeResult<Vec<String>>;

    // Database and WritableDatabase
    fn database_open(&self, path: &Path) -> NativeResult<RawHandle>;
    fn writable_database_open(&self, path: &Path, mode: OpenMode) -> NativeResult<RawHandle>;
    fn database_doccount(&self, db: RawHandle) -> NativeResult<u32>;
    fn database_termfreq(&self, db: RawHandle, term: &str) -> NativeResult<u32>;
    fn database_get_document(&self, db: RawHandle, docid: DocId) -> NativeResult<RawHandle>;
    fn database_close(&self, db: RawHandle) -> NativeResult<()>;
    fn database_add_document(&self, db: RawHandle, doc: RawHandle) -> NativeResult<DocId>;
    fn database_replace_document(
        &self,
        db: RawHandle,
        unique_term: &str,
        doc: RawHandle,
    ) -> NativeResult<DocId>;
    fn database_delete_document(&self, db: RawHandle, unique_term: &str) -> NativeResult<()>;
    fn database_commit(&self, db: RawHandle) -> NativeResult<()>;

    // Stem
    fn stem_new(&self, language: &str) -> NativeResult<RawHandle>;
    fn stem_apply(&self, stem: RawHandle, word: &str) -> NativeResult<String>;
    fn stem_description(&self, stem: RawHandle) -> NativeResult<String>;

    // TermGenerator
    fn termgen_new(&self) -> NativeResult<RawHandle>;
    fn termgen_set_stemmer(&self, termgen: RawHandle, stem: RawHandle) -> NativeResult<()>;
    fn termgen_set_document(&self, termgen: RawHandle, doc: RawHandle) -> NativeResult<()>;
    fn termgen_index_text(
        &self,
        termgen: RawHandle,
        text: &str,
        wdf_inc: u32,
        prefix: &str,
    ) -> NativeResult<()>;
    fn termgen_increase_termpos(&self, termgen: RawHandle, delta: u32) -> NativeResult<()>;
    fn termgen_get_termpos(&self, termgen: RawHandle) -> NativeResult<u32>;

    // Query
    fn query_term(&self, term: &str, wqf: u32, pos: u32) -> NativeResult<RawHandle>;
    fn query_combine(
        &self,
        op: QueryOp,
        subqueries: &[RawHandle],
        parameter: u32,
    ) -> NativeResult<RawHandle>;
    fn query_value_range(
        &self,
        op: QueryOp,
        slot: u32,
        lo: &[u8],
        hi: &[u8],
    ) -> NativeResult<RawHandle>;
    fn query_match_nothing(&self) -> NativeResult<RawHandle>;
    fn query_description(&self, query: RawHandle) -> NativeResult<String>;

    // QueryParser
    fn queryparser_new(&self) -> NativeResult<RawHandle>;
    fn queryparser_set_stemmer(&self, qp: RawHandle, stem: RawHandle) -> NativeResult<()>;
    fn queryparser_set_stemming_strategy(
        &self,
        qp: RawHandle,
        strategy: StemStrategy,
    ) -> NativeResult<()>;
    fn queryparser_set_default_op(&self, qp: RawHandle, op: QueryOp) -> NativeResult<()>;
    fn queryparser_set_database(&self, qp: RawHandle, db: RawHandle) -> NativeResult<()>;
    fn queryparser_add_prefix(&self, qp: RawHandle, field: &str, prefix: &str)
        -> NativeResult<()>;
    fn queryparser_add_boolean_prefix(
        &self,
        qp: RawHandle,
        field: &str,
        prefix: &str,
    ) -> NativeResult<()>;
    fn queryparser_parse_query(
        &self,
        qp: RawHandle,
        text: &str,
        flags: u32,
    ) -> NativeResult<RawHandle>;

    // Enquire
    fn enquire_new(&self, db: RawHandle) -> NativeResult<RawHandle>;
    fn enquire_set_query(&self, enquire: RawHandle, query: RawHandle) -> NativeResult<()>;
    fn enquire_set_sort_by_relevance(&self, enquire: RawHandle) -> NativeResult<()>;
    fn enquire_get_mset(
        &self,
        enquire: RawHandle,
        offset: u32,
        pagesize: u32,
    ) -> NativeResult<RawHandle>;

    // MSet
    fn mset_size(&self, mset: RawHandle) -> NativeResult<u32>;
    fn mset_matches_estimated(&self, mset: RawHandle) -> NativeResult<u32>;
    fn mset_item(&self, mset: RawHandle, index: u32) -> NativeResult<MatchItem>;
    fn mset_document(&self, mset: RawHandle, index: u32) -> NativeResult<RawHandle>;
    fn mset_termfreq(&self, mset: RawHandle, term: &str) -> NativeResult<u32>;
    fn mset_description(&self, mset: RawHandle) -> NativeResult<String>;
    fn mset_sort_by_relevance(&self, mset: RawHandle) -> NativeResult<()>;
}
