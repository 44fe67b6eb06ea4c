//! xapian-bridge - lifetime-safe bindings to the Xapian search engine
//!
//! This crate provides the typed wrappers over the native bridge's C ABI,
//! the translation of native failures into typed errors, and the tooling
//! that discovers xapian-core's build flags and splices them into the
//! bridge's build template.

pub mod api;
pub mod builder;
pub mod native;
pub mod ops;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory native engine and fake
/// xapian-core trees.
#[cfg(test)]
pub mod test_support;

pub use api::{
    Bridge, Database, Document, Enquire, Error, MSet, Query, QueryParser, Result, Stem,
    TermGenerator, WritableDatabase,
};
pub use util::context::GlobalContext;
