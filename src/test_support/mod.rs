//! Test utilities and mocks for unit tests.
//!
//! [`MockEngine`] stands in for the native library so the wrapper layer can
//! be tested without a compiled bridge, and the fixtures build fake
//! xapian-core trees for the flag assembler.
//!
//! # Example
//!
//! ```rust,ignore
//! use xapian_bridge::test_support::{CoreTreeFixture, MockEngine};
//!
//! #[test]
//! fn test_example() {
//!     let engine = std::sync::Arc::new(MockEngine::new());
//!     let bridge = Bridge::with_api(engine.clone());
//!
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let core = CoreTreeFixture::built().write_to(tmp.path()).unwrap();
//! }
//! ```

pub mod engine;

use std::sync::Arc;

pub use engine::MockEngine;
pub use fixtures::*;

use crate::api::Bridge;

/// A bridge over a fresh mock engine, plus the engine for inspection.
pub fn mock_bridge() -> (Bridge, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::new());
    (Bridge::with_api(engine.clone()), engine)
}

/// Assertion helpers for testing.
pub mod assertions {
    use std::path::Path;

    /// Assert that a result is Err and return the error.
    pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
        match result {
            Ok(v) => panic!("expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    }

    /// Assert that an error message contains a substring.
    pub fn assert_error_contains<T: std::fmt::Debug, E: std::fmt::Display>(
        result: Result<T, E>,
        substring: &str,
    ) {
        match result {
            Ok(v) => panic!("expected Err containing '{}', got Ok: {:?}", substring, v),
            Err(e) => {
                let msg = e.to_string();
                assert!(
                    msg.contains(substring),
                    "error '{}' does not contain '{}'",
                    msg,
                    substring
                );
            }
        }
    }

    /// Assert that a file contains specific content.
    pub fn assert_file_contains(path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        let actual = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("file not found: {}", path.display()));
        assert!(
            actual.contains(content),
            "file {} does not contain '{}'\nactual content:\n{}",
            path.display(),
            content,
            actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_core_tree_layout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let core = CoreTreeFixture::built().write_to(tmp.path()).unwrap();

        assert!(core.join("pkgconfig/xapian-core.pc").is_file());
        assert!(core.join("config.h").is_file());
        assert!(core.join("libxapian.la").is_file());
        assert!(core.join("include").is_dir());
    }

    #[test]
    fn test_mock_bridge_version() {
        let (bridge, _engine) = mock_bridge();
        assert_eq!(bridge.version(), "mock-1.4.0");
    }
}
