//! The native handle wrapper layer.
//!
//! Every native engine type is exposed as an owning Rust value. Each wrapper
//! holds exactly one [`Handle`]; native resources are released exactly once,
//! either through the wrapper's explicit `dispose`/`close` or when the
//! wrapper is dropped. Using a wrapper after explicit disposal returns
//! [`Error::Disposed`] instead of touching freed native memory.
//!
//! ```rust,ignore
//! use xapian_bridge::api::{Bridge, Document, OpenMode, TermGenerator, WritableDatabase};
//!
//! let bridge = Bridge::load("build/libxapian_bridge.so")?;
//! let mut db = WritableDatabase::open(&bridge, "index.db", OpenMode::CreateOrOpen)?;
//! let doc = Document::new(&bridge)?;
//! doc.set_data(b"payload\0with zero")?;
//!
//! let termgen = TermGenerator::new(&bridge)?;
//! termgen.set_document(&doc)?;
//! termgen.index_text("hello go xapian")?;
//! doc.add_boolean_term("Q42")?;
//! db.replace_document("Q42", &doc)?;
//! db.close()?;
//! ```

mod database;
mod document;
mod enquire;
pub mod error;
mod handle;
mod query;
mod queryparser;
mod stem;
mod termgen;

use std::path::Path;
use std::sync::Arc;

pub use database::{Database, WritableDatabase};
pub use document::Document;
pub use enquire::{Enquire, MSet};
pub use error::{translate, Error, ErrorCategory, NativeErrorKind, Result};
pub use handle::Handle;
pub use query::{ParsedQuery, Query};
pub use queryparser::{ParseFlags, QueryParser};
pub use stem::Stem;
pub use termgen::TermGenerator;

pub use crate::native::{DocId, MatchItem, OpenMode, QueryOp, StemStrategy};

use crate::native::{BridgeLibrary, HandleKind, NativeApi, NativeResult, RawHandle};
use crate::util::config::Config;

/// Entry point to the native engine.
///
/// Cloning a `Bridge` is cheap; all clones share the loaded library.
#[derive(Clone)]
pub struct Bridge {
    api: Arc<dyn NativeApi>,
}

impl Bridge {
    /// Load the compiled bridge library at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let library = BridgeLibrary::load(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), version = %library.version(), "loaded bridge library");
        Ok(Bridge {
            api: Arc::new(library),
        })
    }

    /// Load the library named by `XAPIAN_BRIDGE_LIB` or `[bridge] library`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let path = config.bridge_library().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "no bridge library configured; set {} or [bridge] library",
                crate::util::config::LIBRARY_ENV
            ))
        })?;
        Self::load(path)
    }

    /// Use an alternative implementation of the native operations.
    pub fn with_api(api: Arc<dyn NativeApi>) -> Self {
        Bridge { api }
    }

    /// Version string reported by the native library.
    pub fn version(&self) -> String {
        self.api.version()
    }

    pub(crate) fn api(&self) -> &dyn NativeApi {
        self.api.as_ref()
    }

    /// Run a native constructor and take ownership of the result.
    pub(crate) fn acquire(
        &self,
        kind: HandleKind,
        create: impl FnOnce(&dyn NativeApi) -> NativeResult<RawHandle>,
    ) -> Result<Handle> {
        acquire(&self.api, kind, create)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("version", &self.api.version())
            .finish()
    }
}

/// Wrap a freshly created native handle.
///
/// The native failure, if any, goes through the error translation shim.
pub(crate) fn acquire(
    api: &Arc<dyn NativeApi>,
    kind: HandleKind,
    create: impl FnOnce(&dyn NativeApi) -> NativeResult<RawHandle>,
) -> Result<Handle> {
    let raw = create(api.as_ref())?;
    Ok(Handle::new(api.clone(), kind, raw))
}
