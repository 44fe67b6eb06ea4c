use std::path::Path;

use super::document::Document;
use super::error::{Error, Result};
use super::handle::Handle;
use super::Bridge;
use crate::native::{DocId, HandleKind, OpenMode, RawHandle};

/// A read-only database.
///
/// Opening is the main translation boundary: a missing database is reported
/// as [`NativeErrorKind::DatabaseNotFound`](super::NativeErrorKind), never as
/// an empty handle.
#[derive(Debug)]
pub struct Database {
    handle: Handle,
}

impl Database {
    pub fn open(bridge: &Bridge, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening database");
        let handle = bridge.acquire(HandleKind::Database, |api| api.database_open(path))?;
        Ok(Database { handle })
    }

    pub(crate) fn raw(&self) -> Result<RawHandle> {
        self.handle.raw()
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn get_doccount(&self) -> Result<u32> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().database_doccount(raw)?)
    }

    /// Number of documents indexed by `term`.
    pub fn get_termfreq(&self, term: &str) -> Result<u32> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().database_termfreq(raw, term)?)
    }

    /// Fetch a stored document by id.
    pub fn get_document(&self, docid: DocId) -> Result<Document> {
        let raw = self.handle.raw()?;
        let handle = super::acquire(self.handle.api_arc(), HandleKind::Document, |api| {
            api.database_get_document(raw, docid)
        })?;
        Ok(Document::from_handle(handle))
    }

    /// Close the database and release its handle.
    pub fn close(&mut self) -> Result<()> {
        let raw = self.handle.raw()?;
        let closed = self.handle.api().database_close(raw);
        // The handle is released even when close fails.
        self.handle.release()?;
        Ok(closed?)
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_released()
    }
}

/// A database open for writing.
///
/// Mutations are applied in call order. The native library holds a write
/// lock for as long as the handle lives; a second writer fails with
/// [`NativeErrorKind::DatabaseLock`](super::NativeErrorKind).
#[derive(Debug)]
pub struct WritableDatabase {
    inner: Database,
}

impl WritableDatabase {
    pub fn open(bridge: &Bridge, path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), mode = ?mode, "opening writable database");
        let handle = bridge.acquire(HandleKind::WritableDatabase, |api| {
            api.writable_database_open(path, mode)
        })?;
        Ok(WritableDatabase {
            inner: Database { handle },
        })
    }

    /// Read access through the same handle.
    pub fn as_database(&self) -> &Database {
        &self.inner
    }

    pub fn get_doccount(&self) -> Result<u32> {
        self.inner.get_doccount()
    }

    /// Add `doc` under a fresh document id.
    pub fn add_document(&self, doc: &Document) -> Result<DocId> {
        let (db, doc) = (self.inner.raw()?, doc.raw()?);
        Ok(self.inner.handle.api().database_add_document(db, doc)?)
    }

    /// Upsert `doc` keyed by the boolean term `unique_term`.
    ///
    /// Any document indexed by `unique_term` is replaced atomically; if none
    /// exists the document is added.
    pub fn replace_document(&self, unique_term: &str, doc: &Document) -> Result<DocId> {
        if unique_term.is_empty() {
            return Err(Error::InvalidArgument(
                "replace_document needs a non-empty unique term".to_string(),
            ));
        }
        let (db, doc) = (self.inner.raw()?, doc.raw()?);
        let docid = self
            .inner
            .handle
            .api()
            .database_replace_document(db, unique_term, doc)?;
        tracing::trace!(unique_term, docid, "replaced document");
        Ok(docid)
    }

    /// Delete every document indexed by `unique_term`.
    pub fn delete_document(&self, unique_term: &str) -> Result<()> {
        let db = self.inner.raw()?;
        Ok(self
            .inner
            .handle
            .api()
            .database_delete_document(db, unique_term)?)
    }

    pub fn commit(&self) -> Result<()> {
        let db = self.inner.raw()?;
        Ok(self.inner.handle.api().database_commit(db)?)
    }

    /// Commit pending changes, close, and release the handle.
    pub fn close(&mut self) -> Result<()> {
        if let Err(err) = self.commit() {
            if !matches!(err, Error::Disposed { .. }) {
                tracing::warn!("commit before close failed: {}", err);
                self.inner.handle.release()?;
            }
            return Err(err);
        }
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
