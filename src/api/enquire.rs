use super::database::Database;
use super::document::Document;
use super::error::{Error, Result};
use super::handle::Handle;
use super::query::Query;
use crate::native::{HandleKind, MatchItem};

/// Runs a query against a database.
#[derive(Debug)]
pub struct Enquire {
    handle: Handle,
    query_description: Option<String>,
}

impl Enquire {
    /// Create an enquire session over `db`.
    ///
    /// The native side holds its own reference to the database, so `db`
    /// may be closed independently.
    pub fn new(db: &Database) -> Result<Self> {
        let raw_db = db.raw()?;
        let handle = super::acquire(db.handle().api_arc(), HandleKind::Enquire, |api| {
            api.enquire_new(raw_db)
        })?;
        Ok(Enquire {
            handle,
            query_description: None,
        })
    }

    /// Set the query to run. The tree is lowered to native objects here.
    pub fn set_query(&mut self, query: &Query) -> Result<()> {
        let raw = self.handle.raw()?;
        let mut keep = Vec::new();
        let lowered = query.lower(self.handle.api_arc(), &mut keep)?;
        self.handle.api().enquire_set_query(raw, lowered)?;
        // The native enquire copies the query; the intermediates can go.
        drop(keep);

        let description = query.get_description();
        tracing::debug!(query = %description, "set enquire query");
        self.query_description = Some(description);
        Ok(())
    }

    /// Description of the current query, if one was set.
    pub fn get_query_description(&self) -> Option<&str> {
        self.query_description.as_deref()
    }

    /// Rank purely by relevance (the native default).
    pub fn set_sort_by_relevance(&self) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().enquire_set_sort_by_relevance(raw)?)
    }

    /// Fetch the result page `[offset, offset + pagesize)`.
    ///
    /// A page past the last match is empty, not an error.
    pub fn get_mset(&self, offset: u32, pagesize: u32) -> Result<MSet> {
        let raw = self.handle.raw()?;
        let handle = super::acquire(self.handle.api_arc(), HandleKind::MSet, |api| {
            api.enquire_get_mset(raw, offset, pagesize)
        })?;
        Ok(MSet { handle })
    }

    pub fn dispose(&mut self) -> Result<()> {
        self.handle.release()
    }
}

/// One page of ranked results.
#[derive(Debug)]
pub struct MSet {
    handle: Handle,
}

impl MSet {
    /// Number of entries on this page.
    pub fn size(&self) -> Result<u32> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().mset_size(raw)?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// Estimated total number of matches across all pages.
    pub fn get_matches_estimated(&self) -> Result<u32> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().mset_matches_estimated(raw)?)
    }

    pub fn get_termfreq(&self, term: &str) -> Result<u32> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().mset_termfreq(raw, term)?)
    }

    pub fn get_description(&self) -> Result<String> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().mset_description(raw)?)
    }

    /// Entries of this page, best first.
    pub fn items(&self) -> Result<Vec<MatchItem>> {
        let raw = self.handle.raw()?;
        let api = self.handle.api();
        (0..api.mset_size(raw)?)
            .map(|index| api.mset_item(raw, index).map_err(Error::from))
            .collect()
    }

    /// The stored document of entry `index` on this page.
    pub fn get_document(&self, index: u32) -> Result<Document> {
        let raw = self.handle.raw()?;
        let handle = super::acquire(self.handle.api_arc(), HandleKind::Document, |api| {
            api.mset_document(raw, index)
        })?;
        Ok(Document::from_handle(handle))
    }

    /// Reorder the entries by relevance.
    ///
    /// Needs native library 1.5 or later; older versions report
    /// [`NativeErrorKind::Unimplemented`](super::NativeErrorKind).
    pub fn sort_by_relevance(&self) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().mset_sort_by_relevance(raw)?)
    }

    pub fn dispose(&mut self) -> Result<()> {
        self.handle.release()
    }
}
