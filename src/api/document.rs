use super::error::Result;
use super::handle::Handle;
use super::Bridge;
use crate::native::{HandleKind, RawHandle};

/// A document: opaque data, positional terms, boolean terms and values.
///
/// Mutations accumulate in the native object until the document is added
/// to a database or dropped.
#[derive(Debug)]
pub struct Document {
    handle: Handle,
}

impl Document {
    pub fn new(bridge: &Bridge) -> Result<Self> {
        let handle = bridge.acquire(HandleKind::Document, |api| api.document_new())?;
        Ok(Document { handle })
    }

    pub(crate) fn from_handle(handle: Handle) -> Self {
        Document { handle }
    }

    pub(crate) fn raw(&self) -> Result<RawHandle> {
        self.handle.raw()
    }

    /// Set the data payload. Arbitrary bytes, including zero bytes.
    pub fn set_data(&self, data: impl AsRef<[u8]>) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().document_set_data(raw, data.as_ref())?)
    }

    pub fn get_data(&self) -> Result<Vec<u8>> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().document_get_data(raw)?)
    }

    /// Add a term with a within-document frequency increment of 1.
    pub fn add_term(&self, term: &str) -> Result<()> {
        self.add_term_wdf(term, 1)
    }

    pub fn add_term_wdf(&self, term: &str, wdf_inc: u32) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().document_add_term(raw, term, wdf_inc)?)
    }

    /// Add a term at position `pos`.
    pub fn add_posting(&self, term: &str, pos: u32, wdf_inc: u32) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().document_add_posting(raw, term, pos, wdf_inc)?)
    }

    /// Add a non-positional term, typically a unique `Q<id>` key.
    pub fn add_boolean_term(&self, term: &str) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().document_add_boolean_term(raw, term)?)
    }

    /// Store a value in `slot`, for sorting and value-range queries.
    pub fn add_value(&self, slot: u32, value: impl AsRef<[u8]>) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().document_add_value(raw, slot, value.as_ref())?)
    }

    /// All terms indexed in this document, in sorted order.
    pub fn terms(&self) -> Result<Vec<String>> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().document_terms(raw)?)
    }

    pub fn termlist_count(&self) -> Result<usize> {
        Ok(self.terms()?.len())
    }

    /// Release the native document now.
    pub fn dispose(&mut self) -> Result<()> {
        self.handle.release()
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_released()
    }
}
