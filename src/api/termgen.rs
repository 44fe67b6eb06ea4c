use super::document::Document;
use super::error::Result;
use super::handle::Handle;
use super::stem::Stem;
use super::Bridge;
use crate::native::HandleKind;

/// Turns free text into terms and postings on one document at a time.
///
/// The generator keeps a term position cursor that is reset by
/// [`set_document`](Self::set_document) and advanced by every indexed word
/// and by [`increase_termpos`](Self::increase_termpos).
#[derive(Debug)]
pub struct TermGenerator {
    handle: Handle,
}

impl TermGenerator {
    pub fn new(bridge: &Bridge) -> Result<Self> {
        let handle = bridge.acquire(HandleKind::TermGenerator, |api| api.termgen_new())?;
        Ok(TermGenerator { handle })
    }

    /// Stemmer used for the additional `Z`-prefixed terms.
    ///
    /// The native side copies the stemmer; `stem` may be dropped afterwards.
    pub fn set_stemmer(&self, stem: &Stem) -> Result<()> {
        let (raw, stem) = (self.handle.raw()?, stem.raw()?);
        Ok(self.handle.api().termgen_set_stemmer(raw, stem)?)
    }

    /// Bind the document that subsequent indexing writes into.
    ///
    /// The native document is reference counted, so the binding stays
    /// valid even if `doc` is disposed first.
    pub fn set_document(&self, doc: &Document) -> Result<()> {
        let (raw, doc) = (self.handle.raw()?, doc.raw()?);
        Ok(self.handle.api().termgen_set_document(raw, doc)?)
    }

    pub fn index_text(&self, text: &str) -> Result<()> {
        self.index_text_with(text, 1, "")
    }

    /// Index `text` with a wdf increment and a term prefix.
    pub fn index_text_with(&self, text: &str, wdf_inc: u32, prefix: &str) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self
            .handle
            .api()
            .termgen_index_text(raw, text, wdf_inc, prefix)?)
    }

    /// Leave a gap in term positions, e.g. between fields.
    pub fn increase_termpos(&self, delta: u32) -> Result<()> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().termgen_increase_termpos(raw, delta)?)
    }

    pub fn get_termpos(&self) -> Result<u32> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().termgen_get_termpos(raw)?)
    }

    pub fn dispose(&mut self) -> Result<()> {
        self.handle.release()
    }
}
