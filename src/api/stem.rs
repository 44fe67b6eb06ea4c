use super::error::Result;
use super::handle::Handle;
use super::Bridge;
use crate::native::{HandleKind, RawHandle};

/// A stemming algorithm for one language.
///
/// `"none"` (or an empty name) gives a stemmer that leaves words unchanged.
#[derive(Debug)]
pub struct Stem {
    handle: Handle,
}

impl Stem {
    pub fn new(bridge: &Bridge, language: &str) -> Result<Self> {
        let handle = bridge.acquire(HandleKind::Stem, |api| api.stem_new(language))?;
        Ok(Stem { handle })
    }

    pub(crate) fn raw(&self) -> Result<RawHandle> {
        self.handle.raw()
    }

    /// Stem a single word.
    pub fn apply(&self, word: &str) -> Result<String> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().stem_apply(raw, word)?)
    }

    pub fn get_description(&self) -> Result<String> {
        let raw = self.handle.raw()?;
        Ok(self.handle.api().stem_description(raw)?)
    }

    pub fn dispose(&mut self) -> Result<()> {
        self.handle.release()
    }
}
