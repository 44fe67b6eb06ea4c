//! Single-owner native handles.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::error::{Error, Result};
use crate::native::{HandleKind, NativeApi, RawHandle};

/// Owns exactly one native handle.
///
/// The handle is released exactly once, either through [`Handle::release`]
/// or when the owner is dropped. After release the handle is poisoned and
/// every access returns [`Error::Disposed`].
///
/// `Handle` is `Send` but not `Sync`: a native object may move between
/// threads but is never used from two threads at once.
pub struct Handle {
    api: Arc<dyn NativeApi>,
    kind: HandleKind,
    raw: Option<RawHandle>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Handle {
    pub(crate) fn new(api: Arc<dyn NativeApi>, kind: HandleKind, raw: RawHandle) -> Self {
        tracing::trace!(kind = %kind, raw = raw.as_raw(), "acquired native handle");
        Handle {
            api,
            kind,
            raw: Some(raw),
            _not_sync: PhantomData,
        }
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub(crate) fn api(&self) -> &dyn NativeApi {
        self.api.as_ref()
    }

    pub(crate) fn api_arc(&self) -> &Arc<dyn NativeApi> {
        &self.api
    }

    /// The live raw handle.
    pub(crate) fn raw(&self) -> Result<RawHandle> {
        self.raw.ok_or(Error::Disposed { kind: self.kind })
    }

    /// Whether the handle has been released.
    pub fn is_released(&self) -> bool {
        self.raw.is_none()
    }

    /// Release the native handle now.
    ///
    /// Releasing twice is an error, never a second native release.
    pub(crate) fn release(&mut self) -> Result<()> {
        let raw = self.raw.take().ok_or(Error::Disposed { kind: self.kind })?;
        tracing::trace!(kind = %self.kind, raw = raw.as_raw(), "released native handle");
        self.api.release(self.kind, raw);
        Ok(())
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            tracing::trace!(kind = %self.kind, raw = raw.as_raw(), "released native handle on drop");
            self.api.release(self.kind, raw);
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("raw", &self.raw.map(RawHandle::as_raw))
            .finish()
    }
}
