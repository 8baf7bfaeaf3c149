//! One-shot deferred body drain handed to the cache engine.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::entry::CachedEntry;
use crate::error::FramingError;

type DrainFuture = Pin<Box<dyn Future<Output = Result<CachedEntry, FramingError>> + Send>>;

/// A deferred, exactly-once accessor that drains a live response into a
/// [`CachedEntry`].
///
/// The transport builds one of these around the raw response and passes
/// it to [`CacheEngine::decide_and_maybe_store`]. The engine invokes it
/// only when it actually wants the body, so responses rejected on status
/// or method alone are never drained by the cache layer.
///
/// A second invocation is rejected at runtime with
/// [`FramingError::AlreadyDrained`], keeping the single-drain invariant
/// explicit instead of relying on closure capture.
///
/// [`CacheEngine::decide_and_maybe_store`]: crate::CacheEngine::decide_and_maybe_store
pub struct BodySupplier {
    drain: Option<DrainFuture>,
}

impl BodySupplier {
    /// Wrap a drain future. The future is not polled until [`drain`] is
    /// called.
    ///
    /// [`drain`]: BodySupplier::drain
    pub fn new<F>(drain: F) -> Self
    where
        F: Future<Output = Result<CachedEntry, FramingError>> + Send + 'static,
    {
        BodySupplier {
            drain: Some(Box::pin(drain)),
        }
    }

    /// A supplier over an already materialized entry. Useful for engine
    /// tests that do not involve a live connection.
    pub fn ready(entry: CachedEntry) -> Self {
        Self::new(std::future::ready(Ok(entry)))
    }

    /// Whether the supplier has already been invoked.
    pub fn is_drained(&self) -> bool {
        self.drain.is_none()
    }

    /// Drain the response body and return the materialized snapshot.
    ///
    /// The first call reads the underlying stream to exhaustion; any
    /// subsequent call fails with [`FramingError::AlreadyDrained`]
    /// without touching the stream.
    pub async fn drain(&mut self) -> Result<CachedEntry, FramingError> {
        match self.drain.take() {
            Some(fut) => fut.await,
            None => Err(FramingError::AlreadyDrained),
        }
    }
}

impl fmt::Debug for BodySupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySupplier")
            .field("drained", &self.is_drained())
            .finish()
    }
}
