//! The cache engine capability consumed by the transport adapter.

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};

use crate::entry::CachedEntry;
use crate::error::EngineError;
use crate::supplier::BodySupplier;

/// Storage side of the cache boundary.
///
/// An engine owns key derivation, freshness checking and storage; the
/// transport adapter owns everything connection-shaped. Implementations
/// can be in-memory, disk-backed or remote without touching the
/// interception logic.
///
/// Both operations are hard-failure: an `Err` from either is propagated
/// to the caller unchanged, never silently downgraded to a cache miss.
#[async_trait]
pub trait CacheEngine: Send + Sync {
    /// Look up a fresh stored entry matching the outgoing request.
    ///
    /// Must be side-effect-free from the transport's point of view and
    /// must not perform network I/O. Returning `Some` short-circuits the
    /// request: the network transport is never invoked.
    ///
    /// `body` carries the request body bytes when they are available in
    /// buffered form (streaming request bodies are passed as `None`).
    async fn lookup(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
        headers: &HeaderMap,
    ) -> Result<Option<CachedEntry>, EngineError>;

    /// Decide whether and how to store a freshly fetched response.
    ///
    /// `supplier` drains the response body at most once; engines that
    /// reject on `method`/`status` alone should not invoke it, so
    /// uncacheable bodies stream straight through to the caller.
    ///
    /// Returns `Ok(None)` to serve the live response unmodified, or
    /// `Ok(Some(entry))` to substitute a stored entry - e.g. serving the
    /// previously cached body after a 304 Not Modified revalidation.
    async fn decide_and_maybe_store(
        &self,
        method: &Method,
        status: StatusCode,
        supplier: BodySupplier,
    ) -> Result<Option<CachedEntry>, EngineError>;
}

#[async_trait]
impl<E: CacheEngine + ?Sized> CacheEngine for std::sync::Arc<E> {
    async fn lookup(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
        headers: &HeaderMap,
    ) -> Result<Option<CachedEntry>, EngineError> {
        (**self).lookup(method, url, body, headers).await
    }

    async fn decide_and_maybe_store(
        &self,
        method: &Method,
        status: StatusCode,
        supplier: BodySupplier,
    ) -> Result<Option<CachedEntry>, EngineError> {
        (**self).decide_and_maybe_store(method, status, supplier).await
    }
}
