//! Cache interception middleware for reqwest-middleware.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use http::Extensions;
use http::header::HeaderValue;
use http::{Method, response::Parts};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::debug;
use urlstash_core::{BodySupplier, CacheEngine, CachedEntry, EngineError, FramingError};
use urlstash_http::{StashBody, codec};

/// Response header reporting how the interceptor resolved the request.
pub const CACHE_STATUS_HEADER: &str = "x-cache-status";

/// Outcome of one intercepted request, reported via
/// [`CACHE_STATUS_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the engine's store; the network was never contacted.
    Hit,
    /// Fetched from the origin (and possibly stored on the way through).
    Miss,
    /// Fetched from the origin, but the engine substituted a stored
    /// entry for the fetched response.
    Revalidated,
}

impl CacheStatus {
    fn header_value(self) -> HeaderValue {
        match self {
            CacheStatus::Hit => HeaderValue::from_static("HIT"),
            CacheStatus::Miss => HeaderValue::from_static("MISS"),
            CacheStatus::Revalidated => HeaderValue::from_static("REVALIDATED"),
        }
    }
}

/// Cache middleware for reqwest-middleware.
///
/// Intercepts every outgoing request: on an engine hit the stored entry
/// is rehydrated and returned without touching the network; on a miss
/// the request is forwarded and the response is offered to the engine
/// for storage before being handed back to the caller. The engine may
/// also substitute a stored entry for the fetched response, which is how
/// a 304 revalidation turns back into the full cached body.
///
/// Transport failures propagate unchanged (`Error::Reqwest`); engine and
/// body drain failures surface as `Error::Middleware` wrapping an
/// [`EngineError`], so callers can still tell the two apart.
pub struct CacheMiddleware<E> {
    engine: Arc<E>,
}

impl<E> CacheMiddleware<E> {
    /// Create a new cache middleware around a shared engine.
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }
}

impl<E> Clone for CacheMiddleware<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

#[async_trait]
impl<E> Middleware for CacheMiddleware<E>
where
    E: CacheEngine + 'static,
{
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();

        let lookup = self
            .engine
            .lookup(
                req.method(),
                req.url().as_str(),
                req.body().and_then(|body| body.as_bytes()),
                req.headers(),
            )
            .await
            .map_err(engine_failure)?;

        if let Some(entry) = lookup {
            debug!(url = %req.url(), status = %entry.status(), "serving response from cache");
            return Ok(serve_entry(entry, CacheStatus::Hit));
        }

        debug!(url = %req.url(), "cache miss, forwarding request upstream");
        let response = next.run(req, extensions).await?;
        self.assemble(&method, response).await
    }
}

impl<E> CacheMiddleware<E>
where
    E: CacheEngine,
{
    /// Offer a fetched response to the engine and materialize whatever
    /// the engine decides the caller should see.
    async fn assemble(&self, method: &Method, response: Response) -> Result<Response> {
        let http_response: http::Response<reqwest::Body> = response.into();
        let (parts, body) = http_response.into_parts();
        let status = parts.status;

        // The raw body parks in a per-call slot so the drained bytes can
        // be reinstalled if the engine reads them but declines to
        // substitute. The stream itself is only ever read once.
        let slot = Arc::new(Mutex::new(BodySlot::Pending(StashBody::Passthrough(body))));
        let supplier = drain_supplier(&parts, slot.clone());

        let decision = self
            .engine
            .decide_and_maybe_store(method, status, supplier)
            .await
            .map_err(engine_failure)?;

        match decision {
            Some(entry) => {
                debug!(
                    fetched = %status,
                    substituted = %entry.status(),
                    "engine substituted a stored entry for the fetched response"
                );
                // An undrained raw body is dropped here, which closes its
                // connection.
                drop(slot);
                Ok(serve_entry(entry, CacheStatus::Revalidated))
            }
            None => {
                let body = match std::mem::replace(&mut *lock(&slot), BodySlot::Failed) {
                    BodySlot::Drained(bytes) => StashBody::Complete(Some(bytes)),
                    BodySlot::Pending(body) => body,
                    BodySlot::Failed => {
                        return Err(reqwest_middleware::Error::Middleware(anyhow::anyhow!(
                            "response body drain failed and the cache engine discarded the error"
                        )));
                    }
                };
                let mut response = http::Response::from_parts(parts, into_reqwest_body(body));
                response
                    .headers_mut()
                    .insert(CACHE_STATUS_HEADER, CacheStatus::Miss.header_value());
                Ok(response.into())
            }
        }
    }
}

/// Per-call state of the raw response body between the forward and the
/// engine's store decision.
enum BodySlot {
    /// Body not yet touched by the cache layer.
    Pending(StashBody<reqwest::Body>),
    /// Body fully drained; these bytes back both the stored entry and
    /// the caller-facing response.
    Drained(Bytes),
    /// Drain was attempted and failed, or the body was already taken.
    Failed,
}

fn lock(slot: &Mutex<BodySlot>) -> MutexGuard<'_, BodySlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build the one-shot drain accessor handed to the engine.
///
/// On a successful drain the bytes are cloned into the slot before the
/// snapshot is returned, so the caller-facing response reuses exactly
/// the bytes the engine stored.
fn drain_supplier(parts: &Parts, slot: Arc<Mutex<BodySlot>>) -> BodySupplier {
    let status = parts.status;
    let version = parts.version;
    let headers = parts.headers.clone();
    let chunked = codec::is_chunked(&headers);

    BodySupplier::new(async move {
        let pending = {
            let mut guard = lock(&slot);
            match std::mem::replace(&mut *guard, BodySlot::Failed) {
                BodySlot::Pending(body) => body,
                other => {
                    *guard = other;
                    return Err(FramingError::AlreadyDrained);
                }
            }
        };

        match pending.collect().await {
            Ok(bytes) => {
                *lock(&slot) = BodySlot::Drained(bytes.clone());
                Ok(CachedEntry::new(status, version, headers, chunked, bytes))
            }
            Err(err) => Err(FramingError::read(err)),
        }
    })
}

/// Rehydrate a stored entry into the caller-facing response shape.
fn serve_entry(entry: CachedEntry, status: CacheStatus) -> Response {
    let rehydrated = codec::rehydrate::<reqwest::Body>(entry);
    let (parts, body) = rehydrated.into_parts();
    let mut response = http::Response::from_parts(parts, into_reqwest_body(body));
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, status.header_value());
    response.into()
}

/// Unwrap a [`StashBody`] into a reqwest body.
///
/// Passthrough unwraps the untouched inner body; Complete wraps the
/// materialized bytes, so rehydrated and drained responses cost no extra
/// copy.
fn into_reqwest_body(body: StashBody<reqwest::Body>) -> reqwest::Body {
    match body {
        StashBody::Passthrough(body) => body,
        StashBody::Complete(Some(bytes)) => reqwest::Body::from(bytes),
        StashBody::Complete(None) => reqwest::Body::from(Bytes::new()),
    }
}

fn engine_failure(err: EngineError) -> reqwest_middleware::Error {
    reqwest_middleware::Error::Middleware(anyhow::Error::new(err))
}
