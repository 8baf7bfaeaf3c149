//! Lossless conversion between live responses and cache entries.
//!
//! `drain` is the only place a body is read for storage; `rehydrate`
//! reconstructs a response that is structurally interchangeable with a
//! freshly fetched one (status inspection, header lookup, streamed or
//! buffered body read all behave identically).

use http::header::TRANSFER_ENCODING;
use http::{HeaderMap, Response};
use http_body::Body as HttpBody;
use urlstash_core::{CachedEntry, FramingError};

use crate::body::StashBody;

/// Whether the response headers declare chunked transfer framing.
///
/// The flag is recorded on the stored entry; by the time this layer runs
/// the client stack has already de-chunked the stream, so the flag only
/// documents how the origin framed the body.
pub fn is_chunked(headers: &HeaderMap) -> bool {
    headers.get_all(TRANSFER_ENCODING).iter().any(|value| {
        value
            .to_str()
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false)
    })
}

/// Drain a live response into a storable [`CachedEntry`].
///
/// Chunked and content-length framed bodies are both read to exhaustion
/// and concatenated, without content decoding. A mid-stream failure
/// surfaces as [`FramingError::Read`] and no entry is produced, so a
/// partial body can never be stored.
pub async fn drain<B>(response: Response<StashBody<B>>) -> Result<CachedEntry, FramingError>
where
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let (parts, body) = response.into_parts();
    let chunked = is_chunked(&parts.headers);
    let bytes = body.collect().await.map_err(FramingError::read)?;
    Ok(CachedEntry::new(
        parts.status,
        parts.version,
        parts.headers,
        chunked,
        bytes,
    ))
}

/// Rebuild a live response from a stored entry.
///
/// The body is an in-memory stream over the stored bytes, not eagerly
/// decoded; status, version and the full header map (order and
/// multi-values included) are restored exactly as drained.
pub fn rehydrate<B>(entry: CachedEntry) -> Response<StashBody<B>>
where
    B: HttpBody,
{
    let (status, version, headers, body) = entry.into_parts();
    let mut response = Response::new(StashBody::from_bytes(body));
    *response.status_mut() = status;
    *response.version_mut() = version;
    *response.headers_mut() = headers;
    response
}
