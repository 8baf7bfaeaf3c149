//! The serializable response snapshot stored by cache engines.

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use serde::{Deserialize, Serialize};

/// A fully materialized snapshot of an HTTP response.
///
/// Produced by draining a live response exactly once; holds no streaming
/// state and no connection handle. The engine owns stored copies, the
/// transport only holds a transient one while rehydrating.
///
/// Header iteration order (including repeated names) is preserved through
/// serialization. Header names are normalized to lower case by the `http`
/// layer before an entry is ever built, so a stored entry round-trips
/// byte-for-byte within this stack.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CachedEntry {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    /// Canonical reason phrase for the status. Hyper does not surface the
    /// wire phrase, so the canonical one is stored for round-trip fidelity.
    reason: Option<String>,
    #[serde(with = "http_serde::version")]
    version: Version,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    /// Whether the origin framed the body with chunked transfer encoding
    /// rather than a content length.
    chunked: bool,
    body: Bytes,
}

impl CachedEntry {
    /// Create an entry from drained response metadata and body bytes.
    ///
    /// The reason phrase defaults to the canonical phrase for `status`.
    pub fn new(
        status: StatusCode,
        version: Version,
        headers: HeaderMap,
        chunked: bool,
        body: Bytes,
    ) -> Self {
        CachedEntry {
            reason: status.canonical_reason().map(str::to_owned),
            status,
            version,
            headers,
            chunked,
            body,
        }
    }

    /// Override the stored reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Stored reason phrase, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Protocol version of the original response.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Response headers in original iteration order.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether the original body used chunked framing.
    pub fn chunked(&self) -> bool {
        self.chunked
    }

    /// The materialized body bytes, content encoding untouched.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decompose the entry for rehydration into a live response.
    pub fn into_parts(self) -> (StatusCode, Version, HeaderMap, Bytes) {
        (self.status, self.version, self.headers, self.body)
    }
}
