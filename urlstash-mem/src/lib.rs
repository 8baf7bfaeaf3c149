#![warn(missing_docs)]
//! # urlstash-mem
//!
//! Reference in-memory [`CacheEngine`] for urlstash.
//!
//! Entries are keyed by a SHA-256 digest of method, URL and request body
//! and held in a concurrent map. GET, HEAD and POST responses with a
//! cacheable status are stored; permanent and temporary redirects never
//! go stale. An optional `max_age` turns stored entries stale, after
//! which a 304 Not Modified from the origin is answered with the stored
//! body instead of the empty revalidation response.
//!
//! There is no eviction and no persistence. The engine correlates a
//! store decision with the most recent lookup on the same instance, so
//! overlapping requests sharing one engine can mis-attribute a
//! revalidation; the transport layer itself is unaffected. Use one
//! engine per client for strict correlation.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use http::{HeaderMap, Method, StatusCode};
use sha2::{Digest, Sha256};
use tracing::debug;
use urlstash_core::{BodySupplier, CacheEngine, CachedEntry, EngineError};

/// Status codes worth storing: successes, redirects and the stable
/// client errors that will not change on retry.
const CACHEABLE_CODES: [u16; 11] = [200, 203, 204, 300, 301, 302, 303, 307, 308, 410, 414];

/// Redirect statuses whose entries never go stale.
const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

fn cacheable_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::POST
}

fn cacheable_status(status: StatusCode) -> bool {
    CACHEABLE_CODES.contains(&status.as_u16())
}

fn is_redirect(status: StatusCode) -> bool {
    REDIRECT_CODES.contains(&status.as_u16())
}

/// Cache key: digest over method, URL and request body.
fn cache_key(method: &Method, url: &str, body: Option<&[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(url.as_bytes());
    if let Some(body) = body {
        hasher.update(body);
    }
    hex::encode(hasher.finalize())
}

struct StoredRecord {
    entry: CachedEntry,
    stored_at: DateTime<Utc>,
}

/// Lookup outcome carried over to the matching store decision.
struct Pending {
    key: String,
    stale: Option<CachedEntry>,
}

/// In-memory cache engine.
///
/// `max_age` is the engine's whole freshness policy: `None` means stored
/// entries stay fresh until [`clear`] is called.
///
/// [`clear`]: InMemoryEngine::clear
pub struct InMemoryEngine {
    entries: DashMap<String, StoredRecord>,
    max_age: Option<Duration>,
    pending: Mutex<Option<Pending>>,
}

impl InMemoryEngine {
    /// Engine whose entries never expire.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            max_age: None,
            pending: Mutex::new(None),
        }
    }

    /// Engine whose entries go stale after `max_age`.
    ///
    /// Stale entries are not served by lookup; they wait for a 304 from
    /// the origin, which refreshes them and serves the stored body.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            ..Self::new()
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every stored entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn pending(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, record: &StoredRecord) -> bool {
        if is_redirect(record.entry.status()) {
            return true;
        }
        match self.max_age {
            None => true,
            Some(max_age) => match (Utc::now() - record.stored_at).to_std() {
                Ok(age) => age < max_age,
                // Stored in the future: the clock moved backwards, treat
                // as fresh rather than re-fetching forever.
                Err(_) => true,
            },
        }
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheEngine for InMemoryEngine {
    async fn lookup(
        &self,
        method: &Method,
        url: &str,
        body: Option<&[u8]>,
        _headers: &HeaderMap,
    ) -> Result<Option<CachedEntry>, EngineError> {
        if !cacheable_method(method) {
            *self.pending() = None;
            return Ok(None);
        }

        let key = cache_key(method, url, body);
        if let Some(record) = self.entries.get(&key) {
            if self.is_fresh(&record) {
                debug!(%url, "cache entry is fresh");
                *self.pending() = None;
                return Ok(Some(record.entry.clone()));
            }
            debug!(%url, "cache entry is stale, awaiting revalidation");
            let stale = record.entry.clone();
            drop(record);
            *self.pending() = Some(Pending {
                key,
                stale: Some(stale),
            });
            return Ok(None);
        }

        *self.pending() = Some(Pending { key, stale: None });
        Ok(None)
    }

    async fn decide_and_maybe_store(
        &self,
        method: &Method,
        status: StatusCode,
        mut supplier: BodySupplier,
    ) -> Result<Option<CachedEntry>, EngineError> {
        let Some(pending) = self.pending().take() else {
            return Ok(None);
        };

        if status == StatusCode::NOT_MODIFIED {
            if let Some(stale) = pending.stale {
                debug!("origin returned 304, refreshing and serving stored entry");
                self.entries.insert(
                    pending.key,
                    StoredRecord {
                        entry: stale.clone(),
                        stored_at: Utc::now(),
                    },
                );
                return Ok(Some(stale));
            }
            return Ok(None);
        }

        if cacheable_method(method) && cacheable_status(status) {
            let entry = supplier.drain().await?;
            debug!(%status, "storing response");
            self.entries.insert(
                pending.key,
                StoredRecord {
                    entry,
                    stored_at: Utc::now(),
                },
            );
        }
        Ok(None)
    }
}
