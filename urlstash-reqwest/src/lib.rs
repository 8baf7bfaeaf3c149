#![warn(missing_docs)]
//! # urlstash-reqwest
//!
//! Transport-layer cache interceptor for [`reqwest`], mounted as a
//! [`reqwest_middleware`] middleware.
//!
//! For each outgoing request the middleware asks a [`CacheEngine`] for a
//! fresh stored entry. On a hit the entry is rehydrated into an ordinary
//! [`reqwest::Response`] and the network is never contacted. On a miss
//! the request is forwarded; afterwards the engine decides, via a
//! deferred one-shot body drain, whether to store the response or to
//! substitute a previously stored entry (revalidation). Either way the
//! caller receives a response indistinguishable from an uncached fetch.

mod session;
mod transport;

pub use session::SessionBuilder;
pub use transport::{CACHE_STATUS_HEADER, CacheMiddleware, CacheStatus};

// Re-export the contract types for convenience
pub use urlstash_core::{BodySupplier, CacheEngine, CachedEntry, EngineError, FramingError};
pub use urlstash_http::{StashBody, codec};
