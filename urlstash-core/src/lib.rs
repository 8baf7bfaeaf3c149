#![warn(missing_docs)]
//! # urlstash-core
//!
//! Contract types for the urlstash HTTP cache interceptor.
//!
//! This crate defines the boundary between the transport adapter (which
//! intercepts outgoing requests) and a cache engine (which owns storage,
//! key derivation and freshness policy). The adapter never looks inside
//! the engine; the engine never touches a live connection.
//!
//! - [`CacheEngine`] - the two-operation engine capability (lookup and
//!   store decision)
//! - [`CachedEntry`] - a fully materialized response snapshot
//! - [`BodySupplier`] - a one-shot deferred body drain handed to the
//!   engine, so bodies are only read when the engine wants them
//! - [`EngineError`] / [`FramingError`] - the error taxonomy

pub mod engine;
pub mod entry;
pub mod error;
pub mod supplier;

pub use engine::CacheEngine;
pub use entry::CachedEntry;
pub use error::{EngineError, FramingError};
pub use supplier::BodySupplier;
