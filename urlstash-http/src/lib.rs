#![warn(missing_docs)]
//! # urlstash-http
//!
//! HTTP marshaling for the urlstash cache interceptor: the body wrapper
//! that lets live streams and rehydrated buffers share one shape, and
//! the codec that converts between responses and stored entries.

pub mod body;
pub mod codec;

pub use body::StashBody;
pub use codec::{drain, is_chunked, rehydrate};
