//! Error taxonomy for the cache boundary.
//!
//! The interceptor performs no local recovery: transport failures keep
//! their original classification, engine failures are surfaced as
//! [`EngineError`] rather than being masked by a cache bypass, and body
//! read failures are [`FramingError`]s after which nothing is stored.

use thiserror::Error;

/// Error from reading a response body while draining it for the cache.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The underlying stream failed mid-read (connection reset, malformed
    /// chunked encoding, premature termination).
    #[error("failed to read response body: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The one-shot body supplier was invoked a second time.
    #[error("response body was already drained")]
    AlreadyDrained,
}

impl FramingError {
    /// Wrap a body read failure.
    pub fn read<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FramingError::Read(Box::new(err))
    }
}

/// Error from a cache engine's lookup or store-decision operation.
///
/// These are hard errors: the interceptor does not fall back to a
/// degraded "bypass cache" mode, since masking them could hide storage
/// corruption.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine-internal failure (storage, serialization, state).
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),

    /// The engine drained the response body and the read failed.
    #[error(transparent)]
    Framing(#[from] FramingError),
}

impl EngineError {
    /// Wrap an engine-internal failure.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EngineError::Internal(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_error_display() {
        let err = FramingError::AlreadyDrained;
        assert_eq!(err.to_string(), "response body was already drained");
    }

    #[test]
    fn engine_error_preserves_framing_source() {
        let err = EngineError::from(FramingError::AlreadyDrained);
        assert!(matches!(err, EngineError::Framing(_)));
        assert_eq!(err.to_string(), "response body was already drained");
    }
}
