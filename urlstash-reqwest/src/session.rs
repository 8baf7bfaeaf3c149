//! Convenience wiring of a cached reqwest client.

use std::sync::Arc;

use reqwest_middleware::ClientWithMiddleware;
use urlstash_core::CacheEngine;

use crate::transport::CacheMiddleware;

/// Builder for a reqwest client with the cache interceptor mounted.
///
/// Covers the common case of "give me a client whose requests go through
/// this engine". TLS certificate verification stays on by default;
/// callers that deliberately delegate trust elsewhere can opt out per
/// client with [`accept_invalid_certs`], which is scoped to this client
/// only and never weakens unrelated code paths.
///
/// [`accept_invalid_certs`]: SessionBuilder::accept_invalid_certs
///
/// # Example
///
/// ```no_run
/// use urlstash_mem::InMemoryEngine;
/// use urlstash_reqwest::SessionBuilder;
///
/// # fn main() -> Result<(), reqwest::Error> {
/// let client = SessionBuilder::new(InMemoryEngine::new()).build()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder<E> {
    engine: Arc<E>,
    client: Option<reqwest::Client>,
    accept_invalid_certs: bool,
}

impl<E> SessionBuilder<E>
where
    E: CacheEngine + 'static,
{
    /// Start a session around the given cache engine.
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
            client: None,
            accept_invalid_certs: false,
        }
    }

    /// Use a preconfigured client instead of building a default one.
    ///
    /// Timeouts, proxies and TLS settings on the client pass through to
    /// the transport unmodified; when set, `accept_invalid_certs` is
    /// ignored.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Skip TLS certificate verification for this client.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Build the cached client.
    pub fn build(self) -> reqwest::Result<ClientWithMiddleware> {
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .danger_accept_invalid_certs(self.accept_invalid_certs)
                .build()?,
        };
        Ok(reqwest_middleware::ClientBuilder::new(client)
            .with(CacheMiddleware::new(self.engine))
            .build())
    }
}
