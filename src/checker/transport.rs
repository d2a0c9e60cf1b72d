//! HTTP transport seam.
//!
//! The status checker only needs "GET this URL, tell me the final status".
//! Keeping that behind a trait lets the retry state machine run against fake
//! transports in tests.

use async_trait::async_trait;

use crate::config::BatchConfig;
use crate::error_handling::{classify_reqwest_error, InitializationError, TransportError};
use crate::initialization::init_client;

/// What a successful exchange reports back: the final status and where the
/// redirect chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProbe {
    pub status_code: u16,
    pub final_url: String,
}

/// A single HTTP GET, redirects followed, timeout enforced by the implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn probe(&self, url: &str) -> Result<HttpProbe, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds the client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be built.
    pub fn from_config(config: &BatchConfig) -> Result<Self, InitializationError> {
        Ok(Self::new(init_client(config)?))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn probe(&self, url: &str) -> Result<HttpProbe, TransportError> {
        match self.client.get(url).send().await {
            Ok(response) => Ok(HttpProbe {
                status_code: response.status().as_u16(),
                final_url: response.url().to_string(),
            }),
            Err(e) => {
                let error = classify_reqwest_error(&e);
                log::debug!("Request to {url} failed: {error}");
                Err(error)
            }
        }
    }
}
