use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::http_client;

/// Largest image body accepted from a remote host.
pub const MAX_IMAGE_BYTES: usize = 64 * 1024 * 1024;

/// Failure of a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid image link {link}: {reason}")]
    InvalidLink { link: String, reason: String },
    #[error("HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to read body: {0}")]
    Body(#[from] std::io::Error),
}

/// Source of image bytes for a URL.
///
/// Implementations are shared by every pool worker and must not rely on call order.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Plain HTTP GET with a whole-request timeout.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http_client::agent_with_timeout(timeout),
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        validate_link(url)?;
        match self.agent.get(url).call() {
            Ok(response) => {
                if response.status() >= 400 {
                    return Err(FetchError::Status(response.status()));
                }
                Ok(http_client::read_response_bytes(response, self.max_bytes)?)
            }
            Err(ureq::Error::Status(code, _)) => Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(err)) => Err(FetchError::Transport(err.to_string())),
        }
    }
}

/// Only absolute `http`/`https` links with a host are requested.
fn validate_link(link: &str) -> Result<(), FetchError> {
    let invalid = |reason: String| FetchError::InvalidLink {
        link: link.to_string(),
        reason,
    };
    let parsed = Url::parse(link).map_err(|err| invalid(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
