//! Blocking HTTP GET with an explicit deadline.
//!
//! The weather block is the only source that talks to the network. Every
//! request carries its own timeout so a dead endpoint cannot stall the tick
//! beyond it.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("server returned status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Fetches a URL as text.
pub trait HttpFetch: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// `HttpFetch` backed by a shared `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    client: reqwest::blocking::Client,
}

impl ReqwestFetch {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("dwmstat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetch {
    fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self.client.get(url).timeout(timeout).send()?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.text()?)
    }
}

/// `HttpFetch` for manifests without a weather block: every request fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Offline;

impl HttpFetch for Offline {
    fn get(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
        Err(FetchError::Transport("network access disabled".to_string()))
    }
}
