//! Feed source HTTP client construction
//!
//! One `reqwest::Client` per `HttpFeedSource`, with a hard request timeout so
//! a stalled fetch always surfaces as `FetchCause::Timeout` instead of
//! hanging the controller.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use pulse_core::{Environment, FetchCause, DEFAULT_TIMEOUT_SECS};

/// Feed source client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deployment stage the client targets
    pub environment: Environment,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Base URL override for self-hosted or test deployments
    pub base_url: Option<String>,
}

impl ClientConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Base URL of the feed source API for this configuration
    pub fn api_base(&self) -> &str {
        if let Some(base) = &self.base_url {
            return base;
        }
        match self.environment {
            Environment::Prod => "https://backend.epns.io",
            Environment::Staging => "https://backend-staging.epns.io",
            Environment::Dev => "https://backend-dev.epns.io",
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

/// Errors from feed source requests
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build feed client: {0}")]
    ClientBuild(String),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("feed source rejected credentials: HTTP {status}")]
    Auth { status: u16 },

    #[error("feed source returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed feed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Collapse into the domain-level cause carried by state snapshots
    pub fn cause(&self) -> FetchCause {
        match self {
            FetchError::ClientBuild(_) | FetchError::Network { .. } | FetchError::Status { .. } => {
                FetchCause::Network
            }
            FetchError::Timeout { .. } => FetchCause::Timeout,
            FetchError::Auth { .. } => FetchCause::Auth,
            FetchError::Malformed(_) => FetchCause::MalformedResponse,
        }
    }

    /// Classify a transport-level reqwest failure
    pub(crate) fn from_request(url: &str, err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: err,
            }
        }
    }

    /// Classify a non-success HTTP status
    pub(crate) fn from_status(url: &str, status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => FetchError::Auth {
                status: status.as_u16(),
            },
            code => FetchError::Status {
                status: code,
                url: url.to_string(),
            },
        }
    }
}

/// Create the HTTP client used for all feed source calls
pub fn create_feed_client(config: &ClientConfig) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("pulse/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::ClientBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.api_base().contains("staging"));
    }

    #[test]
    fn test_base_url_override_wins() {
        let config = ClientConfig::new(Environment::Prod).with_base_url("http://localhost:4000/");
        assert_eq!(config.api_base(), "http://localhost:4000");
    }

    #[test]
    fn test_error_causes() {
        let auth = FetchError::Auth { status: 401 };
        assert_eq!(auth.cause(), FetchCause::Auth);

        let timeout = FetchError::Timeout {
            url: "https://backend.epns.io".to_string(),
            timeout_secs: 30,
        };
        assert_eq!(timeout.cause(), FetchCause::Timeout);

        let malformed = FetchError::Malformed("missing payload".to_string());
        assert_eq!(malformed.cause(), FetchCause::MalformedResponse);

        let status = FetchError::Status {
            status: 503,
            url: "https://backend.epns.io".to_string(),
        };
        assert_eq!(status.cause(), FetchCause::Network);
    }
}
