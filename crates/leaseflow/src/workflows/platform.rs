//! Thin configured `reqwest::Client` wrapper for the marketplace platform
//! REST API. The workflow modules talk to it through their gateway traits;
//! this module only knows how to build requests and translate failures.

use std::time::Duration;

use reqwest::header;

use crate::config::PlatformConfig;

const USER_AGENT: &str = concat!("leaseflow/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error raised when the platform cannot be reached or rejects a call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("platform request failed: {0}")]
    Transport(String),
    #[error("platform rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Pre-configured HTTP client for the marketplace platform.
///
/// Holds the base URL and optional bearer token; request paths are always
/// API-relative. Both workflow gateways implement their traits on top of it.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    base_url: String,
    http: reqwest::Client,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, GatewayError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(token) = &config.api_token {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| GatewayError::Transport(err.to_string()))?;
            default_headers.insert(header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Turn a non-success response into a [`GatewayError::Rejected`] carrying
    /// whatever message body the platform sent along.
    pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let message = if message.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        } else {
            message
        };

        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}
