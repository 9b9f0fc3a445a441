//! HTTP client wrapper.
//!
//! Thin layer over reqwest providing:
//! - Configurable timeouts
//! - User-agent management
//! - Api-key header helper for the Deployment API
//! - Error-status mapping into [`SailError`]

use crate::config::NetworkConfig;
use crate::error::{Result, SailError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Header carrying the Deployment API key.
const API_KEY_HEADER: &str = "appian-api-key";

/// HTTP client used for export and checklist traffic.
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| SailError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: Some(e.to_string()),
            })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The timeout requests on this client are subject to.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SailError::Network {
                message: format!("GET {} failed: {}", url, e),
                cause: Some(e.to_string()),
            })?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }

    /// Make a GET request carrying the Deployment API key header.
    pub async fn get_with_api_key(&self, url: &str, api_key: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| SailError::Network {
                message: format!("GET {} failed: {}", url, e),
                cause: Some(e.to_string()),
            })?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }

    /// Make a POST request with a multipart form and the api-key header.
    ///
    /// The Deployment API v2 requires `multipart/form-data` with a `json`
    /// field rather than a plain JSON body.
    pub async fn post_multipart_with_api_key(
        &self,
        url: &str,
        api_key: &str,
        extra_headers: &[(&str, &str)],
        form: reqwest::multipart::Form,
    ) -> Result<Response> {
        let mut request = self.client.post(url).header(API_KEY_HEADER, api_key);
        for (key, value) in extra_headers {
            request = request.header(*key, *value);
        }

        let response = request
            .multipart(form)
            .send()
            .await
            .map_err(|e| SailError::Network {
                message: format!("POST {} failed: {}", url, e),
                cause: Some(e.to_string()),
            })?;
        debug!("POST {} -> {}", url, response.status());
        Ok(response)
    }

    /// Map an error status into the acquisition taxonomy, passing successful
    /// responses through.
    pub fn require_success(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("{}: authentication rejected ({})", context, status)
            }
            StatusCode::NOT_FOUND => format!("{}: not found ({})", context, status),
            _ => format!("{}: unexpected status {}", context, status),
        };

        Err(SailError::Acquisition {
            message,
            cause: Some(status.to_string()),
        })
    }
}

/// Extract domain from a URL, for log and error messages.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
