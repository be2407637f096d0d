//! HTTP client for the accounting platform API.
//!
//! Three calls are exposed: the contact roster ([`ApiClient::fetch_contacts`]), the
//! certificate listing for one CNPJ and month ([`ApiClient::fetch_certificates`]) and
//! the file download ([`ApiClient::fetch_file`]). Each call is attempted once; failures
//! are logged by class (status, transport, parse) and turned into an empty result.

mod certificates;
mod contacts;
mod files;

use crate::config::ResolvedConfig;
use crate::constants::API_PREFIX;
use crate::errors::{AppError, AppResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{error, warn};
use url::Url;

/// Client bound to one tenant base URL and access token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    metadata_timeout: Duration,
    download_timeout: Duration,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .field("metadata_timeout", &self.metadata_timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}

impl ApiClient {
    /// Builds a client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns `UrlError` if the base URL does not parse or cannot carry a path, and
    /// `NetworkError` if the HTTP client cannot be initialized.
    pub fn new(config: &ResolvedConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(config.api_base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::UrlError(format!(
                "'{}' cannot be used as a base URL",
                config.api_base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            token: config.api_token.trim().to_string(),
            metadata_timeout: config.metadata_timeout(),
            download_timeout: config.download_timeout(),
        })
    }

    /// `<base>/api/v1/<token>/<name>`, with the token percent-encoded as one segment.
    fn endpoint(&self, name: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::UrlError("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(API_PREFIX.split('/'))
            .push(&self.token)
            .push(name);
        Ok(url)
    }

    /// Sends a request and requires an HTTP 200 answer.
    ///
    /// Transport errors are stripped of the request URL so the token never reaches the logs.
    async fn send(&self, request: RequestBuilder, context: &str) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::NetworkError(format!("{context}: {}", e.without_url())))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                context: context.to_string(),
            });
        }
        Ok(response)
    }

    async fn read_json(response: Response, context: &str) -> AppResult<serde_json::Value> {
        let text = response
            .text()
            .await
            .map_err(|e| AppError::NetworkError(format!("{context}: {}", e.without_url())))?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::ParseError(format!("{context}: invalid JSON body: {e}")))
    }
}

/// Logs a failed API call according to its failure class.
fn log_failure(operation: &'static str, err: &AppError) {
    match err {
        AppError::HttpStatus { status, context } => warn!(
            operation,
            status = *status,
            context = %context,
            "Remote API returned an error status"
        ),
        AppError::NetworkError(msg) => warn!(
            operation,
            error = %msg,
            "Connection error talking to the remote API"
        ),
        AppError::EmptyResponse(msg) => warn!(
            operation,
            detail = %msg,
            "Remote API returned no content"
        ),
        other => error!(
            operation,
            error = %other,
            "Unexpected error talking to the remote API"
        ),
    }
}
