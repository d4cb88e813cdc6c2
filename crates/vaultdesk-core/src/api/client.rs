//! API client for communicating with the vault backend.
//!
//! This module provides the `ApiClient` struct for logging in and fetching
//! the signed-in user's vaults, and its `VaultService` implementation which
//! classifies HTTP results for the session controller.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{Credentials, SessionToken, Vault};

use super::{ApiError, AuthOutcome, ListOutcome, VaultService};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, relative to the configured base URL
const LOGIN_PATH: &str = "/auth/login";

/// Vault listing endpoint, relative to the configured base URL
const VAULTS_PATH: &str = "/api/vaults";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) listing requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// API client for the vault backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` with default settings
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS), false)
    }

    /// Create a client using the timeout and TLS settings from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled");
        }
        Self::build(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
            config.accept_invalid_certs,
        )
    }

    fn build(base_url: &str, timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for a session token. One request, no retries.
    pub async fn login(&self, credentials: &Credentials) -> std::result::Result<SessionToken, ApiError> {
        let url = self.url(LOGIN_PATH);
        let body = LoginRequest {
            email: credentials.identifier.trim(),
            password: &credentials.secret,
        };

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?;

        SessionToken::new(login.access_token)
            .ok_or_else(|| ApiError::InvalidResponse("Login response carried an empty token".to_string()))
    }

    /// Fetch the vaults visible to `token`, in server order
    pub async fn fetch_vaults(&self, token: &SessionToken) -> std::result::Result<Vec<Vault>, ApiError> {
        let url = self.url(VAULTS_PATH);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = self
                .client
                .get(&url)
                .bearer_auth(token.as_str())
                .header(header::ACCEPT, "application/json")
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let vaults: Vec<Vault> = response.json().await.map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse vault list: {}", e))
                    })?;
                    debug!(count = vaults.len(), "Vaults fetched");
                    return Ok(vaults);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> std::result::Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> std::result::Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

impl VaultService for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> AuthOutcome {
        match self.login(credentials).await {
            Ok(token) => AuthOutcome::Success(token),
            Err(e) if e.is_credential_rejection() => {
                debug!(error = %e, "Credentials rejected");
                AuthOutcome::Rejected
            }
            Err(e) => {
                warn!(error = %e, "Login request failed");
                AuthOutcome::Unreachable
            }
        }
    }

    async fn list_vaults(&self, token: &SessionToken) -> ListOutcome {
        match self.fetch_vaults(token).await {
            Ok(vaults) => ListOutcome::Success(vaults),
            Err(ApiError::Unauthorized) => ListOutcome::Unauthorized,
            Err(e) => {
                warn!(error = %e, "Vault listing failed");
                ListOutcome::Unreachable
            }
        }
    }
}
