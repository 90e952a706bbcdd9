//! Alert API client.
//!
//! # Responsibilities
//! - Issue one authenticated GET per poll
//! - Bound every request with a timeout
//! - Classify the response into a [`PollOutcome`]
//!
//! # Design Decisions
//! - No retries here: the next scheduled tick is the retry
//! - Body decode failures are transport errors, not API errors

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use std::error::Error as _;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::alert::{AlertSnapshot, PollOutcome};
use crate::config::AlertApiConfig;

/// Header carrying the API credential on every request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Source of alert state, queried once per tick.
pub trait AlertClient: Send + Sync {
    /// Perform one request and classify its result. Never fails: every
    /// failure mode is a [`PollOutcome`] variant.
    fn poll(&self) -> impl Future<Output = PollOutcome> + Send;
}

/// Errors constructing the HTTP client.
#[derive(Debug, Error)]
pub enum AlertClientError {
    #[error("alert API key is not configured")]
    MissingApiKey,

    #[error("alert API key is not a valid header value")]
    InvalidApiKey,

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// reqwest-backed [`AlertClient`].
#[derive(Clone)]
pub struct HttpAlertClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpAlertClient {
    pub fn new(config: &AlertApiConfig) -> Result<Self, AlertClientError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(AlertClientError::MissingApiKey)?;

        let mut key = HeaderValue::from_str(api_key).map_err(|_| AlertClientError::InvalidApiKey)?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn classify(&self, response: Response) -> PollOutcome {
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED => PollOutcome::AuthFailed,
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                PollOutcome::RateLimited { retry_after }
            }
            s if !s.is_success() => PollOutcome::ApiError { status: s.as_u16() },
            _ => match response.json::<AlertSnapshot>().await {
                Ok(snapshot) => PollOutcome::Success(snapshot),
                Err(e) if e.is_decode() => {
                    PollOutcome::TransportError(format!("malformed alert payload: {}", error_chain(&e)))
                }
                Err(e) => PollOutcome::TransportError(self.describe(&e)),
            },
        }
    }

    fn describe(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("request timed out after {}ms", self.timeout.as_millis())
        } else {
            error_chain(error)
        }
    }
}

impl AlertClient for HttpAlertClient {
    async fn poll(&self) -> PollOutcome {
        match self.client.get(&self.url).send().await {
            Ok(response) => self.classify(response).await,
            Err(e) => PollOutcome::TransportError(self.describe(&e)),
        }
    }
}

impl std::fmt::Debug for HttpAlertClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAlertClient")
            .field("url", &self.url)
            .field("timeout_ms", &self.timeout.as_millis())
            .finish()
    }
}

/// reqwest's Display omits the underlying cause; walk the source chain.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
