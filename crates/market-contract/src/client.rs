// crates/market-contract/src/client.rs
// ============================================================================
// Module: Market HTTP Client
// Description: Single-attempt HTTP transport for the market API.
// Purpose: Issue scenario requests with a fixed timeout and record transcripts.
// Dependencies: async-trait, reqwest, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`Transport`] is the seam between the runner and the network. The
//! production implementation, [`MarketHttpClient`], issues exactly one
//! attempt per request: transient failures and timeouts surface as
//! [`ClientError`] and are never retried. Every exchange, including failed
//! ones, is appended to an in-memory transcript.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Method;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::audit::duration_millis;
use crate::scenario::HttpMethod;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// User agent sent with every request.
const USER_AGENT: &str = concat!("market-contract/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Types
// ============================================================================

/// Fully resolved request ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Optional JSON body.
    pub body: Option<Value>,
}

/// Response received for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExchange {
    /// Response status.
    pub status: StatusCode,
    /// Raw response body text.
    pub body: String,
    /// Parsed body when it is valid JSON.
    pub json: Option<Value>,
}

impl HttpExchange {
    /// Builds an exchange from a status and raw body, parsing JSON if possible.
    #[must_use]
    pub fn new(status: StatusCode, body: String) -> Self {
        let json = serde_json::from_str(&body).ok();
        Self {
            status,
            body,
            json,
        }
    }
}

/// Transport failures. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Build(String),
    /// The request did not complete within the timeout.
    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout {
        /// Target URL.
        url: String,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },
    /// Connection or protocol failure before a response arrived.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying error text.
        message: String,
    },
    /// The response body could not be read.
    #[error("failed to read response body from {url}: {message}")]
    Body {
        /// Target URL.
        url: String,
        /// Underlying error text.
        message: String,
    },
}

/// One recorded HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    /// 1-based position in the transcript.
    pub sequence: u64,
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Request body, if any.
    pub request: Option<Value>,
    /// Response status when one arrived.
    pub status: Option<u16>,
    /// Response body text when one arrived.
    pub response: Option<String>,
    /// Transport error text when the exchange failed.
    pub error: Option<String>,
    /// Wall-clock duration of the exchange.
    pub duration_ms: u64,
}

// ============================================================================
// SECTION: Transport Interface
// ============================================================================

/// Sends resolved requests. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and waits for the full response.
    async fn send(&self, request: &HttpRequest) -> Result<HttpExchange, ClientError>;
}

// ============================================================================
// SECTION: HTTP Client
// ============================================================================

/// reqwest-backed transport with transcript capture.
#[derive(Clone)]
pub struct MarketHttpClient {
    /// Underlying HTTP client.
    client: Client,
    /// Per-request timeout.
    timeout: Duration,
    /// Recorded exchanges in send order.
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl MarketHttpClient {
    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the TLS stack cannot initialize.
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;
        Ok(Self {
            client,
            timeout,
            transcript: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns a snapshot of the transcript entries.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Performs the request without recording it.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpExchange, ClientError> {
        let mut builder = self.client.request(reqwest_method(request.method), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(|err| self.classify(&request.url, &err))?;
        let status = response.status();
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                self.classify(&request.url, &err)
            } else {
                ClientError::Body {
                    url: request.url.clone(),
                    message: err.to_string(),
                }
            }
        })?;
        Ok(HttpExchange::new(status, body))
    }

    /// Maps a reqwest error onto the client error taxonomy.
    fn classify(&self, url: &str, err: &reqwest::Error) -> ClientError {
        if err.is_timeout() {
            return ClientError::Timeout {
                url: url.to_string(),
                timeout_ms: duration_millis(self.timeout),
            };
        }
        ClientError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Appends an exchange to the transcript.
    fn record(
        &self,
        request: &HttpRequest,
        result: &Result<HttpExchange, ClientError>,
        duration: Duration,
    ) {
        let Ok(mut guard) = self.transcript.lock() else {
            return;
        };
        let sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
        let (status, response, error) = match result {
            Ok(exchange) => (Some(exchange.status.as_u16()), Some(exchange.body.clone()), None),
            Err(err) => (None, None, Some(err.to_string())),
        };
        guard.push(TranscriptEntry {
            sequence,
            method: request.method,
            url: request.url.clone(),
            request: request.body.clone(),
            status,
            response,
            error,
            duration_ms: duration_millis(duration),
        });
    }
}

#[async_trait]
impl Transport for MarketHttpClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpExchange, ClientError> {
        let started = Instant::now();
        let result = self.execute(request).await;
        self.record(request, &result, started.elapsed());
        result
    }
}

/// Converts the scenario method into a reqwest method.
fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}
