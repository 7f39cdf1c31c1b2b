//! # OData HTTP Client
//!
//! A resilient client for the campus OData service. It owns one
//! authenticated `reqwest` session and performs single GET/POST operations
//! with bounded retry, failure classification and optional response caching
//! through an injected [`QueryCache`] collaborator.
//!
//! ## Core Features:
//! - **Single Session**: One persistent client carrying HTTP basic auth for
//!   every request; `auth()` replaces it wholesale.
//! - **Bounded Retry**: Every failure class (connection, timeout, body
//!   decode, HTTP status) is retried a fixed number of times with a fixed
//!   sleep between attempts, then classified and logged.
//! - **Soft Failures**: Terminal GET failures come back as `None` so a batch
//!   of independent extractions can keep going when one query is denied or
//!   unavailable. The only hard failure on the write path is an HTTP 403,
//!   which signals a systemic credential problem.
//! - **Response Caching**: GET bodies can be stored in a shared cache keyed
//!   by the exact request URI, with a configurable TTL in hours.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;

use crate::connections::QueryCache;
use crate::loggers::loggerlocal::LoggerLocal;

/// Seconds slept between retry attempts.
pub const SLEEP_TIME: u64 = 60;
/// Number of retries after the initial attempt, consumed per call.
pub const RETRIES: u32 = 1;
/// Fixed timeout applied to POST requests, in seconds.
pub const POST_TIMEOUT: u64 = 30;
/// Default number of hours a cached query response stays valid.
pub const QUERY_CACHE_TIMEOUT_HOURS: u64 = 48;

/// Hard failures surfaced to callers. Everything transient is logged and
/// collapsed to an absence value instead.
#[derive(Debug, Error)]
pub enum ODataError {
    /// The underlying HTTP session could not be constructed at all.
    #[error("failed to construct the HTTP session: {0}")]
    Session(#[from] reqwest::Error),

    /// A POST was denied with HTTP 403 after retries were exhausted.
    #[error("access was denied for '{username}' while making POST {uri}")]
    AccessDenied {
        /// The principal the session was authenticated as.
        username: String,
        /// The target that rejected the request.
        uri: String,
    },

    /// The caller supplied pagination parameters to a paged query.
    #[error("URL cannot include $top, $skip, or $count in the query string when using get_paged() - called with \"{url}\"")]
    PagingParams {
        /// The offending URL.
        url: String,
    },
}

/// The body attached to an HTTP error status, decoded when the server sent
/// JSON and raw otherwise.
#[derive(Debug)]
pub enum ErrorBody {
    /// The decoded JSON error document.
    Json(Value),
    /// The raw response text.
    Raw(String),
}

/// Classification of a single failed request attempt.
#[derive(Debug, Error)]
pub enum RequestFailure {
    /// The connection could not be established or broke mid-transfer.
    #[error("connection error: {0}")]
    Connect(reqwest::Error),

    /// The request timed out.
    #[error("timeout: {0}")]
    Timeout(reqwest::Error),

    /// The response body was not valid JSON, e.g. an HTML error page.
    #[error("response decode error: {0}")]
    Decode(reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP status {status}")]
    HttpStatus {
        /// The status code returned by the server.
        status: StatusCode,
        /// The error body, decoded when possible.
        body: ErrorBody,
    },
}

impl RequestFailure {
    /// Short failure-class name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestFailure::Connect(_) => "ConnectionError",
            RequestFailure::Timeout(_) => "Timeout",
            RequestFailure::Decode(_) => "DecodeError",
            RequestFailure::HttpStatus { .. } => "HTTPError",
        }
    }
}

/// Sorts a transport-level `reqwest` error into its failure class.
fn classify_transport(err: reqwest::Error) -> RequestFailure {
    if err.is_timeout() {
        RequestFailure::Timeout(err)
    } else if err.is_decode() {
        RequestFailure::Decode(err)
    } else {
        RequestFailure::Connect(err)
    }
}

/// # OData Client
///
/// One authenticated connection context against the campus OData service.
/// The session and credentials are owned exclusively by the instance; the
/// optional cache is a shared collaborator injected at wiring time.
pub struct ODataClient {
    /// The persistent HTTP session carrying basic auth.
    session: reqwest::Client,
    /// The authenticated principal, also used in permission-hint log lines.
    username: String,
    /// The principal's secret.
    password: String,
    /// Shared logger for request outcomes.
    logger: Arc<LoggerLocal>,
    /// Optional shared query cache keyed by request URI.
    cache: Option<Arc<dyn QueryCache>>,
    /// Determines if all `get()` requests should automatically be cached.
    pub cache_query_requests: bool,
    /// Number of hours to cache query requests, if the cache is enabled.
    pub query_cache_timeout_hours: u64,
    /// Retries allowed per individual call.
    pub retries: u32,
    /// Sleep between retry attempts.
    pub retry_sleep: Duration,
}

impl ODataClient {
    /// Creates a client authenticated as `username`/`password`.
    ///
    /// Fails only if the underlying HTTP session cannot be constructed;
    /// request-level problems never surface here.
    pub fn new(
        username: &str,
        password: &str,
        logger: Arc<LoggerLocal>,
    ) -> Result<Self, ODataError> {
        let session = reqwest::Client::builder().build()?;
        Ok(Self {
            session,
            username: username.to_string(),
            password: password.to_string(),
            logger,
            cache: None,
            cache_query_requests: false,
            query_cache_timeout_hours: QUERY_CACHE_TIMEOUT_HOURS,
            retries: RETRIES,
            retry_sleep: Duration::from_secs(SLEEP_TIME),
        })
    }

    /// Attaches a shared query cache used by `get()` when caching is in
    /// effect.
    pub fn with_cache(mut self, cache: Arc<dyn QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Re-authenticates, replacing the session and credentials wholesale.
    pub fn auth(&mut self, username: &str, password: &str) -> Result<(), ODataError> {
        self.session = reqwest::Client::builder().build()?;
        self.username = username.to_string();
        self.password = password.to_string();
        Ok(())
    }

    /// The principal this client authenticates as.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Shared logger handle, used by the modules layered on this client.
    pub(crate) fn logger(&self) -> &LoggerLocal {
        &self.logger
    }

    /// Transmit an HTTP GET to `uri`, retrying the request upon failure.
    ///
    /// Caching is used if the instance-level `cache_query_requests` flag is
    /// set or `use_cache` is `Some(true)`; an explicit `Some(false)` always
    /// disables caching for this call. On a cache hit the stored body is
    /// returned without touching the network.
    ///
    /// Returns the decoded response body, or `None` if the request still
    /// fails, times out, answers with an error status, or cannot be decoded
    /// after the retries are spent. Failures are logged with enough
    /// context to diagnose permission and connectivity problems; an HTTP 403
    /// additionally logs a hint naming the configured principal, but is
    /// deliberately not escalated so that one denied query cannot halt a
    /// larger batch of independent extractions.
    pub async fn get(&self, uri: &str, use_cache: Option<bool>) -> Option<Value> {
        // An explicit per-call override wins over the instance-level flag.
        let use_cache = use_cache.unwrap_or(self.cache_query_requests);

        if use_cache {
            if let Some(cache) = &self.cache {
                if let Some(cached) = cache.retrieve(uri) {
                    return Some(cached);
                }
            }
        }

        let mut current_retries = self.retries;
        loop {
            match self.get_once(uri).await {
                Ok(body) => {
                    if use_cache {
                        if let Some(cache) = &self.cache {
                            cache.store(uri, &body, self.query_cache_timeout_hours);
                        }
                    }
                    return Some(body);
                }
                Err(failure) => {
                    if current_retries > 0 {
                        self.logger
                            .info(
                                &format!(
                                    "GET request failed. Retrying after {} seconds...",
                                    self.retry_sleep.as_secs()
                                ),
                                None,
                            )
                            .await;
                        sleep(self.retry_sleep).await;
                        current_retries -= 1;
                        continue;
                    }
                    self.log_get_failure(uri, &failure).await;
                    return None;
                }
            }
        }
    }

    /// One GET attempt: trailing-slash noise is stripped, no explicit
    /// timeout is set, and any non-2xx status is an error.
    async fn get_once(&self, uri: &str) -> Result<Value, RequestFailure> {
        let response = self
            .session
            .get(uri.trim_end_matches('/'))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestFailure::HttpStatus {
                status,
                body: Self::error_body(response).await,
            });
        }

        response.json::<Value>().await.map_err(classify_transport)
    }

    /// Transmit an HTTP POST to `uri`, retrying the request upon failure.
    ///
    /// `command` is an optional path suffix, the same as `uri + "/suffix"`.
    /// The request carries a JSON `payload`, optional extra `headers` and a
    /// fixed 30 second timeout. Responses are never cached.
    ///
    /// Returns `Ok(Some(body))` on success and `Ok(None)` for the common
    /// terminal failures. An HTTP 403 after retries is the exception: a
    /// denied write indicates a systemic credential problem, so it is logged
    /// and escalated as [`ODataError::AccessDenied`].
    pub async fn post(
        &self,
        uri: &str,
        command: Option<&str>,
        payload: Option<&Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Option<Value>, ODataError> {
        let target = format!("{}/{}", uri.trim_matches('/'), command.unwrap_or(""));

        let mut current_retries = self.retries;
        loop {
            match self.post_once(&target, payload, headers.clone()).await {
                Ok(body) => return Ok(Some(body)),
                Err(failure) => {
                    if current_retries > 0 {
                        self.logger
                            .info(
                                &format!(
                                    "POST request failed. Retrying after {} seconds...",
                                    self.retry_sleep.as_secs()
                                ),
                                None,
                            )
                            .await;
                        sleep(self.retry_sleep).await;
                        current_retries -= 1;
                        continue;
                    }
                    return self.finish_failed_post(&target, payload, failure).await;
                }
            }
        }
    }

    /// One POST attempt with the fixed request timeout.
    async fn post_once(
        &self,
        target: &str,
        payload: Option<&Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Value, RequestFailure> {
        let mut request = self
            .session
            .post(target)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(Duration::from_secs(POST_TIMEOUT));
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestFailure::HttpStatus {
                status,
                body: Self::error_body(response).await,
            });
        }

        response.json::<Value>().await.map_err(classify_transport)
    }

    /// Logs a terminal POST failure and decides between the soft absence
    /// result and the fatal 403 escalation.
    async fn finish_failed_post(
        &self,
        target: &str,
        payload: Option<&Value>,
        failure: RequestFailure,
    ) -> Result<Option<Value>, ODataError> {
        match &failure {
            RequestFailure::HttpStatus { status, body } => {
                self.logger
                    .error(
                        &format!(
                            "HTTP Error during POST: {}\n{} occurred while making POST {}",
                            status,
                            failure.kind(),
                            target
                        ),
                        None,
                    )
                    .await;
                self.logger.info("Payload:", payload.cloned()).await;
                match body {
                    ErrorBody::Json(value) => {
                        self.logger.info("Response Body:", Some(value.clone())).await
                    }
                    ErrorBody::Raw(text) => {
                        self.logger.info(&format!("Response Body: {}", text), None).await
                    }
                }
                if *status == StatusCode::FORBIDDEN {
                    self.logger
                        .error(&self.permission_hint(), None)
                        .await;
                    return Err(ODataError::AccessDenied {
                        username: self.username.clone(),
                        uri: target.to_string(),
                    });
                }
            }
            other => {
                self.logger
                    .error(
                        &format!(
                            "{} occurred while making POST {}: {}",
                            other.kind(),
                            target,
                            other
                        ),
                        None,
                    )
                    .await;
                self.logger.info("Payload:", payload.cloned()).await;
            }
        }
        Ok(None)
    }

    /// Logs a terminal GET failure with its classification.
    async fn log_get_failure(&self, uri: &str, failure: &RequestFailure) {
        match failure {
            RequestFailure::HttpStatus { status, body } => {
                self.logger
                    .error(
                        &format!("{} occurred while making OData GET {}", failure.kind(), uri),
                        None,
                    )
                    .await;
                match body {
                    ErrorBody::Json(value) => {
                        self.logger.error(&format!("HTTP {}", status), Some(value.clone())).await
                    }
                    ErrorBody::Raw(text) => {
                        self.logger.error(&format!("HTTP {}: {}", status, text), None).await
                    }
                }
                if *status == StatusCode::FORBIDDEN {
                    self.logger.error(&self.permission_hint(), None).await;
                }
            }
            other => {
                self.logger.error(&other.to_string(), None).await;
                self.logger
                    .error(
                        &format!("{} occurred while making OData GET {}", other.kind(), uri),
                        None,
                    )
                    .await;
            }
        }
    }

    /// The hint logged alongside HTTP 403 outcomes.
    fn permission_hint(&self) -> String {
        format!(
            "Unauthorized. Ensure '{}' has CNS permissions and the password in config.json is correct",
            self.username
        )
    }

    /// Captures the body of an error response, decoded when the server sent
    /// JSON and raw otherwise.
    async fn error_body(response: reqwest::Response) -> ErrorBody {
        let raw = response.text().await.unwrap_or_default();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Raw(raw),
        }
    }
}
