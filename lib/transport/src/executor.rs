//! Request execution with retry on transient HTTP statuses.
//!
//! A failed attempt is retried only when its status is in
//! [`RETRYABLE_STATUSES`] and attempts remain. The delay doubles after every
//! retry with no cap other than the attempt ceiling. Transport failures
//! (`AuthError::Network`) are never retried.

use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use simple_auth_core::AuthError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Statuses considered transient.
pub const RETRYABLE_STATUSES: [u16; 7] = [408, 500, 502, 503, 504, 522, 524];

/// Content type sent unless the caller overrides it.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

const CONTENT_TYPE: &str = "Content-Type";

/// Returns true if a response with this status may be retried.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Retry configuration: total attempts and the initial backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Default number of attempts.
    pub const DEFAULT_RETRIES: u32 = 3;

    /// Default delay before the first retry.
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(300);

    /// Creates a policy allowing `retries` total attempts.
    #[must_use]
    pub fn new(retries: u32, backoff: Duration) -> Self {
        Self { retries, backoff }
    }

    /// Total number of attempts, including the first one.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Delay before the first retry.
    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Delay inserted before attempt `attempt + 1`, for `attempt >= 1`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RETRIES, Self::DEFAULT_BACKOFF)
    }
}

/// Sends JSON requests through a transport, retrying transient failures.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    timeout: Option<Duration>,
}

impl RequestExecutor {
    /// Creates an executor with the default retry policy and no timeout.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            timeout: None,
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the per-attempt timeout attached to requests that have none.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Executes a request using the configured retry policy.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute_with`].
    pub async fn execute(
        &self,
        url: &str,
        request: HttpRequest,
    ) -> Result<JsonValue, Report<AuthError>> {
        self.execute_with(url, request, self.policy.retries, self.policy.backoff)
            .await
    }

    /// Executes a request allowing at most `retries` attempts, waiting
    /// `backoff` before the first retry and doubling the wait after each.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` for a non-retryable status or once the
    /// attempts are exhausted, `AuthError::Network` if the transport fails,
    /// and `AuthError::Decode` if a successful body is not JSON.
    #[instrument(skip(self, request, backoff), fields(method = %request.method))]
    pub async fn execute_with(
        &self,
        url: &str,
        request: HttpRequest,
        retries: u32,
        backoff: Duration,
    ) -> Result<JsonValue, Report<AuthError>> {
        let request = self.prepare(request);
        let mut remaining = retries;
        let mut delay = backoff;
        let mut attempt: u32 = 1;

        loop {
            let response = self.transport.send(url, request.clone()).await?;
            if response.is_success() {
                debug!(status = response.status(), attempt, "request succeeded");
                return response.json();
            }

            let status = response.status();
            if remaining > 1 && is_retryable_status(status) {
                warn!(status, attempt, ?delay, "transient failure, retrying");
                tokio::time::sleep(delay).await;
                remaining -= 1;
                delay = delay.saturating_mul(2);
                attempt += 1;
                continue;
            }

            return Err(failure(&response));
        }
    }

    fn prepare(&self, request: HttpRequest) -> HttpRequest {
        let timeout = request.timeout.or(self.timeout);
        let request = request.with_default_header(CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
        match timeout {
            Some(timeout) => request.with_timeout(timeout),
            None => request,
        }
    }
}

fn failure(response: &HttpResponse) -> Report<AuthError> {
    warn!(status = response.status(), "request failed");
    AuthError::http(response.status(), response.status_text()).into()
}
