//! HTTP plumbing for the simple-auth provider.
//!
//! - `HttpTransport`: the pluggable seam that actually sends a request
//! - `ReqwestTransport`: the default transport, backed by `reqwest`
//! - `RequestExecutor`: sends JSON requests and retries transient failures
//!   with exponential backoff

mod executor;
mod http;

pub use executor::{
    DEFAULT_CONTENT_TYPE, RETRYABLE_STATUSES, RequestExecutor, RetryPolicy, is_retryable_status,
};
pub use http::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
