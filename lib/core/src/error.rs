//! Error handling foundation for simple-auth.
//!
//! `AuthError` is the taxonomy surfaced to the host application. Every
//! fallible operation in the workspace returns it wrapped in a rootcause
//! `Report`, so callers can add context via `.context()` as errors
//! propagate up the stack.

use std::fmt;

/// Errors surfaced by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credentials or token were supplied, or no user was given to `can`.
    Unauthorized,
    /// `can` was called without an action.
    InvalidAction,
    /// The configured access policy denied the action.
    Forbidden { action: String },
    /// The auth endpoint answered with a non-success status.
    Http { status: u16, status_text: String },
    /// The transport failed before a response was received.
    Network { reason: String },
    /// A successful response carried a body that is not valid JSON.
    Decode { reason: String },
    /// A response extractor could not find the field it expected.
    MissingField { field: String },
    /// A token storage backend failed.
    Storage { reason: String },
    /// Provider configuration is missing or invalid.
    Configuration { reason: String },
}

impl AuthError {
    /// Creates an HTTP status error.
    #[must_use]
    pub fn http(status: u16, status_text: impl Into<String>) -> Self {
        Self::Http {
            status,
            status_text: status_text.into(),
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::InvalidAction => write!(f, "invalid action"),
            Self::Forbidden { action } => {
                write!(f, "forbidden: policy denied action '{action}'")
            }
            Self::Http {
                status,
                status_text,
            } => {
                write!(f, "request failed with status {status}: {status_text}")
            }
            Self::Network { reason } => write!(f, "network error: {reason}"),
            Self::Decode { reason } => {
                write!(f, "failed to decode response body: {reason}")
            }
            Self::MissingField { field } => {
                write!(f, "response is missing field '{field}'")
            }
            Self::Storage { reason } => {
                write!(f, "token storage operation failed: {reason}")
            }
            Self::Configuration { reason } => {
                write!(f, "invalid provider configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthError {}
