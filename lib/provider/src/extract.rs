//! Extraction of the user record and session token from auth responses.

use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use simple_auth_core::{AuthError, Token, User};

/// Pulls the user record out of a raw auth response.
pub trait UserParser: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the response does not contain a user.
    fn parse_user(&self, response: &JsonValue) -> Result<User, Report<AuthError>>;
}

/// Pulls the session token out of a raw auth response.
pub trait TokenParser: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the response does not contain a token.
    fn parse_token(&self, response: &JsonValue) -> Result<Token, Report<AuthError>>;
}

impl<F> UserParser for F
where
    F: Fn(&JsonValue) -> Result<User, Report<AuthError>> + Send + Sync,
{
    fn parse_user(&self, response: &JsonValue) -> Result<User, Report<AuthError>> {
        self(response)
    }
}

impl<F> TokenParser for F
where
    F: Fn(&JsonValue) -> Result<Token, Report<AuthError>> + Send + Sync,
{
    fn parse_token(&self, response: &JsonValue) -> Result<Token, Report<AuthError>> {
        self(response)
    }
}

/// Reads a top-level key of the response object.
///
/// As a `UserParser` the value may be any non-null JSON. As a `TokenParser`
/// it must be a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExtractor {
    key: String,
}

impl KeyExtractor {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn missing(&self) -> Report<AuthError> {
        AuthError::MissingField {
            field: self.key.clone(),
        }
        .into()
    }
}

impl UserParser for KeyExtractor {
    fn parse_user(&self, response: &JsonValue) -> Result<User, Report<AuthError>> {
        match response.get(&self.key) {
            Some(value) if !value.is_null() => Ok(User::new(value.clone())),
            _ => Err(self.missing()),
        }
    }
}

impl TokenParser for KeyExtractor {
    fn parse_token(&self, response: &JsonValue) -> Result<Token, Report<AuthError>> {
        response
            .get(&self.key)
            .and_then(JsonValue::as_str)
            .filter(|token| !token.is_empty())
            .map(Token::new)
            .ok_or_else(|| self.missing())
    }
}
