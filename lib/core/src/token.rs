//! Session tokens and login credentials.
//!
//! Both types are opaque to the provider: tokens are never parsed or
//! validated, and credentials are only checked for emptiness before being
//! forwarded to the auth endpoint. Neither type prints its secret material
//! through `Debug`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// An opaque bearer token representing an authenticated session.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Creates a token from its string form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the token carries no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Formats the token as an `Authorization` header value.
    #[must_use]
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Login credentials: an opaque key-value payload sent as the request body.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Map<String, JsonValue>);

impl Credentials {
    /// Creates an empty credential payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the email/password payload used by most auth endpoints.
    #[must_use]
    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new()
            .with("email", email.into())
            .with("password", password.into())
    }

    /// Adds a field to the payload.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns a field of the payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Returns true if the payload has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the payload as a JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("fields", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<Map<String, JsonValue>> for Credentials {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}

/// What an auth attempt presents to the endpoint.
///
/// The request shape follows the variant: a bearer token is sent in the
/// `Authorization` header with an empty body, credentials are sent as the
/// JSON body with no `Authorization` header.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPayload {
    /// An existing session token (session check).
    Bearer(Token),
    /// A credential payload (login).
    Credentials(Credentials),
}

impl AuthPayload {
    /// Returns true if there is nothing to authenticate with.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bearer(token) => token.is_empty(),
            Self::Credentials(credentials) => credentials.is_empty(),
        }
    }
}

impl From<Token> for AuthPayload {
    fn from(token: Token) -> Self {
        Self::Bearer(token)
    }
}

impl From<Credentials> for AuthPayload {
    fn from(credentials: Credentials) -> Self {
        Self::Credentials(credentials)
    }
}
