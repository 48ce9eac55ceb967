//! The user record returned by the auth endpoint.
//!
//! The provider treats the record as opaque JSON. Only the identity
//! resolver looks inside it, through the typed `UserProfile` view.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An opaque user record as returned by the remote auth endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(JsonValue);

impl User {
    /// Wraps a raw JSON record.
    #[must_use]
    pub fn new(record: JsonValue) -> Self {
        Self(record)
    }

    /// Returns the raw record.
    #[must_use]
    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }

    /// Returns a top-level string field of the record.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(JsonValue::as_str)
    }

    /// Returns the typed view of the identity fields.
    ///
    /// Fields that are absent or not strings are `None`.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            fullname: self.field("fullname").map(str::to_string),
            name: self.field("name").map(str::to_string),
            username: self.field("username").map(str::to_string),
            email: self.field("email").map(str::to_string),
        }
    }

    /// Consumes the user, returning the raw record.
    #[must_use]
    pub fn into_json(self) -> JsonValue {
        self.0
    }
}

impl From<JsonValue> for User {
    fn from(record: JsonValue) -> Self {
        Self(record)
    }
}

/// Identity-bearing fields of a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub fullname: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserProfile {
    /// Returns the identity candidates in priority order.
    #[must_use]
    pub fn identity_candidates(&self) -> [Option<&str>; 4] {
        [
            self.fullname.as_deref(),
            self.name.as_deref(),
            self.username.as_deref(),
            self.email.as_deref(),
        ]
    }
}

/// The success value of `login` and `check_auth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub data: User,
}

impl AuthResult {
    #[must_use]
    pub fn new(data: User) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_reads_string_fields() {
        let user = User::new(json!({"fullname": "Ada", "email": "ada@example.com", "id": 7}));
        let profile = user.profile();
        assert_eq!(profile.fullname.as_deref(), Some("Ada"));
        assert_eq!(profile.email.as_deref(), Some("ada@example.com"));
        assert!(profile.name.is_none());
    }

    #[test]
    fn profile_ignores_non_string_fields() {
        let user = User::new(json!({"name": 42}));
        assert!(user.profile().name.is_none());
    }

    #[test]
    fn profile_of_non_object_is_empty() {
        let user = User::new(JsonValue::Null);
        assert_eq!(user.profile(), UserProfile::default());
    }

    #[test]
    fn auth_result_serializes_data_key() {
        let result = AuthResult::new(User::new(json!({"email": "a@b.com"})));
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json, json!({"data": {"email": "a@b.com"}}));
    }
}
