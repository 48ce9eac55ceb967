//! Identity resolution for user records.

use simple_auth_core::User;
use std::sync::Arc;

/// Derives a string identity from a user record.
pub trait IdentityExtractor: Send + Sync {
    fn extract(&self, user: &User) -> String;
}

impl<F> IdentityExtractor for F
where
    F: Fn(&User) -> String + Send + Sync,
{
    fn extract(&self, user: &User) -> String {
        self(user)
    }
}

/// Resolves display and tenant identities, with optional host overrides.
#[derive(Clone, Default)]
pub struct IdentityResolver {
    identifier: Option<Arc<dyn IdentityExtractor>>,
    tenant_identifier: Option<Arc<dyn IdentityExtractor>>,
}

impl IdentityResolver {
    /// Creates a resolver using the default identity heuristic and no
    /// tenant identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the display identity.
    #[must_use]
    pub fn with_identifier(mut self, identifier: Arc<dyn IdentityExtractor>) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Supplies the tenant identity.
    #[must_use]
    pub fn with_tenant_identifier(mut self, tenant_identifier: Arc<dyn IdentityExtractor>) -> Self {
        self.tenant_identifier = Some(tenant_identifier);
        self
    }

    /// Returns the display identity of `user`.
    ///
    /// A configured identifier wins unconditionally. Otherwise the first
    /// non-empty of full name, name, username and email is used, or the
    /// empty string if none is present.
    #[must_use]
    pub fn get_identity(&self, user: &User) -> String {
        if let Some(identifier) = &self.identifier {
            return identifier.extract(user);
        }

        user.profile()
            .identity_candidates()
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.is_empty())
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Returns the tenant identity of `user`, if a tenant identifier is
    /// configured.
    #[must_use]
    pub fn get_tenant_identity(&self, user: &User) -> Option<String> {
        self.tenant_identifier
            .as_ref()
            .map(|identifier| identifier.extract(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(record: serde_json::Value) -> String {
        IdentityResolver::new().get_identity(&User::new(record))
    }

    #[test]
    fn fullname_wins_over_email() {
        assert_eq!(identity(json!({"fullname": "A", "email": "b@x.com"})), "A");
    }

    #[test]
    fn falls_back_to_email() {
        assert_eq!(identity(json!({"email": "b@x.com"})), "b@x.com");
    }

    #[test]
    fn empty_record_is_empty_identity() {
        assert_eq!(identity(json!({})), "");
    }

    #[test]
    fn priority_order() {
        assert_eq!(identity(json!({"name": "N", "username": "u", "email": "e"})), "N");
        assert_eq!(identity(json!({"username": "u", "email": "e"})), "u");
    }

    #[test]
    fn empty_fields_are_skipped() {
        assert_eq!(identity(json!({"fullname": "", "name": "N"})), "N");
    }

    #[test]
    fn custom_identifier_wins_unconditionally() {
        let resolver = IdentityResolver::new()
            .with_identifier(Arc::new(|user: &User| format!("id:{}", user.field("id").unwrap_or("?"))));
        let user = User::new(json!({"fullname": "A", "id": "42"}));
        assert_eq!(resolver.get_identity(&user), "id:42");

        let blank = IdentityResolver::new().with_identifier(Arc::new(|_: &User| String::new()));
        assert_eq!(blank.get_identity(&user), "");
    }

    #[test]
    fn tenant_identity_absent_by_default() {
        let user = User::new(json!({"tenant": "acme"}));
        assert_eq!(IdentityResolver::new().get_tenant_identity(&user), None);
    }

    #[test]
    fn tenant_identity_from_identifier() {
        let resolver = IdentityResolver::new().with_tenant_identifier(Arc::new(|user: &User| {
            user.field("tenant").unwrap_or_default().to_string()
        }));
        let user = User::new(json!({"tenant": "acme"}));
        assert_eq!(resolver.get_tenant_identity(&user), Some("acme".to_string()));
    }
}
