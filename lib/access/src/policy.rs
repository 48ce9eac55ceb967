//! The authorization gate.

use async_trait::async_trait;
use rootcause::prelude::Report;
use serde_json::Value as JsonValue;
use simple_auth_core::{AuthError, User};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Host-supplied policy deciding whether a user may perform an action.
///
/// Plain closures `Fn(&User, &str, Option<&JsonValue>) -> bool` implement
/// this trait; implement it directly for policies that need to await.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// Returns true if `user` may perform `action` on `subject`.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot reach a decision.
    async fn allows(
        &self,
        user: &User,
        action: &str,
        subject: Option<&JsonValue>,
    ) -> Result<bool, Report<AuthError>>;
}

#[async_trait]
impl<F> AccessPolicy for F
where
    F: Fn(&User, &str, Option<&JsonValue>) -> bool + Send + Sync,
{
    async fn allows(
        &self,
        user: &User,
        action: &str,
        subject: Option<&JsonValue>,
    ) -> Result<bool, Report<AuthError>> {
        Ok(self(user, action, subject))
    }
}

/// Validates authorization requests.
///
/// With no policy configured every request with a user and an action is
/// permitted. Hosts that need to deny by default must supply a policy.
#[derive(Clone, Default)]
pub struct AuthorizationGate {
    policy: Option<Arc<dyn AccessPolicy>>,
}

impl AuthorizationGate {
    /// Creates a gate with no policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gate that consults `policy`.
    #[must_use]
    pub fn with_policy(policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            policy: Some(policy),
        }
    }

    /// Returns true if a policy is configured.
    #[must_use]
    pub fn has_policy(&self) -> bool {
        self.policy.is_some()
    }

    /// Checks whether `user` may perform `action` on `subject`.
    ///
    /// A `null` user record counts as no user, and an empty action counts
    /// as no action.
    ///
    /// # Errors
    ///
    /// - `AuthError::Unauthorized` if there is no user
    /// - `AuthError::InvalidAction` if there is no action
    /// - `AuthError::Forbidden` if the policy denies the action
    /// - whatever the policy itself fails with
    #[instrument(skip(self, user, subject))]
    pub async fn can(
        &self,
        user: Option<&User>,
        action: Option<&str>,
        subject: Option<&JsonValue>,
    ) -> Result<(), Report<AuthError>> {
        let user = user
            .filter(|u| !u.as_json().is_null())
            .ok_or(AuthError::Unauthorized)?;
        let action = action
            .filter(|a| !a.is_empty())
            .ok_or(AuthError::InvalidAction)?;

        let Some(policy) = &self.policy else {
            return Ok(());
        };

        let allowed = policy.allows(user, action, subject).await?;
        debug!(allowed, "policy decision");
        if !allowed {
            return Err(AuthError::Forbidden {
                action: action.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> User {
        User::new(json!({"email": "a@b.com", "role": "editor"}))
    }

    fn role_policy(user: &User, action: &str, _subject: Option<&JsonValue>) -> bool {
        action == "read" || user.field("role") == Some("admin")
    }

    struct SubjectOwnerPolicy;

    #[async_trait]
    impl AccessPolicy for SubjectOwnerPolicy {
        async fn allows(
            &self,
            user: &User,
            _action: &str,
            subject: Option<&JsonValue>,
        ) -> Result<bool, Report<AuthError>> {
            let owner = subject.and_then(|s| s.get("owner")).and_then(JsonValue::as_str);
            Ok(owner.is_some() && owner == user.field("email"))
        }
    }

    struct BrokenPolicy;

    #[async_trait]
    impl AccessPolicy for BrokenPolicy {
        async fn allows(
            &self,
            _user: &User,
            _action: &str,
            _subject: Option<&JsonValue>,
        ) -> Result<bool, Report<AuthError>> {
            Err(AuthError::Network {
                reason: "policy service unreachable".to_string(),
            }
            .into())
        }
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let gate = AuthorizationGate::new();
        let err = gate.can(None, Some("read"), None).await.expect_err("no user");
        assert_eq!(err.current_context(), &AuthError::Unauthorized);

        let null_user = User::new(JsonValue::Null);
        let err = gate
            .can(Some(&null_user), Some("read"), None)
            .await
            .expect_err("null user");
        assert_eq!(err.current_context(), &AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn missing_action_is_invalid() {
        let gate = AuthorizationGate::new();
        let u = user();
        for action in [None, Some("")] {
            let err = gate.can(Some(&u), action, None).await.expect_err("no action");
            assert_eq!(err.current_context(), &AuthError::InvalidAction);
        }
    }

    #[tokio::test]
    async fn user_is_checked_before_action() {
        let gate = AuthorizationGate::new();
        let err = gate.can(None, None, None).await.expect_err("nothing");
        assert_eq!(err.current_context(), &AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn no_policy_permits() {
        let gate = AuthorizationGate::new();
        let u = user();
        gate.can(Some(&u), Some("delete"), Some(&json!({"id": 1})))
            .await
            .expect("fail-open without policy");
    }

    #[tokio::test]
    async fn closure_policy_decides() {
        let gate = AuthorizationGate::with_policy(Arc::new(role_policy));
        let u = user();

        gate.can(Some(&u), Some("read"), None).await.expect("read allowed");
        let err = gate
            .can(Some(&u), Some("delete"), None)
            .await
            .expect_err("delete denied");
        assert!(matches!(
            err.current_context(),
            AuthError::Forbidden { action } if action == "delete"
        ));
    }

    #[tokio::test]
    async fn deny_all_policy_always_forbids() {
        let gate =
            AuthorizationGate::with_policy(Arc::new(|_: &User, _: &str, _: Option<&JsonValue>| false));
        let u = user();
        for action in ["read", "write", "delete"] {
            let err = gate.can(Some(&u), Some(action), None).await.expect_err("denied");
            assert!(matches!(err.current_context(), AuthError::Forbidden { .. }));
        }
    }

    #[tokio::test]
    async fn policy_sees_subject() {
        let gate = AuthorizationGate::with_policy(Arc::new(SubjectOwnerPolicy));
        let u = user();

        gate.can(Some(&u), Some("edit"), Some(&json!({"owner": "a@b.com"})))
            .await
            .expect("owner allowed");
        gate.can(Some(&u), Some("edit"), Some(&json!({"owner": "c@d.com"})))
            .await
            .expect_err("non-owner denied");
        gate.can(Some(&u), Some("edit"), None)
            .await
            .expect_err("no subject denied");
    }

    #[tokio::test]
    async fn policy_errors_propagate() {
        let gate = AuthorizationGate::with_policy(Arc::new(BrokenPolicy));
        let u = user();
        let err = gate.can(Some(&u), Some("read"), None).await.expect_err("broken");
        assert!(matches!(err.current_context(), AuthError::Network { .. }));
    }
}
