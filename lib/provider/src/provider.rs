//! The authentication provider consumed by the host application.

use crate::config::ProviderConfig;
use crate::extract::{KeyExtractor, TokenParser, UserParser};
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde_json::{Value as JsonValue, json};
use simple_auth_access::{AccessPolicy, AuthorizationGate, IdentityExtractor, IdentityResolver};
use simple_auth_core::{AuthError, AuthPayload, AuthResult, Credentials, User};
use simple_auth_token_cache::{MemoryStore, TokenCache, TokenStore};
use simple_auth_transport::{HttpRequest, HttpTransport, RequestExecutor, ReqwestTransport};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The lifecycle operations a host application calls on an auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticates with credentials, caching the returned token in the
    /// persistent tier if `keep_logged`, else in the ephemeral tier.
    async fn login(
        &self,
        credentials: Credentials,
        keep_logged: bool,
    ) -> Result<AuthResult, Report<AuthError>>;

    /// Forgets the cached token.
    async fn logout(&self) -> Result<(), Report<AuthError>>;

    /// Restores the session from the cached token.
    async fn check_auth(&self) -> Result<AuthResult, Report<AuthError>>;

    /// Returns the display identity of `user`.
    async fn get_identity(&self, user: &User) -> String;

    /// Returns the tenant identity of `user`, if any.
    async fn get_tenant_identity(&self, user: &User) -> Option<String>;

    /// Checks whether `user` may perform `action` on `subject`.
    async fn can(
        &self,
        user: Option<&User>,
        action: Option<&str>,
        subject: Option<&JsonValue>,
    ) -> Result<(), Report<AuthError>>;
}

/// Authenticates against a JSON endpoint and caches the session token.
///
/// Credentials are POSTed to the login endpoint; cached tokens are POSTed
/// as bearer credentials to the session-check endpoint. In both cases the
/// user and a fresh token are extracted from the response and the token is
/// written back to the cache.
#[derive(Clone)]
pub struct SimpleAuthProvider {
    config: ProviderConfig,
    executor: RequestExecutor,
    cache: TokenCache,
    gate: AuthorizationGate,
    identity: IdentityResolver,
    user_parser: Arc<dyn UserParser>,
    token_parser: Arc<dyn TokenParser>,
}

impl SimpleAuthProvider {
    /// Creates a builder for a provider using `config`.
    #[must_use]
    pub fn builder(config: ProviderConfig) -> SimpleAuthProviderBuilder {
        SimpleAuthProviderBuilder::new(config)
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Returns the token cache.
    #[must_use]
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    #[instrument(skip(self, payload))]
    async fn perform_auth(
        &self,
        url: &str,
        keep_logged: bool,
        payload: Option<AuthPayload>,
    ) -> Result<AuthResult, Report<AuthError>> {
        let payload = payload
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::Unauthorized)?;

        let request = match &payload {
            AuthPayload::Bearer(token) => HttpRequest::post()
                .with_header("Authorization", token.bearer_header())
                .with_json_body(&json!({})),
            AuthPayload::Credentials(credentials) => HttpRequest::post()
                .with_json_body(&JsonValue::Object(credentials.as_map().clone())),
        };

        let response = self.executor.execute(url, request).await?;
        let user = self.user_parser.parse_user(&response)?;
        let token = self.token_parser.parse_token(&response)?;
        self.cache.write(&token, keep_logged).await?;

        Ok(AuthResult::new(user))
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    #[instrument(skip(self, credentials))]
    async fn login(
        &self,
        credentials: Credentials,
        keep_logged: bool,
    ) -> Result<AuthResult, Report<AuthError>> {
        let result = self
            .perform_auth(
                self.config.auth_url(),
                keep_logged,
                Some(AuthPayload::Credentials(credentials)),
            )
            .await?;
        info!("logged in");
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn logout(&self) -> Result<(), Report<AuthError>> {
        self.cache.remove().await?;
        info!("logged out");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn check_auth(&self) -> Result<AuthResult, Report<AuthError>> {
        let entry = self.cache.read().await?;
        debug!(persistent = entry.persistent, "checking cached session");
        self.perform_auth(
            self.config.check_url(),
            entry.persistent,
            entry.value.map(AuthPayload::Bearer),
        )
        .await
    }

    async fn get_identity(&self, user: &User) -> String {
        self.identity.get_identity(user)
    }

    async fn get_tenant_identity(&self, user: &User) -> Option<String> {
        self.identity.get_tenant_identity(user)
    }

    async fn can(
        &self,
        user: Option<&User>,
        action: Option<&str>,
        subject: Option<&JsonValue>,
    ) -> Result<(), Report<AuthError>> {
        self.gate.can(user, action, subject).await
    }
}

/// Builder for `SimpleAuthProvider`.
///
/// Every collaborator is optional:
/// - transport: `ReqwestTransport`
/// - persistent tier: none
/// - ephemeral tier: an in-process `MemoryStore`
/// - user and token parsers: `KeyExtractor` on the configured keys
/// - identifier: full name, name, username, then email
/// - tenant identifier: none
/// - policy: none, so every request is permitted
pub struct SimpleAuthProviderBuilder {
    config: ProviderConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    persistent: Option<Arc<dyn TokenStore>>,
    ephemeral: Option<Arc<dyn TokenStore>>,
    user_parser: Option<Arc<dyn UserParser>>,
    token_parser: Option<Arc<dyn TokenParser>>,
    identifier: Option<Arc<dyn IdentityExtractor>>,
    tenant_identifier: Option<Arc<dyn IdentityExtractor>>,
    policy: Option<Arc<dyn AccessPolicy>>,
}

impl SimpleAuthProviderBuilder {
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            transport: None,
            persistent: None,
            ephemeral: None,
            user_parser: None,
            token_parser: None,
            identifier: None,
            tenant_identifier: None,
            policy: None,
        }
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn persistent_storage(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.persistent = Some(store);
        self
    }

    #[must_use]
    pub fn ephemeral_storage(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.ephemeral = Some(store);
        self
    }

    #[must_use]
    pub fn user_parser(mut self, parser: Arc<dyn UserParser>) -> Self {
        self.user_parser = Some(parser);
        self
    }

    #[must_use]
    pub fn token_parser(mut self, parser: Arc<dyn TokenParser>) -> Self {
        self.token_parser = Some(parser);
        self
    }

    #[must_use]
    pub fn identifier(mut self, identifier: Arc<dyn IdentityExtractor>) -> Self {
        self.identifier = Some(identifier);
        self
    }

    #[must_use]
    pub fn tenant_identifier(mut self, identifier: Arc<dyn IdentityExtractor>) -> Self {
        self.tenant_identifier = Some(identifier);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Builds the provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the configuration is invalid.
    pub fn build(self) -> Result<SimpleAuthProvider, Report<AuthError>> {
        self.config.validate()?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));
        let executor = RequestExecutor::new(transport)
            .with_policy(self.config.retry_policy())
            .with_timeout(self.config.timeout());

        let mut cache = TokenCache::new(self.config.token_cache_key()).with_ephemeral(
            self.ephemeral
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
        );
        if let Some(store) = self.persistent {
            cache = cache.with_persistent(store);
        }

        let gate = match self.policy {
            Some(policy) => AuthorizationGate::with_policy(policy),
            None => AuthorizationGate::new(),
        };

        let mut identity = IdentityResolver::new();
        if let Some(identifier) = self.identifier {
            identity = identity.with_identifier(identifier);
        }
        if let Some(identifier) = self.tenant_identifier {
            identity = identity.with_tenant_identifier(identifier);
        }

        let user_parser = self
            .user_parser
            .unwrap_or_else(|| Arc::new(KeyExtractor::new(self.config.user_key())));
        let token_parser = self
            .token_parser
            .unwrap_or_else(|| Arc::new(KeyExtractor::new(self.config.token_key())));

        Ok(SimpleAuthProvider {
            config: self.config,
            executor,
            cache,
            gate,
            identity,
            user_parser,
            token_parser,
        })
    }
}
