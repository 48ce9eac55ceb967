//! The simple-auth provider.
//!
//! `SimpleAuthProvider` ties together the retrying request executor, the
//! two-tier token cache, the authorization gate and the identity resolver
//! behind the `AuthProvider` trait consumed by host applications.
//!
//! ```no_run
//! use simple_auth_provider::{AuthProvider, Credentials, ProviderConfig, SimpleAuthProvider};
//!
//! # async fn run() -> Result<(), rootcause::prelude::Report<simple_auth_provider::AuthError>> {
//! let provider = SimpleAuthProvider::builder(
//!     ProviderConfig::builder("https://api.example.com/auth/login")
//!         .check_url("https://api.example.com/auth/me")
//!         .build(),
//! )
//! .build()?;
//!
//! let session = provider
//!     .login(Credentials::email_password("ada@example.com", "secret"), true)
//!     .await?;
//! println!("signed in as {}", provider.get_identity(&session.data).await);
//! # Ok(())
//! # }
//! ```

mod config;
mod extract;
mod provider;

pub use config::{ProviderConfig, ProviderConfigBuilder};
pub use extract::{KeyExtractor, TokenParser, UserParser};
pub use provider::{AuthProvider, SimpleAuthProvider, SimpleAuthProviderBuilder};

pub use simple_auth_access::{AccessPolicy, IdentityExtractor};
pub use simple_auth_core::{AuthError, AuthPayload, AuthResult, Credentials, Token, User};
pub use simple_auth_token_cache::{FileStore, MemoryStore, TokenStore};
pub use simple_auth_transport::{HttpTransport, ReqwestTransport};
