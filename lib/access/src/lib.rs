//! Authorization and identity for simple-auth.
//!
//! - `AuthorizationGate`: validates a (user, action, subject) triple against
//!   an optional host-supplied `AccessPolicy`
//! - `IdentityResolver`: derives a display identity and an optional tenant
//!   identity from an opaque user record
//!
//! # Example
//!
//! ```
//! use simple_auth_access::{AuthorizationGate, IdentityResolver};
//! use simple_auth_core::User;
//! use serde_json::json;
//!
//! let user = User::new(json!({"fullname": "Ada Lovelace", "email": "ada@example.com"}));
//! assert_eq!(IdentityResolver::new().get_identity(&user), "Ada Lovelace");
//!
//! // Without a policy every present user/action pair is permitted.
//! let gate = AuthorizationGate::new();
//! assert!(!gate.has_policy());
//! ```

mod identity;
mod policy;

pub use identity::{IdentityExtractor, IdentityResolver};
pub use policy::{AccessPolicy, AuthorizationGate};
