//! Core domain types and utilities for the simple-auth provider.
//!
//! This crate provides the foundational types shared by every layer of the
//! authentication pipeline: the error taxonomy surfaced to the host, the
//! opaque credential and token handles, and the opaque user record returned
//! by the remote auth endpoint.

pub mod error;
pub mod token;
pub mod user;

pub use error::AuthError;
pub use token::{AuthPayload, Credentials, Token};
pub use user::{AuthResult, User, UserProfile};
