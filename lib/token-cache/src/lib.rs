//! Session token cache for simple-auth.
//!
//! A token lives in one of two storage tiers:
//! - the persistent tier survives process restarts ("remember me")
//! - the ephemeral tier lasts only as long as the current session
//!
//! Reads prefer the persistent tier so a "remember me" login is never
//! masked by a stale session-only entry.

mod cache;
mod store;

pub use cache::{CacheEntry, StorageTier, TokenCache};
pub use store::{FileStore, MemoryStore, TokenStore};
