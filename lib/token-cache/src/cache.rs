//! The two-tier token cache.

use crate::store::TokenStore;
use rootcause::prelude::Report;
use simple_auth_core::{AuthError, Token};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Which storage tier holds a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    /// Survives restarts.
    Persistent,
    /// Scoped to the current session.
    Ephemeral,
}

impl StorageTier {
    /// Maps a "keep me logged in" flag to a tier.
    #[must_use]
    pub fn from_keep_logged(keep_logged: bool) -> Self {
        if keep_logged {
            Self::Persistent
        } else {
            Self::Ephemeral
        }
    }

    /// Returns the tier name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::Ephemeral => "ephemeral",
        }
    }
}

impl fmt::Display for StorageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of a cache read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheEntry {
    /// The cached token, if any.
    pub value: Option<Token>,
    /// True if the value came from the persistent tier.
    pub persistent: bool,
}

impl CacheEntry {
    /// Returns the tier the value was read from, if there is a value.
    #[must_use]
    pub fn tier(&self) -> Option<StorageTier> {
        self.value
            .as_ref()
            .map(|_| StorageTier::from_keep_logged(self.persistent))
    }
}

/// Reads, writes, and removes the session token under a fixed key.
///
/// Either tier may be left unconfigured: writes to a missing tier are
/// dropped and reads skip it. Writing to one tier leaves the other tier
/// untouched.
#[derive(Clone)]
pub struct TokenCache {
    key: String,
    persistent: Option<Arc<dyn TokenStore>>,
    ephemeral: Option<Arc<dyn TokenStore>>,
}

impl TokenCache {
    /// Creates a cache with no tiers configured.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            persistent: None,
            ephemeral: None,
        }
    }

    /// Sets the persistent tier.
    #[must_use]
    pub fn with_persistent(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.persistent = Some(store);
        self
    }

    /// Sets the ephemeral tier.
    #[must_use]
    pub fn with_ephemeral(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.ephemeral = Some(store);
        self
    }

    /// Returns the storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn store(&self, tier: StorageTier) -> Option<&Arc<dyn TokenStore>> {
        match tier {
            StorageTier::Persistent => self.persistent.as_ref(),
            StorageTier::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    /// Stores `token` in the persistent tier if `persistent`, else in the
    /// ephemeral tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    #[instrument(skip(self, token), fields(key = %self.key))]
    pub async fn write(&self, token: &Token, persistent: bool) -> Result<(), Report<AuthError>> {
        let tier = StorageTier::from_keep_logged(persistent);
        match self.store(tier) {
            Some(store) => {
                store.set(&self.key, token).await?;
                debug!(%tier, "token cached");
            }
            None => debug!(%tier, "tier not configured, token not cached"),
        }
        Ok(())
    }

    /// Reads the token, preferring the persistent tier.
    ///
    /// # Errors
    ///
    /// Returns an error if a backing store fails.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn read(&self) -> Result<CacheEntry, Report<AuthError>> {
        for tier in [StorageTier::Persistent, StorageTier::Ephemeral] {
            let Some(store) = self.store(tier) else {
                continue;
            };
            if let Some(token) = store.get(&self.key).await? {
                debug!(%tier, "cached token found");
                return Ok(CacheEntry {
                    value: Some(token),
                    persistent: tier == StorageTier::Persistent,
                });
            }
        }

        debug!("no cached token");
        Ok(CacheEntry::default())
    }

    /// Removes the token from every configured tier.
    ///
    /// # Errors
    ///
    /// Returns an error if a backing store fails.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn remove(&self) -> Result<(), Report<AuthError>> {
        if let Some(store) = &self.ephemeral {
            store.remove(&self.key).await?;
        }
        if let Some(store) = &self.persistent {
            store.remove(&self.key).await?;
        }
        debug!("cached token removed");
        Ok(())
    }
}
