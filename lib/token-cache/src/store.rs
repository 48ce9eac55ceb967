//! Storage backends for a single cache tier.

use async_trait::async_trait;
use rootcause::prelude::Report;
use simple_auth_core::{AuthError, Token};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Key-value storage for tokens.
///
/// Implementations must make each single-key operation atomic. Removing a
/// key that is not present is not an error.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the token stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Token>, Report<AuthError>>;

    /// Stores `token` under `key`, replacing any previous value.
    async fn set(&self, key: &str, token: &Token) -> Result<(), Report<AuthError>>;

    /// Removes the token stored under `key`.
    async fn remove(&self, key: &str) -> Result<(), Report<AuthError>>;
}

/// In-process storage, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Token>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Token>, Report<AuthError>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, token: &Token) -> Result<(), Report<AuthError>> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), token.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Report<AuthError>> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON file, surviving process restarts.
///
/// The whole file is rewritten on every change through a sibling temporary
/// file and a rename, so readers never observe a half-written file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store persisting to `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, Token>, Report<AuthError>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(storage_error(&self.path, &e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| storage_error(&self.path, &e))
    }

    async fn save(&self, entries: &BTreeMap<String, Token>) -> Result<(), Report<AuthError>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_error(parent, &e))?;
            }
        }

        let bytes = serde_json::to_vec(entries).map_err(|e| storage_error(&self.path, &e))?;
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &bytes)
            .await
            .map_err(|e| storage_error(&tmp, &e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, &e))?;

        debug!(path = %self.path.display(), entries = entries.len(), "token file written");
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Token>, Report<AuthError>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, token: &Token) -> Result<(), Report<AuthError>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), token.clone());
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), Report<AuthError>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

/// Writes `bytes` to `path`, readable and writable by the owner only.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    // A leftover file from an interrupted write keeps its old mode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    file.write_all(bytes).await?;
    file.sync_all().await
}

fn storage_error(path: &Path, error: &dyn std::fmt::Display) -> Report<AuthError> {
    AuthError::Storage {
        reason: format!("{}: {error}", path.display()),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.expect("get"), None);

        store.set("k", &Token::new("t1")).await.expect("set");
        assert_eq!(store.get("k").await.expect("get"), Some(Token::new("t1")));

        store.remove("k").await.expect("remove");
        assert_eq!(store.get("k").await.expect("get"), None);
    }

    #[tokio::test]
    async fn memory_store_remove_missing_is_ok() {
        let store = MemoryStore::new();
        store.remove("missing").await.expect("remove");
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("auth").join("tokens.json");

        FileStore::new(&path)
            .set("rb-auth-token", &Token::new("t1"))
            .await
            .expect("set");

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("rb-auth-token").await.expect("get"),
            Some(Token::new("t1"))
        );
    }

    #[tokio::test]
    async fn file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("tokens.json"));

        store.set("a", &Token::new("1")).await.expect("set a");
        store.set("b", &Token::new("2")).await.expect("set b");
        store.remove("a").await.expect("remove a");

        assert_eq!(store.get("a").await.expect("get a"), None);
        assert_eq!(store.get("b").await.expect("get b"), Some(Token::new("2")));
    }

    #[tokio::test]
    async fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("absent.json"));

        assert_eq!(store.get("k").await.expect("get"), None);
        store.remove("k").await.expect("remove");
        assert!(!store.path().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tokens.json");
        // Stale temp file from an earlier interrupted write.
        std::fs::write(path.with_extension("tmp"), b"{}").expect("write");
        std::fs::set_permissions(
            path.with_extension("tmp"),
            std::fs::Permissions::from_mode(0o644),
        )
        .expect("chmod");

        FileStore::new(&path)
            .set("rb-auth-token", &Token::new("secret"))
            .await
            .expect("set");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn file_store_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"not json").expect("write");

        let err = FileStore::new(&path).get("k").await.expect_err("corrupt");
        assert!(matches!(err.current_context(), AuthError::Storage { .. }));
    }
}
