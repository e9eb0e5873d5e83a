//! Durable bearer-token storage
//!
//! The token lives in memory behind a lock and is mirrored to a single file
//! so a restarted client can resume its session. File writes are best-effort:
//! when the disk copy cannot be updated the in-memory token still changes, so
//! the running client keeps working and only persistence degrades.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Stores the bearer token in memory and mirrors it to disk
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    token: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    /// Open the store, loading any token previously saved at `path`
    ///
    /// A missing file means no stored credential; other read errors are
    /// propagated so a corrupt credential location is visible at startup.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let token = match read_token(&path) {
            Ok(token) => token,
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            path,
            token: Arc::new(RwLock::new(token)),
        })
    }

    /// Current token, if any
    pub async fn get(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Whether a token is currently held
    pub async fn is_present(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Replace the stored token
    pub async fn set(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());

        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(error = %e, path = %parent.display(), "could not create credential directory");
                return;
            }
        }
        match tokio::fs::write(&self.path, token).await {
            Ok(()) => debug!(path = %self.path.display(), "credential saved"),
            Err(e) => warn!(error = %e, path = %self.path.display(), "could not save credential"),
        }
    }

    /// Forget the stored token
    pub async fn clear(&self) {
        *self.token.write().await = None;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "credential removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, path = %self.path.display(), "could not remove credential"),
        }
    }
}

fn read_token(path: &Path) -> io::Result<Option<String>> {
    let contents = std::fs::read_to_string(path)?;
    let token = contents.trim();
    if token.is_empty() {
        Ok(None)
    } else {
        Ok(Some(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_token_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");

        let store = CredentialStore::open(&path).unwrap();
        assert!(!store.is_present().await);

        store.set("tok-123").await;
        assert_eq!(store.get().await.as_deref(), Some("tok-123"));

        let reopened = CredentialStore::open(&path).unwrap();
        assert_eq!(reopened.get().await.as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_clear_removes_token_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");

        let store = CredentialStore::open(&path).unwrap();
        store.set("tok-123").await;
        store.clear().await;
        assert!(!store.is_present().await);

        // second clear has nothing to remove
        store.clear().await;
        assert!(!store.is_present().await);

        let reopened = CredentialStore::open(&path).unwrap();
        assert!(!reopened.is_present().await);
    }

    #[test]
    fn test_open_works_outside_a_runtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "tok-sync").unwrap();

        // Construction is synchronous; only the accessors need a runtime.
        let store = CredentialStore::open(&path).unwrap();
        assert_eq!(tokio_test::block_on(store.get()).as_deref(), Some("tok-sync"));
    }

    #[tokio::test]
    async fn test_blank_file_counts_as_no_credential() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();

        let store = CredentialStore::open(&path).unwrap();
        assert!(!store.is_present().await);
    }

    #[tokio::test]
    async fn test_set_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("token");

        let store = CredentialStore::open(&path).unwrap();
        store.set("tok-456").await;

        let reopened = CredentialStore::open(&path).unwrap();
        assert_eq!(reopened.get().await.as_deref(), Some("tok-456"));
    }
}
