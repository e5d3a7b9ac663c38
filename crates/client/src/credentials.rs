//! Credential persistence between console runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use trackacademy_auth::Session;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store io error: {0}")]
    Io(String),

    #[error("credential store payload corrupt: {0}")]
    Corrupt(String),
}

/// Where the provider keeps its session between runs.
///
/// A failing store never blocks authentication; callers degrade to a
/// memory-only session and log the error.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, StoreError>;
    async fn save(&self, session: &Session) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Keeps the session for the lifetime of the process only.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    slot: Mutex<Option<Session>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        *self.slot.lock().await = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

/// Session persisted as a JSON file, by default under the platform config
/// directory.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's config directory. `None` when the platform
    /// exposes no such directory.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("trackacademy").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Session>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let session = serde_json::from_slice(&bytes)
                    .map_err(|error| StoreError::Corrupt(error.to_string()))?;
                Ok(Some(session))
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StoreError::Io(error.to_string())),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| StoreError::Io(error.to_string()))?;
        }
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|error| StoreError::Corrupt(error.to_string()))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|error| StoreError::Io(error.to_string()))?;
        debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(StoreError::Io(error.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use trackacademy_auth::{AuthUser, Session};
    use trackacademy_core::UserId;
    use uuid::Uuid;

    fn sample_session() -> Session {
        Session {
            access_token: "tok-file".into(),
            refresh_token: Some("ref-file".into()),
            user: AuthUser {
                id: UserId::from_uuid(Uuid::from_u128(7)),
                email: "coach@example.com".into(),
            },
            expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn file_store_round_trips_a_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().await.unwrap().is_none());

        let session = sample_session();
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        // Clearing an already-empty store is not an error.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_reports_rather_than_panics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let store = FileCredentialStore::new(&path);
        let error = store.load().await.unwrap_err();
        assert!(matches!(error, StoreError::Corrupt(_)), "got {error:?}");
    }

    #[tokio::test]
    async fn memory_store_round_trips_a_session() {
        let store = InMemoryCredentialStore::new();
        assert!(store.load().await.unwrap().is_none());

        let session = sample_session();
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
