//! JSON-file session store.
//!
//! Persists the whole session registry as one JSON document under a fixed
//! file name in the data directory -- the registry is read-modify-written
//! as a unit on every save (single-writer assumption; concurrent processes
//! can race and that is an accepted limitation of the design).
//!
//! Saves are all-or-nothing: the document is written to a sibling temp file
//! and renamed over the target, so a concurrent reader never observes a
//! partial write.

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use evoke_core::session::store::SessionStore;
use evoke_types::error::StoreError;
use evoke_types::session::{Session, SessionRegistry};

/// Fixed storage key for the registry document.
pub const STORAGE_FILE: &str = "chat_sessions.json";

/// File-backed implementation of `SessionStore`.
pub struct JsonFileSessionStore {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl JsonFileSessionStore {
    /// Create a store rooted at `data_dir`. The directory is created on
    /// first save.
    pub fn new(data_dir: &Path) -> Self {
        let path = data_dir.join(STORAGE_FILE);
        let tmp_path = data_dir.join(format!("{STORAGE_FILE}.tmp"));
        Self { path, tmp_path }
    }

    /// Path of the registry document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileSessionStore {
    async fn load(&self) -> Result<SessionRegistry, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no registry document, starting empty");
                return Ok(SessionRegistry::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, registry: &SessionRegistry) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(registry)?;
        tokio::fs::write(&self.tmp_path, &bytes).await?;
        tokio::fs::rename(&self.tmp_path, &self.path).await?;
        debug!(
            path = %self.path.display(),
            sessions = registry.len(),
            "registry persisted"
        );
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Session>, StoreError> {
        let registry = self.load().await?;
        Ok(registry.get(id).cloned())
    }
}
