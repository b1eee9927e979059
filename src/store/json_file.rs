use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::{fs, sync::Mutex};

use super::{insert_unique, NewUser, User, UserStore};
use crate::error::StoreError;

/// User store backed by a single JSON file.
///
/// The file holds the whole collection as a JSON array. Every operation
/// loads it in full and every mutation rewrites it in full. One async mutex
/// covers each load/mutate/save sequence, so two registrations can never
/// interleave their read and write halves.
pub struct JsonFileUserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileUserStore {
    /// Open the store at `path`, creating the file (and its directory)
    /// with an empty collection if it does not exist yet.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };

        let users = {
            let _guard = store.lock.lock().await;
            store.load().await?
        };
        tracing::info!(
            path = %store.path.display(),
            users = users.len(),
            "User store opened"
        );

        Ok(store)
    }

    fn unavailable(&self, action: &str, err: impl std::fmt::Display) -> StoreError {
        StoreError::Unavailable(format!("{} {}: {}", action, self.path.display(), err))
    }

    async fn load(&self) -> Result<Vec<User>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| self.unavailable("parse", e)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "User file missing, initializing empty store");
                self.save(&[]).await?;
                Ok(Vec::new())
            }
            Err(e) => Err(self.unavailable("read", e)),
        }
    }

    /// Write through a sibling temp file and rename it into place, so a
    /// crash mid-write never leaves a truncated collection behind.
    async fn save(&self, users: &[User]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.unavailable("create directory for", e))?;
        }

        let data = serde_json::to_vec_pretty(users).map_err(|e| self.unavailable("serialize", e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, data).await.map_err(|e| self.unavailable("write", e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.unavailable("replace", e))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let _guard = self.lock.lock().await;
        let users = self.load().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let _guard = self.lock.lock().await;
        let users = self.load().await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let _guard = self.lock.lock().await;
        let mut users = self.load().await?;
        let created = insert_unique(&mut users, user)?;
        self.save(&users).await?;

        tracing::debug!(user_id = created.id, total = users.len(), "User persisted");
        Ok(created)
    }
}
