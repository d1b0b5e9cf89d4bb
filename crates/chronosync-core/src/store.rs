//! Per-user data persistence
//!
//! Stores each user's tasks and tag palette as plain JSON files in the
//! platform data directory, plus a marker file naming the active user.
//! Sensitive material never lands here: sync codes are produced on demand
//! and handed to the caller, not persisted.

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ChronoError, Result};
use crate::snapshot::{Snapshot, TagDefinition, Task};

/// Per-user JSON file storage
pub struct DataStore {
    /// Directory for storage files
    data_dir: PathBuf,
}

impl DataStore {
    /// Create a store rooted at the platform data directory
    pub fn new() -> Result<Self> {
        let data_dir = Self::default_data_dir()?;
        std::fs::create_dir_all(&data_dir)?;

        debug!("Data store initialized at: {:?}", data_dir);

        Ok(Self { data_dir })
    }

    /// Create with a custom data directory (for testing)
    pub fn with_dir(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn default_data_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "chronosync", "chronosync")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                ChronoError::StorageError("Could not determine data directory".to_string())
            })
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    // Owner names land in filenames; anything outside [A-Za-z0-9_-] becomes '_'
    fn file_key(owner: &str) -> String {
        owner
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn tasks_path(&self, owner: &str) -> PathBuf {
        self.data_dir
            .join(format!("tasks_{}.json", Self::file_key(owner)))
    }

    fn tags_path(&self, owner: &str) -> PathBuf {
        self.data_dir
            .join(format!("tags_{}.json", Self::file_key(owner)))
    }

    fn user_path(&self) -> PathBuf {
        self.data_dir.join("user.json")
    }

    /// Load a user's tasks; a missing file reads as an empty list
    pub async fn load_tasks(&self, owner: &str) -> Result<Vec<Task>> {
        read_json_or_default(&self.tasks_path(owner)).await
    }

    /// Persist a user's tasks
    pub async fn save_tasks(&self, owner: &str, tasks: &[Task]) -> Result<()> {
        write_json(&self.tasks_path(owner), &tasks).await?;
        debug!("Saved {} tasks for {}", tasks.len(), owner);
        Ok(())
    }

    /// Load a user's tag palette; a missing file reads as an empty list
    pub async fn load_tags(&self, owner: &str) -> Result<Vec<TagDefinition>> {
        read_json_or_default(&self.tags_path(owner)).await
    }

    /// Persist a user's tag palette
    pub async fn save_tags(&self, owner: &str, tags: &[TagDefinition]) -> Result<()> {
        write_json(&self.tags_path(owner), &tags).await?;
        debug!("Saved {} tags for {}", tags.len(), owner);
        Ok(())
    }

    /// Get the active user, if any
    pub async fn current_user(&self) -> Result<Option<String>> {
        let path = self.user_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let owner: String = serde_json::from_str(&contents)?;
        Ok(Some(owner))
    }

    /// Set or clear the active user marker
    pub async fn set_current_user(&self, owner: Option<&str>) -> Result<()> {
        let path = self.user_path();
        match owner {
            Some(owner) => write_json(&path, &owner).await,
            None => {
                if path.exists() {
                    tokio::fs::remove_file(&path).await?;
                }
                Ok(())
            }
        }
    }

    /// Replace a user's entire persisted dataset with a decoded snapshot.
    ///
    /// This is the import-side full overwrite: existing tasks and tags for
    /// the snapshot's owner are discarded, and the owner becomes the active
    /// user.
    pub async fn replace_dataset(&self, snapshot: &Snapshot) -> Result<()> {
        self.save_tasks(&snapshot.owner, &snapshot.tasks).await?;
        self.save_tags(&snapshot.owner, &snapshot.tags).await?;
        self.set_current_user(Some(&snapshot.owner)).await?;

        debug!(
            "Replaced dataset for {}: {} tasks, {} tags",
            snapshot.owner,
            snapshot.tasks.len(),
            snapshot.tags.len()
        );
        Ok(())
    }
}

async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write atomically using a temp file
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, &contents).await?;
    tokio::fs::rename(&temp_path, path).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (DataStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = DataStore::with_dir(temp_dir.path().to_path_buf()).unwrap();
        (store, temp_dir)
    }

    fn sample_task() -> Task {
        Task {
            id: "t1".to_string(),
            date: "2024-01-01".to_string(),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            description: "Write report".to_string(),
            tag: "Work".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_tasks_roundtrip() {
        let (store, _temp) = test_store();
        let tasks = vec![sample_task()];

        store.save_tasks("alice", &tasks).await.unwrap();
        let loaded = store.load_tasks("alice").await.unwrap();

        assert_eq!(loaded, tasks);
    }

    #[tokio::test]
    async fn test_missing_files_read_as_empty() {
        let (store, _temp) = test_store();

        assert!(store.load_tasks("nobody").await.unwrap().is_empty());
        assert!(store.load_tags("nobody").await.unwrap().is_empty());
        assert_eq!(store.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let (store, _temp) = test_store();

        store.save_tasks("alice", &[sample_task()]).await.unwrap();
        assert!(store.load_tasks("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_current_user_set_and_clear() {
        let (store, _temp) = test_store();

        store.set_current_user(Some("alice")).await.unwrap();
        assert_eq!(
            store.current_user().await.unwrap(),
            Some("alice".to_string())
        );

        store.set_current_user(None).await.unwrap();
        assert_eq!(store.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_replace_dataset_overwrites() {
        let (store, _temp) = test_store();

        store.save_tasks("alice", &[sample_task()]).await.unwrap();

        let incoming = Snapshot::new(
            "alice",
            vec![],
            vec![TagDefinition {
                name: "Focus".to_string(),
                color: "#10b981".to_string(),
            }],
        );
        store.replace_dataset(&incoming).await.unwrap();

        assert!(store.load_tasks("alice").await.unwrap().is_empty());
        assert_eq!(store.load_tags("alice").await.unwrap(), incoming.tags);
        assert_eq!(
            store.current_user().await.unwrap(),
            Some("alice".to_string())
        );
    }

    #[tokio::test]
    async fn test_awkward_owner_names_get_stable_files() {
        let (store, _temp) = test_store();

        store.save_tasks("weird user!", &[sample_task()]).await.unwrap();
        let loaded = store.load_tasks("weird user!").await.unwrap();

        assert_eq!(loaded.len(), 1);
    }
}
