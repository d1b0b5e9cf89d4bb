//! Main tracker orchestration
//!
//! Owns the logged-in user's in-memory tasks and tag palette, keeps them
//! persisted through the data store, and exposes the export/import surface
//! of the encrypted snapshot sync.

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ChronoError, Result};
use crate::snapshot::{Snapshot, TagDefinition, Task};
use crate::stats::{self, Period, TagTotal};
use crate::store::DataStore;
use crate::sync;

/// Color cycle for auto-registered tags
const DEFAULT_COLORS: [&str; 8] = [
    "#0ea5e9", "#10b981", "#f97316", "#8b5cf6", "#ec4899", "#f59e0b", "#3b82f6", "#6366f1",
];

/// A task as entered by the user, before an id is assigned
#[derive(Debug, Clone)]
pub struct NewTask {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub description: String,
    pub tag: String,
    pub image_url: Option<String>,
}

/// Tracker orchestrating the store, the active user, and sync
pub struct Tracker {
    /// Storage backend
    store: DataStore,
    /// Logged-in user, if any
    owner: Option<String>,
    /// Active user's tasks, insertion order
    tasks: Vec<Task>,
    /// Active user's tag palette
    tags: Vec<TagDefinition>,
}

impl Tracker {
    /// Create a tracker over the default data store
    pub fn new() -> Result<Self> {
        Ok(Self::with_store(DataStore::new()?))
    }

    /// Create a tracker over a custom store (for testing)
    pub fn with_store(store: DataStore) -> Self {
        Self {
            store,
            owner: None,
            tasks: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Resume the previously active user, if one is recorded
    pub async fn resume(&mut self) -> Result<Option<String>> {
        match self.store.current_user().await? {
            Some(owner) => {
                self.login(&owner).await?;
                Ok(Some(owner))
            }
            None => Ok(None),
        }
    }

    /// Log in as `name` and load that user's data.
    ///
    /// Tasks referencing tags missing from the palette get the next default
    /// palette color, so older data picks up colors on first load.
    pub async fn login(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChronoError::InvalidUserName);
        }

        self.tasks = self.store.load_tasks(name).await?;
        self.tags = self.store.load_tags(name).await?;
        self.owner = Some(name.to_string());
        self.store.set_current_user(Some(name)).await?;

        let migrated = self.register_missing_tags();
        if migrated {
            self.store.save_tags(name, &self.tags).await?;
        }

        info!("Logged in as {}", name);
        Ok(())
    }

    /// Log out and clear in-memory state
    pub async fn logout(&mut self) -> Result<()> {
        self.store.set_current_user(None).await?;
        self.owner = None;
        self.tasks.clear();
        self.tags.clear();

        info!("Logged out");
        Ok(())
    }

    /// The logged-in user, if any
    pub fn current_user(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// All tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The tag palette
    pub fn tags(&self) -> &[TagDefinition] {
        &self.tags
    }

    fn require_login(&self) -> Result<&str> {
        self.owner.as_deref().ok_or(ChronoError::NotLoggedIn)
    }

    /// Add a task, assigning it a fresh id. Unknown tags are auto-registered
    /// with the next default color. Returns the new task's id.
    pub async fn add_task(&mut self, new: NewTask) -> Result<String> {
        self.require_login()?;

        let task = Task {
            id: Uuid::new_v4().to_string(),
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            description: new.description,
            tag: new.tag,
            image_url: new.image_url,
        };
        let id = task.id.clone();

        self.register_tag(&task.tag);
        self.tasks.push(task);
        self.persist().await?;

        debug!("Added task {}", id);
        Ok(id)
    }

    /// Replace an existing task (matched by id)
    pub async fn update_task(&mut self, updated: Task) -> Result<()> {
        self.require_login()?;

        let tag = updated.tag.clone();
        let slot = self
            .tasks
            .iter_mut()
            .find(|t| t.id == updated.id)
            .ok_or_else(|| ChronoError::TaskNotFound(updated.id.clone()))?;
        *slot = updated;

        self.register_tag(&tag);
        self.persist().await?;
        Ok(())
    }

    /// Delete a task by id
    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        self.require_login()?;

        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Err(ChronoError::TaskNotFound(id.to_string()));
        }

        self.persist().await?;
        debug!("Deleted task {}", id);
        Ok(())
    }

    /// Tasks on the given ISO date, sorted by start time
    pub fn tasks_for_date(&self, date: &str) -> Vec<Task> {
        let mut matching: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.date == date)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        matching
    }

    /// Rename a tag, cascading through every task that uses it
    pub async fn rename_tag(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        self.require_login()?;

        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ChronoError::InvalidTagName);
        }
        if new_name == old_name {
            return Ok(());
        }
        if self.tags.iter().any(|t| t.name == new_name) {
            return Err(ChronoError::TagExists(new_name.to_string()));
        }

        let tag = self
            .tags
            .iter_mut()
            .find(|t| t.name == old_name)
            .ok_or_else(|| ChronoError::TagNotFound(old_name.to_string()))?;
        tag.name = new_name.to_string();

        for task in self.tasks.iter_mut().filter(|t| t.tag == old_name) {
            task.tag = new_name.to_string();
        }

        self.persist().await?;
        debug!("Renamed tag {} -> {}", old_name, new_name);
        Ok(())
    }

    /// Change a tag's display color
    pub async fn set_tag_color(&mut self, name: &str, color: &str) -> Result<()> {
        self.require_login()?;

        let tag = self
            .tags
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| ChronoError::TagNotFound(name.to_string()))?;
        tag.color = color.to_string();

        self.persist().await?;
        Ok(())
    }

    /// Remove a tag from the palette. Refused while any task still uses it.
    pub async fn delete_tag(&mut self, name: &str) -> Result<()> {
        self.require_login()?;

        if self.tasks.iter().any(|t| t.tag == name) {
            return Err(ChronoError::TagInUse(name.to_string()));
        }

        let before = self.tags.len();
        self.tags.retain(|t| t.name != name);
        if self.tags.len() == before {
            return Err(ChronoError::TagNotFound(name.to_string()));
        }

        self.persist().await?;
        Ok(())
    }

    /// Per-tag minute totals for the bucket containing `reference`
    pub fn stats(&self, period: Period, reference: chrono::NaiveDate) -> Result<Vec<TagTotal>> {
        stats::tag_totals(&self.tasks, period, reference)
    }

    /// Encrypt the current dataset into a portable sync code
    pub fn export_sync_code(&self, password: &str) -> Result<String> {
        let owner = self.require_login()?;

        let snapshot = Snapshot::new(owner, self.tasks.clone(), self.tags.clone());
        let code = sync::encode(&snapshot, password)?;

        info!("Exported sync code for {}", owner);
        Ok(code)
    }

    /// Decrypt a sync code and replace all local data with its contents.
    ///
    /// Full overwrite, no merge: the imported owner becomes the active user
    /// and their previous local tasks and tags are discarded. Nothing is
    /// modified if decoding fails.
    pub async fn import_sync_code(&mut self, code: &str, password: &str) -> Result<()> {
        let snapshot = sync::decode(code, password)?;

        self.store.replace_dataset(&snapshot).await?;
        self.owner = Some(snapshot.owner);
        self.tasks = snapshot.tasks;
        self.tags = snapshot.tags;

        info!(
            "Imported snapshot: {} tasks, {} tags",
            self.tasks.len(),
            self.tags.len()
        );
        Ok(())
    }

    /// Register `tag` with the next default color if it is not in the palette
    fn register_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t.name == tag) {
            let color = DEFAULT_COLORS[self.tags.len() % DEFAULT_COLORS.len()];
            self.tags.push(TagDefinition {
                name: tag.to_string(),
                color: color.to_string(),
            });
        }
    }

    /// One-time migration: give palette colors to tags that exist only on
    /// tasks. Returns whether anything changed.
    fn register_missing_tags(&mut self) -> bool {
        let missing: Vec<String> = self
            .tasks
            .iter()
            .map(|t| t.tag.clone())
            .filter(|tag| !self.tags.iter().any(|t| &t.name == tag))
            .collect();

        let mut changed = false;
        for tag in missing {
            if !self.tags.iter().any(|t| t.name == tag) {
                let color = DEFAULT_COLORS[self.tags.len() % DEFAULT_COLORS.len()];
                self.tags.push(TagDefinition {
                    name: tag,
                    color: color.to_string(),
                });
                changed = true;
            }
        }
        changed
    }

    async fn persist(&self) -> Result<()> {
        let owner = self.require_login()?;
        self.store.save_tasks(owner, &self.tasks).await?;
        self.store.save_tags(owner, &self.tags).await?;
        Ok(())
    }
}
