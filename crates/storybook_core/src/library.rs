//! crates/storybook_core/src/library.rs
//!
//! The local library of saved stories, kept as one serialized list.

use crate::domain::{SavedStory, Story};
use crate::ports::{KeyValueStorage, PortError, PortResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key of the saved-story list.
pub const LIBRARY_KEY: &str = "savedStories";

#[derive(Clone)]
pub struct LibraryStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl LibraryStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// All saved stories in the order they were saved.
    ///
    /// A missing or unreadable list is an empty library.
    pub async fn list(&self) -> PortResult<Vec<SavedStory>> {
        let Some(raw) = self.storage.get(LIBRARY_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(stories) => Ok(stories),
            Err(e) => {
                warn!("Saved stories could not be read, starting empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn get(&self, id: &str) -> PortResult<Option<SavedStory>> {
        Ok(self.list().await?.into_iter().find(|s| s.story.id == id))
    }

    /// Like `get`, but an unknown id is a `NotFound` error.
    pub async fn require(&self, id: &str) -> PortResult<SavedStory> {
        self.get(id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("No saved story with id '{}'", id)))
    }

    /// Appends a story stamped with the current time.
    pub async fn save(&self, story: Story) -> PortResult<SavedStory> {
        let mut stories = self.list().await?;
        let saved = SavedStory {
            story,
            saved_at: Utc::now(),
        };
        stories.push(saved.clone());
        self.write(&stories).await?;
        info!(story_id = %saved.story.id, "Story saved to the library.");
        Ok(saved)
    }

    /// Removes every saved entry with this id. Unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> PortResult<()> {
        let mut stories = self.list().await?;
        let before = stories.len();
        stories.retain(|s| s.story.id != id);
        if stories.len() == before {
            return Ok(());
        }
        self.write(&stories).await?;
        info!(story_id = id, "Story removed from the library.");
        Ok(())
    }

    async fn write(&self, stories: &[SavedStory]) -> PortResult<()> {
        let raw =
            serde_json::to_string(stories).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.storage.set(LIBRARY_KEY, raw).await
    }
}
