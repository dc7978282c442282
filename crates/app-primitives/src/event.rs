//! Events, the owned roots of the form/response tree

use serde::{Deserialize, Serialize};

use crate::identity::{EventId, IdentityId};

/// An occasion owned by exactly one creator identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub creator_id: IdentityId,
    /// Unix milliseconds
    pub created_at: u64,
    /// Unix milliseconds
    pub updated_at: u64,
    /// Maintained by increments, may drift from the true count
    #[serde(default)]
    pub form_count: i64,
    /// Maintained by increments, may drift from the true count
    #[serde(default)]
    pub response_count: i64,
}

/// Content for creating an event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl NewEvent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Individual event update operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventUpdate {
    /// Update the title
    Title(String),
    /// Update the description
    Description(String),
}

impl Event {
    /// Build a fresh event with zeroed counters
    pub fn create(id: EventId, creator_id: IdentityId, content: NewEvent, now: u64) -> Self {
        Self {
            id,
            title: content.title,
            description: content.description,
            creator_id,
            created_at: now,
            updated_at: now,
            form_count: 0,
            response_count: 0,
        }
    }

    pub fn apply_update(&mut self, update: EventUpdate) {
        match update {
            EventUpdate::Title(title) => self.title = title,
            EventUpdate::Description(description) => self.description = description,
        }
    }

    /// Apply all updates in order and return the merged copy
    pub fn with_updates(mut self, updates: impl IntoIterator<Item = EventUpdate>) -> Self {
        for update in updates {
            self.apply_update(update);
        }
        self
    }
}
