use evently_app_primitives::DEFAULT_FORM_TITLE;
use evently_document_store::MAX_BATCH_OPERATIONS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::SyncEngine`]
///
/// Missing fields fall back to their defaults when deserialized.
///
/// ```rust
/// # use evently_state_machine::EngineConfig;
/// let config = EngineConfig::from_json(r#"{"debounceWindowMs": 250}"#).unwrap();
/// assert_eq!(config.debounce_window().as_millis(), 250);
/// assert_eq!(config.default_form_title, "Untitled Form");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Quiet period before a debounced edit is persisted
    pub debounce_window_ms: u64,
    /// Writes per batch during cascades, clamped to the store ceiling
    pub batch_size: usize,
    /// Title given to forms created without one
    pub default_form_title: String,
    /// Buffered user notifications before the oldest is dropped
    pub notification_capacity: usize,
    /// Reject answers whose question id is not on the cached form
    pub validate_answers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: 800,
            batch_size: MAX_BATCH_OPERATIONS,
            default_form_title: DEFAULT_FORM_TITLE.to_string(),
            notification_capacity: 64,
            validate_answers: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(2, MAX_BATCH_OPERATIONS)
    }
}
