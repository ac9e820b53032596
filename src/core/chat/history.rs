//! Recent outgoing messages, kept for quick reuse.
//!
//! The log lives under a single storage key as a JSON array, newest first,
//! and is rewritten in full on every insert.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::storage::{KeyValueStore, StorageError};

pub const DEFAULT_HISTORY_KEY: &str = "chatHistory";
pub const HISTORY_CAPACITY: usize = 50;
pub const HISTORY_DISPLAY_LIMIT: usize = 10;
pub const HISTORY_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub session: String,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// First 50 characters of `message`, with `...` appended when anything was
/// cut.
pub fn preview(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(HISTORY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub struct HistoryLog {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl HistoryLog {
    pub fn new(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored log. A missing or unreadable value reads as empty.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "Could not read chat history");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_CAPACITY);
                entries
            }
            Err(err) => {
                warn!(error = %err, key = %self.key, "Discarding unreadable chat history");
                Vec::new()
            }
        }
    }

    /// Entries shown in the sidebar.
    pub fn recent(&self) -> Vec<HistoryEntry> {
        let mut entries = self.load();
        entries.truncate(HISTORY_DISPLAY_LIMIT);
        entries
    }

    /// Insert `entry` at the front and rewrite the capped log.
    pub fn record(&mut self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>, StorageError> {
        let mut entries = self.load();
        entries.insert(0, entry);
        entries.truncate(HISTORY_CAPACITY);

        let serialized = serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string());
        self.store.set(&self.key, &serialized)?;
        Ok(entries)
    }

    /// Record an outgoing message, shortened for display.
    pub fn record_message(
        &mut self,
        session: &str,
        message: &str,
        timestamp: i64,
    ) -> Result<Vec<HistoryEntry>, StorageError> {
        self.record(HistoryEntry {
            session: session.to_string(),
            message: preview(message),
            timestamp,
        })
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}
