//! History store seam — how assembly reads past chat messages.
//!
//! The host owns the real message store; assembly only ever needs an
//! ascending window of messages ending "now". `MemoryHistoryStore` is the
//! bundled backend for tests and hosts without a store of their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::message::HistoryMessage;

/// Visibility level attached to stored messages.
///
/// Queries request a level; records tagged above it are filtered out.
/// History re-rendering always queries at `Base` so intercepted or
/// internal records never leak into turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Ordinary chat traffic
    #[default]
    Base,
    /// Internal records, visible only to full-level queries
    Full,
}

/// Read access to a conversation's message history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The backend name (e.g. "memory", "host").
    fn name(&self) -> &str;

    /// Messages in `stream_id` strictly before `before` (unix seconds),
    /// bounded to the most recent `limit`, restricted to records at or
    /// below `visibility`. Returned in ascending time order.
    async fn messages_before(
        &self,
        stream_id: &str,
        before: f64,
        limit: usize,
        visibility: Visibility,
    ) -> Result<Vec<HistoryMessage>, StoreError>;
}

struct StoredRecord {
    message: HistoryMessage,
    visibility: Visibility,
}

/// An in-memory store that keeps messages in a Vec per stream.
/// Useful for testing and hosts where persistence isn't needed.
pub struct MemoryHistoryStore {
    streams: Arc<RwLock<HashMap<String, Vec<StoredRecord>>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            streams: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Append a message at `Base` visibility.
    pub async fn insert(&self, stream_id: &str, message: HistoryMessage) {
        self.insert_with_visibility(stream_id, message, Visibility::Base)
            .await;
    }

    /// Append a message at an explicit visibility level.
    pub async fn insert_with_visibility(
        &self,
        stream_id: &str,
        message: HistoryMessage,
        visibility: Visibility,
    ) {
        let mut streams = self.streams.write().await;
        streams
            .entry(stream_id.to_string())
            .or_default()
            .push(StoredRecord {
                message,
                visibility,
            });
    }

    /// Number of records held for a stream, across all visibility levels.
    pub async fn count(&self, stream_id: &str) -> usize {
        let streams = self.streams.read().await;
        streams.get(stream_id).map_or(0, Vec::len)
    }

    /// Drop all streams.
    pub async fn clear(&self) {
        self.streams.write().await.clear();
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn messages_before(
        &self,
        stream_id: &str,
        before: f64,
        limit: usize,
        visibility: Visibility,
    ) -> Result<Vec<HistoryMessage>, StoreError> {
        let streams = self.streams.read().await;
        let Some(records) = streams.get(stream_id) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<HistoryMessage> = records
            .iter()
            .filter(|r| r.visibility <= visibility && r.message.timestamp < before)
            .map(|r| r.message.clone())
            .collect();

        matched.sort_by(|a, b| {
            a.timestamp
                .partial_cmp(&b.timestamp)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Keep the most recent `limit`, still ascending
        if matched.len() > limit {
            matched.drain(..matched.len() - limit);
        }

        Ok(matched)
    }
}
