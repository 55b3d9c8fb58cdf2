use thiserror::Error;
use town_engine::{BlobStore, BlobStoreError};
use tracing::{debug, info, warn};

use super::ConversationHistory;

pub(crate) const HISTORY_BLOB_KEY: &str = "english_town_history_v3";

#[derive(Debug, Error)]
pub(crate) enum HistoryLoadError {
    #[error(transparent)]
    Store(#[from] BlobStoreError),
    #[error("history blob is not valid at {path}: {message}")]
    Decode { path: String, message: String },
}

/// Whole-mapping persistence of conversation history under one blob key.
pub(crate) struct HistoryStore {
    store: Box<dyn BlobStore>,
    key: String,
}

impl HistoryStore {
    pub(crate) fn new(store: Box<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Absent or corrupt data yields an empty history.
    pub(crate) fn load(&self) -> ConversationHistory {
        match self.try_load() {
            Ok(Some(history)) => {
                info!(
                    key = %self.key,
                    npcs = history.len(),
                    messages = history.values().map(Vec::len).sum::<usize>(),
                    "history_loaded"
                );
                history
            }
            Ok(None) => {
                debug!(key = %self.key, "history_absent");
                ConversationHistory::new()
            }
            Err(error) => {
                warn!(key = %self.key, error = %error, "history_load_failed");
                ConversationHistory::new()
            }
        }
    }

    pub(crate) fn try_load(&self) -> Result<Option<ConversationHistory>, HistoryLoadError> {
        let Some(bytes) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let deserializer = &mut serde_json::Deserializer::from_slice(&bytes);
        let history = serde_path_to_error::deserialize(deserializer).map_err(|error| {
            HistoryLoadError::Decode {
                path: error.path().to_string(),
                message: error.inner().to_string(),
            }
        })?;
        Ok(Some(history))
    }

    /// Failures are logged; the in-memory history stays authoritative.
    pub(crate) fn save(&mut self, history: &ConversationHistory) {
        let bytes = match serde_json::to_vec(history) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(key = %self.key, error = %error, "history_encode_failed");
                return;
            }
        };
        if let Err(error) = self.store.put(&self.key, &bytes) {
            warn!(key = %self.key, error = %error, "history_save_failed");
        }
    }
}
