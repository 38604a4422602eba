use std::sync::Arc;

use quiz_core::model::QuizState;

use crate::repository::{KeyValueStore, StorageError};

/// Storage key the whole quiz state is written under.
pub const STATE_KEY: &str = "simulado_state_v1";

/// Reads and writes the quiz state as one JSON document under a fixed key.
#[derive(Clone)]
pub struct QuizStateStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl QuizStateStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, STATE_KEY)
    }

    #[must_use]
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the last saved state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if a snapshot exists but cannot be
    /// decoded, or other storage errors from the backend.
    pub async fn load(&self) -> Result<Option<QuizState>, StorageError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    /// Replace the saved state with `state`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    pub async fn save(&self, state: &QuizState) -> Result<(), StorageError> {
        let raw = serde_json::to_string(state)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(&self.key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use quiz_core::model::ModuleNumber;

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let store = QuizStateStore::new(Arc::new(InMemoryRepository::new()));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_state_loads_back_identical() {
        let store = QuizStateStore::new(Arc::new(InMemoryRepository::new()));
        let state = QuizState::fresh([ModuleNumber::new(1), ModuleNumber::new(2)]);
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_serialization_error() {
        let kv = Arc::new(InMemoryRepository::new());
        kv.set(STATE_KEY, "{not json").await.unwrap();
        let store = QuizStateStore::new(kv);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryRepository::new());
        let a = QuizStateStore::with_key(Arc::clone(&kv), "a");
        let b = QuizStateStore::with_key(kv, "b");
        a.save(&QuizState::fresh([ModuleNumber::new(1)])).await.unwrap();
        assert!(b.load().await.unwrap().is_none());
    }
}
