//! Best score bridge
//!
//! Read once at startup, written only when a finished session strictly beats
//! it. Storage trouble is logged and otherwise ignored: a missing or
//! unreadable value counts as zero, a failed write keeps the in-memory best.

use crate::platform::storage::ScoreStore;

/// Best score for one game, backed by a [`ScoreStore`]
pub struct BestScore {
    key: String,
    value: u32,
    store: Box<dyn ScoreStore>,
}

impl BestScore {
    /// Load the stored best for `key`
    pub fn open(key: impl Into<String>, store: Box<dyn ScoreStore>) -> Self {
        let key = key.into();
        let value = match store.load(&key) {
            Ok(Some(value)) => {
                log::info!("Loaded best score {} for {}", value, key);
                value
            }
            Ok(None) => {
                log::info!("No best score for {}, starting fresh", key);
                0
            }
            Err(e) => {
                log::warn!("Could not read best score for {}: {}", key, e);
                0
            }
        };
        Self { key, value, store }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Whether `score` would become the new best
    pub fn qualifies(&self, score: u32) -> bool {
        score > self.value
    }

    /// Record a finished session's score. Returns true if it became the best.
    pub fn record(&mut self, score: u32) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        self.value = score;
        if let Err(e) = self.store.save(&self.key, score) {
            log::warn!("Could not save best score for {}: {}", self.key, e);
        }
        true
    }
}

impl std::fmt::Debug for BestScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestScore")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::platform::storage::MemoryStore;
    use std::sync::{Arc, Mutex};

    /// Shares its map so tests can inspect what was saved
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStore>>);

    impl ScoreStore for SharedStore {
        fn load(&self, key: &str) -> Result<Option<u32>, StoreError> {
            self.0.lock().expect("lock").load(key)
        }

        fn save(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
            self.0.lock().expect("lock").save(key, value)
        }
    }

    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<u32>, StoreError> {
            Err(StoreError::unavailable("disk on fire"))
        }

        fn save(&mut self, _key: &str, _value: u32) -> Result<(), StoreError> {
            Err(StoreError::unavailable("disk on fire"))
        }
    }

    #[test]
    fn test_missing_is_zero() {
        let best = BestScore::open("snake", Box::new(MemoryStore::default()));
        assert_eq!(best.key(), "snake");
        assert_eq!(best.value(), 0);
        assert!(!best.qualifies(0));
        assert!(best.qualifies(1));
    }

    #[test]
    fn test_persists_only_strict_improvement() {
        let shared = SharedStore(Arc::new(Mutex::new(MemoryStore::with("snake", 10))));
        let mut best = BestScore::open("snake", Box::new(shared.clone()));
        assert_eq!(best.value(), 10);

        assert!(!best.record(10));
        assert!(!best.record(3));
        assert_eq!(shared.0.lock().expect("lock").get("snake"), Some(10));

        assert!(best.record(11));
        assert_eq!(best.value(), 11);
        assert_eq!(shared.0.lock().expect("lock").get("snake"), Some(11));
    }

    #[test]
    fn test_broken_store_is_best_effort() {
        let mut best = BestScore::open("whack", Box::new(BrokenStore));
        assert_eq!(best.value(), 0);
        assert!(best.record(4));
        assert_eq!(best.value(), 4);
    }
}
