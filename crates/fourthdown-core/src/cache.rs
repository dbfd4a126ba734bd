// Per-run provider response cache.
//
// Created once per run and handed to providers explicitly. Nothing is shared
// between runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct RunCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry map. A poisoned lock is recovered: every write is a single
    /// map operation, so a panicking holder cannot leave an entry half done.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("run cache lock poisoned by a panicked task, recovering");
            poisoned.into_inner()
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.lock();
        let hit = entries.get(key).cloned();
        if hit.is_some() {
            debug!(key, "run cache hit");
        }
        hit
    }

    /// Typed lookup. An entry that no longer deserializes is treated as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                self.invalidate(key);
                None
            }
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.lock().insert(key.into(), value);
    }

    pub fn insert_as<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.insert(key, v),
            Err(e) => warn!(error = %e, "value not cacheable"),
        }
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
