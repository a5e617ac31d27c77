//! Key/Value Store
//!
//! Small persistent store shared by the whole process. Every write is
//! checked against a fixed byte quota counted over the UTF-8 length of key
//! plus stored value; a write that would overflow it is rejected whole.
//!
//! Values are kept as strings. In JSON mode they are encoded on the way in
//! and parsed on the way out; in raw mode they are stored as given.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Default byte quota.
pub const STORE_QUOTA: usize = 13 * 1024;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A typed value could not be encoded, or a store file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing the store file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: BTreeMap<String, String>,
    size: usize,
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Quota-checked async key/value store.
#[derive(Debug)]
pub struct KeyValueStore {
    inner: RwLock<StoreInner>,
    quota: usize,
}

impl KeyValueStore {
    /// Create an empty store.
    pub fn new(quota: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            quota,
        }
    }

    /// Open a store file, or start empty if it does not exist.
    pub async fn load(path: impl AsRef<Path>, quota: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let entries: BTreeMap<String, String> = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        let size = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
        info!("Loaded {} keys ({} bytes) from {}", entries.len(), size, path.display());

        Ok(Self {
            inner: RwLock::new(StoreInner { entries, size }),
            quota,
        })
    }

    /// Write every entry to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let json = {
            let inner = self.inner.read().await;
            serde_json::to_vec(&inner.entries)?
        };
        tokio::fs::write(path.as_ref(), json).await?;
        Ok(())
    }

    /// Byte quota.
    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Read a value, or `default` when the key is missing or, in JSON mode,
    /// when the stored text does not parse.
    pub async fn get(&self, key: &str, default: Value, as_json: bool) -> Value {
        let inner = self.inner.read().await;
        let Some(raw) = inner.entries.get(key) else {
            return default;
        };
        if as_json {
            serde_json::from_str(raw).unwrap_or(default)
        } else {
            Value::String(raw.clone())
        }
    }

    /// Write a value. Returns `false`, leaving the store untouched, when the
    /// write would exceed the quota.
    ///
    /// Raw mode stores strings verbatim and any other value as its JSON text.
    pub async fn set(&self, key: &str, value: &Value, as_json: bool) -> bool {
        let encoded = match value {
            Value::String(s) if !as_json => s.clone(),
            other => other.to_string(),
        };
        self.put(key, encoded).await
    }

    /// Typed read through serde.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let inner = self.inner.read().await;
        serde_json::from_str(inner.entries.get(key)?).ok()
    }

    /// Typed write through serde.
    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<bool, StoreError> {
        let encoded = serde_json::to_string(value)?;
        Ok(self.put(key, encoded).await)
    }

    async fn put(&self, key: &str, value: String) -> bool {
        let mut inner = self.inner.write().await;
        let new_size = entry_size(key, &value);
        let old_size = inner.entries.get(key).map_or(0, |v| entry_size(key, v));

        let total = inner.size - old_size + new_size;
        if total > self.quota {
            debug!("Store write rejected: key={} would use {} of {} bytes", key, total, self.quota);
            return false;
        }

        inner.entries.insert(key.to_string(), value);
        inner.size = total;
        true
    }

    /// Delete a key. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner.entries.remove(key) {
            Some(value) => {
                inner.size -= entry_size(key, &value);
                true
            }
            None => false,
        }
    }

    /// Delete everything.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.size = 0;
    }

    /// Number of keys.
    pub async fn length(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Bytes in use.
    pub async fn size(&self) -> usize {
        self.inner.read().await.size
    }

    /// Share of the quota in use, in percent.
    pub async fn usage_percent(&self) -> f64 {
        if self.quota == 0 {
            return 0.0;
        }
        self.size().await as f64 / self.quota as f64 * 100.0
    }

    /// Key at `index` in ascending key order.
    pub async fn key_at(&self, index: usize) -> Option<String> {
        self.inner.read().await.entries.keys().nth(index).cloned()
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::new(STORE_QUOTA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[tokio::test]
    async fn test_quota_is_exact() {
        let store = KeyValueStore::default();
        let value = Value::String("a".repeat(13311));

        assert!(store.set("k", &value, false).await);
        assert_eq!(store.size().await, 13312);
        assert_eq!(store.usage_percent().await, 100.0);

        assert!(!store.set("k2", &json!("x"), false).await);
        assert_eq!(store.size().await, 13312);
        assert_eq!(store.length().await, 1);
    }

    #[tokio::test]
    async fn test_update_replaces_old_size() {
        let store = KeyValueStore::new(20);
        assert!(store.set("key", &json!("0123456789"), false).await);
        assert_eq!(store.size().await, 13);

        // 3 + 17 = 20 fits only because the old 13 bytes are released.
        assert!(store.set("key", &json!("0123456789abcdefg"), false).await);
        assert_eq!(store.size().await, 20);

        assert!(!store.set("key", &json!("0123456789abcdefgh"), false).await);
        assert_eq!(store.get("key", Value::Null, false).await, json!("0123456789abcdefg"));
    }

    #[tokio::test]
    async fn test_json_mode() {
        let store = KeyValueStore::default();
        assert!(store.set("scores", &json!([1, 2, 3]), true).await);
        assert_eq!(store.get("scores", Value::Null, true).await, json!([1, 2, 3]));
        assert_eq!(store.size().await, "scores".len() + "[1,2,3]".len());

        assert!(store.set("text", &json!("not json"), false).await);
        assert_eq!(store.get("text", json!("fallback"), true).await, json!("fallback"));
        assert_eq!(store.get("text", Value::Null, false).await, json!("not json"));
        assert_eq!(store.get("missing", json!(7), true).await, json!(7));
    }

    #[tokio::test]
    async fn test_keys_in_order() {
        let store = KeyValueStore::default();
        for key in ["pear", "apple", "fig"] {
            store.set(key, &json!(1), true).await;
        }

        assert_eq!(store.key_at(0).await.as_deref(), Some("apple"));
        assert_eq!(store.key_at(2).await.as_deref(), Some("pear"));
        assert_eq!(store.key_at(3).await, None);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = KeyValueStore::default();
        store.set("a", &json!("xy"), false).await;
        store.set("b", &json!("z"), false).await;

        assert!(store.remove("a").await);
        assert!(!store.remove("a").await);
        assert_eq!(store.size().await, 2);

        store.clear().await;
        assert_eq!(store.length().await, 0);
        assert_eq!(store.size().await, 0);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Best {
        name: String,
        rank: u32,
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let store = KeyValueStore::default();
        let best = Best { name: "MadWombat12".into(), rank: 1 };

        assert!(store.set_as("best", &best).await.unwrap());
        assert_eq!(store.get_as::<Best>("best").await, Some(best));
        assert_eq!(store.get_as::<u32>("best").await, None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("royale-store-{}.json", uuid::Uuid::new_v4()));

        let store = KeyValueStore::default();
        store.set("greeting", &json!("héllo"), false).await;
        store.save(&path).await.unwrap();

        let loaded = KeyValueStore::load(&path, STORE_QUOTA).await.unwrap();
        assert_eq!(loaded.size().await, store.size().await);
        assert_eq!(loaded.get("greeting", Value::Null, false).await, json!("héllo"));

        tokio::fs::remove_file(&path).await.unwrap();
        let empty = KeyValueStore::load(&path, STORE_QUOTA).await.unwrap();
        assert_eq!(empty.length().await, 0);
    }
}
