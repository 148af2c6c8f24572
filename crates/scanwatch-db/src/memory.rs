//! In-process backend with the same TTL semantics as `Dragonfly`.
//!
//! Expiry runs on the tokio clock, so tests can pause time and advance past
//! a deadline. Expired keys are invisible to every read and are purged
//! during scans.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::error::DbError;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, StoredValue>,
    hashes: HashMap<String, BTreeSet<String>>,
    offline: bool,
}

impl MemoryState {
    fn ensure_online(&self) -> Result<(), DbError> {
        if self.offline {
            return Err(DbError::StorageUnavailable("memory store is offline".to_owned()));
        }
        Ok(())
    }
}

/// Shared in-memory key-value store.
///
/// Clones share state. Each operation takes the lock once, so single-key
/// writes are atomic with respect to each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while offline every operation fails with
    /// [`DbError::StorageUnavailable`].
    pub fn set_online(&self, online: bool) {
        self.state.write().offline = !online;
    }

    /// Store `value` at `key`, expiring after `ttl_seconds` when given.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] while the store is offline.
    pub fn set_value(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), DbError> {
        let mut state = self.state.write();
        state.ensure_online()?;
        let expires_at =
            ttl_seconds.and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
        state.values.insert(
            key.to_owned(),
            StoredValue {
                value: value.to_owned(),
                expires_at,
            },
        );
        Ok(())
    }

    /// Read the live value at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] while the store is offline.
    pub fn get_value(&self, key: &str) -> Result<Option<String>, DbError> {
        let state = self.state.read();
        state.ensure_online()?;
        let now = Instant::now();
        Ok(state
            .values
            .get(key)
            .filter(|stored| stored.is_live(now))
            .map(|stored| stored.value.clone()))
    }

    /// Every live key (plain or hash) starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] while the store is offline.
    pub fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, DbError> {
        let mut state = self.state.write();
        state.ensure_online()?;
        purge_expired(&mut state);
        let mut keys: Vec<String> = state
            .values
            .keys()
            .chain(state.hashes.keys())
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    /// Stream the values of every live key starting with `prefix`.
    ///
    /// The matching values are read when this is called; each call re-reads
    /// the current state.
    pub fn scan_values(&self, prefix: &str) -> BoxStream<'static, Result<String, DbError>> {
        let mut state = self.state.write();
        if let Err(e) = state.ensure_online() {
            return stream::once(async move { Err(e) }).boxed();
        }
        purge_expired(&mut state);
        let values: Vec<String> = state
            .values
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, stored)| stored.value.clone())
            .collect();
        stream::iter(values.into_iter().map(Ok)).boxed()
    }

    /// Add `field` to the hash at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] while the store is offline.
    pub fn add_hash_field(&self, key: &str, field: &str) -> Result<(), DbError> {
        let mut state = self.state.write();
        state.ensure_online()?;
        state
            .hashes
            .entry(key.to_owned())
            .or_default()
            .insert(field.to_owned());
        Ok(())
    }

    /// Number of fields in the hash at `key` (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] while the store is offline.
    pub fn hash_len(&self, key: &str) -> Result<u64, DbError> {
        let state = self.state.read();
        state.ensure_online()?;
        let len = state.hashes.get(key).map_or(0, BTreeSet::len);
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }

    /// Drop every key.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] while the store is offline.
    pub fn flush_all(&self) -> Result<(), DbError> {
        let mut state = self.state.write();
        state.ensure_online()?;
        state.values.clear();
        state.hashes.clear();
        Ok(())
    }
}

fn purge_expired(state: &mut MemoryState) {
    let now = Instant::now();
    state.values.retain(|_, stored| stored.is_live(now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test(start_paused = true)]
    async fn value_expires_after_ttl() {
        let store = MemoryStore::new();
        assert!(store.set_value("k", "v", Some(1)).is_ok());
        assert_eq!(store.get_value("k").ok().flatten().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(store.get_value("k").ok().flatten(), None);
        assert_eq!(store.scan_keys("k").ok().map(|k| k.len()), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_restarts_ttl() {
        let store = MemoryStore::new();
        assert!(store.set_value("k", "v1", Some(2)).is_ok());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.set_value("k", "v2", Some(2)).is_ok());
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(store.get_value("k").ok().flatten().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn values_without_ttl_persist() {
        let store = MemoryStore::new();
        assert!(store.set_value("points:a", "1", None).is_ok());
        assert!(store.set_value("points:b", "2", None).is_ok());
        assert!(store.set_value("landmarks:c", "3", None).is_ok());

        let mut values: Vec<String> = store
            .scan_values("points:")
            .try_collect()
            .await
            .unwrap_or_default();
        values.sort();
        assert_eq!(values, vec!["1".to_owned(), "2".to_owned()]);
    }

    #[test]
    fn hash_fields_are_distinct() {
        let store = MemoryStore::new();
        assert!(store.add_hash_field("stats:1", "a").is_ok());
        assert!(store.add_hash_field("stats:1", "a").is_ok());
        assert!(store.add_hash_field("stats:1", "b").is_ok());
        assert_eq!(store.hash_len("stats:1").ok(), Some(2));
        assert_eq!(store.hash_len("stats:2").ok(), Some(0));
        assert_eq!(store.scan_keys("stats:").ok(), Some(vec!["stats:1".to_owned()]));
    }

    #[test]
    fn hash_len_fails_only_when_unavailable() {
        let store = MemoryStore::new();
        for field in ["a", "b", "c"] {
            assert!(store.add_hash_field("h", field).is_ok());
        }
        assert_eq!(store.hash_len("h").ok(), Some(3));

        store.set_online(false);
        assert!(matches!(
            store.hash_len("h"),
            Err(DbError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn offline_store_rejects_everything() {
        let store = MemoryStore::new();
        store.set_online(false);
        assert!(matches!(
            store.set_value("k", "v", None),
            Err(DbError::StorageUnavailable(_))
        ));
        assert!(store.get_value("k").is_err());
        let scanned: Result<Vec<String>, DbError> = store.scan_values("k").try_collect().await;
        assert!(scanned.is_err());

        store.set_online(true);
        assert!(store.set_value("k", "v", None).is_ok());
    }
}
