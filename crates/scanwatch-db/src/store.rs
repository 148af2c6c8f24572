//! Store handle shared by every component.
//!
//! Uses enum dispatch rather than a trait object because async methods are
//! not dyn-compatible. The handle is cheap to clone and is passed explicitly
//! to each store, the ingestor, and the stats aggregator.

use futures::stream::BoxStream;

use crate::dragonfly::DragonflyPool;
use crate::error::DbError;
use crate::memory::MemoryStore;

/// A key-value backend with per-key TTL, prefix scans, and hash fields.
#[derive(Clone)]
pub enum StoreHandle {
    /// `Dragonfly`/Redis server.
    Dragonfly(DragonflyPool),
    /// In-process store.
    Memory(MemoryStore),
}

impl StoreHandle {
    /// Connect to `Dragonfly` at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the URL is invalid or the connection fails.
    pub async fn dragonfly(url: &str) -> Result<Self, DbError> {
        Ok(Self::Dragonfly(DragonflyPool::connect(url).await?))
    }

    /// A fresh, empty in-process store.
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dragonfly(_) => "dragonfly",
            Self::Memory(_) => "memory",
        }
    }

    /// Upsert `value` at `key`, expiring after `ttl_seconds` when given.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the write fails.
    pub async fn set_value(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<(), DbError> {
        match self {
            Self::Dragonfly(pool) => pool.set_value(key, value, ttl_seconds).await,
            Self::Memory(store) => store.set_value(key, value, ttl_seconds),
        }
    }

    /// Read the live value at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the read fails.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, DbError> {
        match self {
            Self::Dragonfly(pool) => pool.get_value(key).await,
            Self::Memory(store) => store.get_value(key),
        }
    }

    /// All keys starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the scan fails.
    pub async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, DbError> {
        match self {
            Self::Dragonfly(pool) => pool.scan_keys(prefix).await,
            Self::Memory(store) => store.scan_keys(prefix),
        }
    }

    /// Lazily stream the values of all live keys starting with `prefix`.
    ///
    /// Each call starts a new scan of current state. The stream is not a
    /// snapshot: writes and expirations during iteration may or may not be
    /// reflected.
    pub fn scan_values(&self, prefix: &str) -> BoxStream<'static, Result<String, DbError>> {
        match self {
            Self::Dragonfly(pool) => pool.scan_values(prefix),
            Self::Memory(store) => store.scan_values(prefix),
        }
    }

    /// Add `field` to the hash at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the write fails.
    pub async fn add_hash_field(&self, key: &str, field: &str) -> Result<(), DbError> {
        match self {
            Self::Dragonfly(pool) => pool.add_hash_field(key, field).await,
            Self::Memory(store) => store.add_hash_field(key, field),
        }
    }

    /// Number of fields in the hash at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the read fails.
    pub async fn hash_len(&self, key: &str) -> Result<u64, DbError> {
        match self {
            Self::Dragonfly(pool) => pool.hash_len(key).await,
            Self::Memory(store) => store.hash_len(key),
        }
    }

    /// Delete every key in the backend. Testing only.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        match self {
            Self::Dragonfly(pool) => pool.flush_all().await,
            Self::Memory(store) => store.flush_all(),
        }
    }
}

impl From<DragonflyPool> for StoreHandle {
    fn from(pool: DragonflyPool) -> Self {
        Self::Dragonfly(pool)
    }
}

impl From<MemoryStore> for StoreHandle {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}
