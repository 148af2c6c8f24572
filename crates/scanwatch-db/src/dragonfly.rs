//! `Dragonfly` (Redis-compatible) backend.
//!
//! Expiry is delegated to the server: creature keys are written with `EX`
//! and disappear on the server's clock. Iteration uses cursor-based `SCAN`,
//! never `KEYS`, so large namespaces do not block the server.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `creatures:{encoded_id}` | JSON, `EX` | Live creature |
//! | `points:{id}` | JSON | Point of interest |
//! | `landmarks:{id}` | JSON | Landmark |
//! | `scanwatch:stats:{species_id}` | Hash | One field per encounter seen |
//! | `scanwatch:seen:{species_id}` | Integer | Last sighting, epoch ms |

use std::collections::HashMap;

use fred::prelude::*;
use fred::types::Key;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::error::DbError;

/// Keys requested per `SCAN` round-trip.
const SCAN_PAGE_SIZE: u32 = 250;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
///
/// Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::StorageUnavailable`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!(url, "Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Store `value` at `key`, expiring after `ttl_seconds` when given.
    ///
    /// Every write replaces the previous value and restarts its TTL.
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
        let expiration = match ttl_seconds {
            Some(secs) => Some(Expiration::EX(i64::try_from(secs).map_err(|e| {
                DbError::Config(format!("TTL {secs}s out of range for {key}: {e}"))
            })?)),
            None => None,
        };
        let _: () = self.client.set(key, value, expiration, None, false).await?;
        Ok(())
    }

    /// Read the raw value at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the read fails.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value)
    }

    /// Collect every key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if any `SCAN` page fails.
    pub async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, DbError> {
        let keys: Vec<Key> = self
            .client
            .scan_buffered(format!("{prefix}*"), Some(SCAN_PAGE_SIZE), None)
            .try_collect()
            .await?;
        Ok(keys.into_iter().filter_map(Key::into_string).collect())
    }

    /// Stream the values of every live key starting with `prefix`.
    ///
    /// Keys are fetched one `SCAN` page at a time and each value is read as
    /// it is reached. Keys that expire between the scan and the read are
    /// skipped.
    pub fn scan_values(&self, prefix: &str) -> BoxStream<'static, Result<String, DbError>> {
        let client = self.client.clone();
        self.client
            .scan_buffered(format!("{prefix}*"), Some(SCAN_PAGE_SIZE), None)
            .map_err(DbError::from)
            .and_then(move |key| {
                let client = client.clone();
                async move {
                    client
                        .get::<Option<String>, _>(key)
                        .await
                        .map_err(DbError::from)
                }
            })
            .try_filter_map(|value| async move { Ok::<_, DbError>(value) })
            .boxed()
    }

    /// Add `field` (with an empty value) to the hash at `key`.
    ///
    /// Re-adding an existing field is a no-op for the field count.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the write fails.
    pub async fn add_hash_field(&self, key: &str, field: &str) -> Result<(), DbError> {
        let mut fields = HashMap::with_capacity(1);
        fields.insert(field.to_owned(), String::new());
        let _: u64 = self.client.hset(key, fields).await?;
        Ok(())
    }

    /// Number of fields in the hash at `key` (0 if absent).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the read fails.
    pub async fn hash_len(&self, key: &str) -> Result<u64, DbError> {
        let len: u64 = self.client.hlen(key).await?;
        Ok(len)
    }

    /// Flush all keys from the `Dragonfly` instance.
    ///
    /// **WARNING:** This deletes all data. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the flush fails.
    pub async fn flush_all(&self) -> Result<(), DbError> {
        let _: () = self.client.flushall(false).await?;
        Ok(())
    }
}
