//! Cache provider traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CacheResult;

/// A key-value store with per-entry expiry.
///
/// Values are any serde type; how they are encoded is up to the store.
/// One provider is shared by every request a CAS client serves, so
/// implementations take `&self` and handle their own locking.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Reads a value; `None` when absent or expired.
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send;

    /// Writes a value, replacing any previous one. `ttl: None` never expires.
    async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: Serialize + Sync;

    /// Removes a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Returns true if a live value is stored under `key`.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Time left before `key` expires; `None` when absent or without expiry.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;

    /// Drops every entry.
    async fn clear(&self) -> CacheResult<()>;
}

/// Check-and-set operations, used where two requests may race on one key.
#[async_trait]
pub trait AtomicCacheProvider: CacheProvider {
    /// Writes only if no live value exists; returns whether it wrote.
    async fn set_nx<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<bool>
    where
        T: Serialize + Sync;

    /// Removes a value and returns it, in one step.
    async fn get_del<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send;
}

#[async_trait]
impl<P: CacheProvider> CacheProvider for Arc<P> {
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        (**self).get(key).await
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        (**self).set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        (**self).exists(key).await
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        (**self).ttl(key).await
    }

    async fn clear(&self) -> CacheResult<()> {
        (**self).clear().await
    }
}

#[async_trait]
impl<P: AtomicCacheProvider> AtomicCacheProvider for Arc<P> {
    async fn set_nx<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> CacheResult<bool>
    where
        T: Serialize + Sync,
    {
        (**self).set_nx(key, value, ttl).await
    }

    async fn get_del<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        (**self).get_del(key).await
    }
}
