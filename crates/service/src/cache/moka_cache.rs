use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{future::Cache as MokaFuture, Expiry};
use tokio_util::sync::CancellationToken;

use super::Cache;
use crate::errors::ServiceError;

#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl<V> Expiry<String, Entry<V>> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry<V>, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local cache backed by moka with a bounded entry count.
#[derive(Clone)]
pub struct MokaCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: MokaFuture<String, Entry<V>>,
}

impl<V> MokaCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64) -> Self {
        let inner = MokaFuture::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    /// Approximate number of live entries (moka applies writes lazily).
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Flush pending housekeeping so `entry_count` is exact.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

fn ensure_live(ct: &CancellationToken) -> Result<(), ServiceError> {
    if ct.is_cancelled() {
        return Err(ServiceError::Cancelled);
    }
    Ok(())
}

#[async_trait]
impl<V> Cache<V> for MokaCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str, ct: &CancellationToken) -> Result<Option<V>, ServiceError> {
        ensure_live(ct)?;
        Ok(self.inner.get(key).await.map(|e| e.value))
    }

    async fn set(&self, key: &str, value: V, ttl: Duration, ct: &CancellationToken) -> Result<(), ServiceError> {
        ensure_live(ct)?;
        self.inner.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }

    async fn remove(&self, key: &str, ct: &CancellationToken) -> Result<(), ServiceError> {
        ensure_live(ct)?;
        self.inner.invalidate(key).await;
        Ok(())
    }
}
