//! Cache abstraction used for single-entity read-through caching.
//!
//! Keys are plain strings (`"<entity>:<id>"`); entries expire after the TTL
//! supplied on `set`.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::ServiceError;

pub mod moka_cache;

pub use moka_cache::MokaCache;

#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str, ct: &CancellationToken) -> Result<Option<V>, ServiceError>;
    async fn set(&self, key: &str, value: V, ttl: Duration, ct: &CancellationToken) -> Result<(), ServiceError>;
    async fn remove(&self, key: &str, ct: &CancellationToken) -> Result<(), ServiceError>;
}

/// In-memory cache that records every call, for tests and doc examples.
pub mod mock {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    pub struct RecordingCache<V> {
        entries: DashMap<String, V>,
        gets: AtomicUsize,
        sets: Mutex<Vec<(String, Duration)>>, // (key, ttl) per set call
        removes: Mutex<Vec<String>>,
        failing: AtomicBool,
    }

    impl<V> Default for RecordingCache<V> {
        fn default() -> Self {
            Self {
                entries: DashMap::new(),
                gets: AtomicUsize::new(0),
                sets: Mutex::new(Vec::new()),
                removes: Mutex::new(Vec::new()),
                failing: AtomicBool::new(false),
            }
        }
    }

    impl<V: Clone> RecordingCache<V> {
        /// Store a value without recording a `set` call.
        pub fn seed(&self, key: &str, value: V) {
            self.entries.insert(key.to_string(), value);
        }

        pub fn contains(&self, key: &str) -> bool {
            self.entries.contains_key(key)
        }

        pub fn get_calls(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        pub async fn set_calls(&self) -> Vec<(String, Duration)> {
            self.sets.lock().await.clone()
        }

        pub async fn removed_keys(&self) -> Vec<String> {
            self.removes.lock().await.clone()
        }

        /// Make every subsequent call fail with `ServiceError::Cache`.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), ServiceError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ServiceError::Cache("simulated cache outage".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<V> Cache<V> for RecordingCache<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        async fn get(&self, key: &str, _ct: &CancellationToken) -> Result<Option<V>, ServiceError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.entries.get(key).map(|e| e.value().clone()))
        }

        async fn set(&self, key: &str, value: V, ttl: Duration, _ct: &CancellationToken) -> Result<(), ServiceError> {
            self.check()?;
            self.sets.lock().await.push((key.to_string(), ttl));
            self.entries.insert(key.to_string(), value);
            Ok(())
        }

        async fn remove(&self, key: &str, _ct: &CancellationToken) -> Result<(), ServiceError> {
            self.check()?;
            self.removes.lock().await.push(key.to_string());
            self.entries.remove(key);
            Ok(())
        }
    }
}
