use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::core::config::CacheSettings;
use crate::core::redis::RedisHandle;

/// Named groups of cached reads. Mutations invalidate a whole bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CacheBucket {
    Questions,
    Tests,
}

impl CacheBucket {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Questions => "questions",
            Self::Tests => "tests",
        }
    }
}

/// Read cache scoped per bucket and per caller.
///
/// Entries live either in process or in Redis, never both, so an
/// invalidation always reaches the copy that readers see. Both stores version
/// entries by a per-bucket generation; invalidating bumps it, which orphans
/// every entry of the bucket and every fetch still in flight.
#[derive(Clone)]
pub(crate) struct QueryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    ttl: Duration,
    key_prefix: String,
    redis: Option<RedisHandle>,
    local: RwLock<LocalStore>,
}

#[derive(Default)]
struct LocalStore {
    entries: HashMap<(CacheBucket, String), LocalEntry>,
    generations: HashMap<CacheBucket, u64>,
}

impl LocalStore {
    fn generation(&self, bucket: CacheBucket) -> u64 {
        self.generations.get(&bucket).copied().unwrap_or(0)
    }
}

struct LocalEntry {
    stored_at: Instant,
    generation: u64,
    payload: String,
}

/// Bucket generation captured before a fetch. A value fetched under a ticket
/// is stored only if its bucket was not invalidated in the meantime.
pub(crate) struct CacheTicket {
    bucket: CacheBucket,
    scope: String,
    stamp: Stamp,
}

enum Stamp {
    Disabled,
    Local(u64),
    Redis(String),
}

impl QueryCache {
    pub(crate) fn new(settings: &CacheSettings, redis: Option<RedisHandle>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                ttl: Duration::from_secs(settings.ttl_seconds),
                key_prefix: settings.key_prefix.clone(),
                redis,
                local: RwLock::new(LocalStore::default()),
            }),
        }
    }

    pub(crate) fn backend_name(&self) -> &'static str {
        if self.inner.redis.is_some() {
            "redis"
        } else {
            "memory"
        }
    }

    /// Must be taken before the backend is asked for the value.
    pub(crate) async fn ticket(&self, bucket: CacheBucket, scope: &str) -> CacheTicket {
        let stamp = if self.inner.ttl.is_zero() {
            Stamp::Disabled
        } else {
            match &self.inner.redis {
                Some(redis) => Stamp::Redis(self.entry_key(redis, bucket, scope).await),
                None => Stamp::Local(self.inner.local.read().await.generation(bucket)),
            }
        };

        CacheTicket { bucket, scope: scope.to_string(), stamp }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, ticket: &CacheTicket) -> Option<T> {
        let bucket = ticket.bucket;
        let payload = match &ticket.stamp {
            Stamp::Disabled => return None,
            Stamp::Local(generation) => self.local_get(bucket, &ticket.scope, *generation).await,
            Stamp::Redis(key) => self.redis_get(bucket, key).await,
        };

        let decoded = payload.and_then(|payload| match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(bucket = bucket.as_str(), error = %err, "Dropping undecodable cache entry");
                None
            }
        });

        let outcome = if decoded.is_some() { "hit" } else { "miss" };
        metrics::counter!("query_cache_total", "bucket" => bucket.as_str(), "outcome" => outcome)
            .increment(1);

        decoded
    }

    pub(crate) async fn put<T: Serialize>(&self, ticket: CacheTicket, value: &T) {
        let CacheTicket { bucket, scope, stamp } = ticket;
        if matches!(stamp, Stamp::Disabled) {
            return;
        }

        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(bucket = bucket.as_str(), error = %err, "Failed to serialize cache entry");
                return;
            }
        };

        match stamp {
            Stamp::Disabled => {}
            // An invalidation since the ticket moved readers to a newer key;
            // this write lands on the orphaned one.
            Stamp::Redis(key) => {
                let Some(redis) = &self.inner.redis else {
                    return;
                };
                if let Err(err) = redis.set_ex(&key, &payload, self.inner.ttl.as_secs()).await {
                    tracing::warn!(bucket = bucket.as_str(), error = %err, "Failed to store cache entry in Redis");
                }
            }
            Stamp::Local(generation) => {
                let mut local = self.inner.local.write().await;
                if local.generation(bucket) != generation {
                    tracing::debug!(bucket = bucket.as_str(), "Discarding value fetched before invalidation");
                    return;
                }
                let entry = LocalEntry { stored_at: Instant::now(), generation, payload };
                local.entries.insert((bucket, scope), entry);
            }
        }
    }

    /// Drops every entry of `bucket`, for all callers.
    pub(crate) async fn invalidate(&self, bucket: CacheBucket) {
        match &self.inner.redis {
            Some(redis) => {
                if let Err(err) = redis.incr(&self.generation_key(bucket)).await {
                    tracing::error!(bucket = bucket.as_str(), error = %err, "Failed to invalidate Redis cache bucket");
                }
            }
            None => {
                let mut local = self.inner.local.write().await;
                *local.generations.entry(bucket).or_insert(0) += 1;
                local.entries.retain(|(entry_bucket, _), _| *entry_bucket != bucket);
            }
        }

        metrics::counter!("query_cache_total", "bucket" => bucket.as_str(), "outcome" => "invalidate")
            .increment(1);
        tracing::debug!(bucket = bucket.as_str(), "Invalidated query cache bucket");
    }

    async fn local_get(&self, bucket: CacheBucket, scope: &str, generation: u64) -> Option<String> {
        let local = self.inner.local.read().await;
        let entry = local.entries.get(&(bucket, scope.to_string()))?;
        (entry.generation == generation && entry.stored_at.elapsed() < self.inner.ttl)
            .then(|| entry.payload.clone())
    }

    async fn redis_get(&self, bucket: CacheBucket, key: &str) -> Option<String> {
        let redis = self.inner.redis.as_ref()?;
        match redis.get(key).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(bucket = bucket.as_str(), error = %err, "Redis cache read failed");
                None
            }
        }
    }

    async fn entry_key(&self, redis: &RedisHandle, bucket: CacheBucket, scope: &str) -> String {
        let generation = match redis.get(&self.generation_key(bucket)).await {
            Ok(value) => value.unwrap_or_else(|| "0".to_string()),
            Err(err) => {
                tracing::warn!(bucket = bucket.as_str(), error = %err, "Failed to read cache generation");
                "0".to_string()
            }
        };

        entry_key(&self.inner.key_prefix, bucket, &generation, scope)
    }

    fn generation_key(&self, bucket: CacheBucket) -> String {
        format!("{}:{}:generation", self.inner.key_prefix, bucket.as_str())
    }
}

fn entry_key(prefix: &str, bucket: CacheBucket, generation: &str, scope: &str) -> String {
    format!("{prefix}:{}:{generation}:{scope}", bucket.as_str())
}
