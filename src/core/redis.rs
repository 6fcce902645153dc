use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let Some(mut manager) = self.connection().await else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// `Ok(None)` both for a missing key and a disconnected handle.
    pub(crate) async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        let Some(mut manager) = self.connection().await else {
            return Ok(None);
        };

        cmd("GET").arg(key).query_async(&mut manager).await
    }

    pub(crate) async fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), RedisError> {
        let Some(mut manager) = self.connection().await else {
            return Ok(());
        };

        cmd("SET").arg(key).arg(value).arg("EX").arg(ttl_seconds).query_async(&mut manager).await
    }

    pub(crate) async fn incr(&self, key: &str) -> Result<Option<i64>, RedisError> {
        let Some(mut manager) = self.connection().await else {
            return Ok(None);
        };

        cmd("INCR").arg(key).query_async::<_, i64>(&mut manager).await.map(Some)
    }

    async fn connection(&self) -> Option<ConnectionManager> {
        self.manager.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{RedisHandle, RedisHealth};

    #[tokio::test]
    async fn disconnected_handle_is_a_no_op() {
        let redis = RedisHandle::new("redis://127.0.0.1:6379/1".to_string());

        assert!(matches!(redis.health().await, RedisHealth::Disconnected));
        assert_eq!(redis.get("delta:query:questions").await.expect("get"), None);
        redis.set_ex("delta:query:questions", "[]", 60).await.expect("set");
        assert_eq!(redis.incr("delta:query:questions:generation").await.expect("incr"), None);
    }
}
