use redis::AsyncCommands;
use redis::Client;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::db::cache::{CacheKey, QueryCache};
use crate::error::{AppError, AppResult};
use crate::models::ResultSet;

/// Creates a Redis client for caching
///
/// Only parses the URL; no connection is attempted until the first command.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed query cache
///
/// Reads go straight to Redis. Writes are handed to a background task so a
/// slow or unreachable Redis never holds up a search response. Redis owns
/// expiry through `SETEX`.
#[derive(Clone)]
pub struct RedisCache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Sends a shutdown signal to the writer task, which flushes pending writes
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl RedisCache {
    /// Creates a new RedisCache and spawns its background writer
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    /// Background task that drains cache write messages into Redis
    ///
    /// On shutdown, flushes everything still queued before exiting.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                msg = write_rx.recv() => {
                    let Some(msg) = msg else { break };
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::warn!(error = %e, "Failed to write to Redis cache");
                    }
                }
                Some(()) = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");
                    write_rx.close();

                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::warn!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }
                    break;
                }
            }
        }

        tracing::info!("Cache writer task stopped");
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Serializes a result set and queues it for writing
    fn set_in_background(&self, key: &CacheKey, value: &ResultSet, ttl: Duration) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Cache serialization error: {}", e)))?;

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            // SETEX rejects a zero expiry.
            ttl: ttl.as_secs().max(1),
        };

        self.write_tx
            .send(msg)
            .map_err(|e| AppError::CacheUnavailable(format!("Cache writer stopped: {}", e)))
    }
}

#[async_trait::async_trait]
impl QueryCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<ResultSet>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::CacheUnavailable(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &CacheKey, value: &ResultSet, ttl: Duration) -> AppResult<()> {
        self.set_in_background(key, value, ttl)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_redis_client_rejects_bad_url() {
        assert!(create_redis_client("not a url").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_cache_unavailable() {
        // Nothing listens on port 1; the connection is refused.
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = RedisCache::new(client);

        let result = cache.get(&CacheKey::from_query("anything")).await;
        assert!(matches!(result, Err(AppError::CacheUnavailable(_))));

        // Writes are queued, so they succeed even with Redis down.
        tokio_test::assert_ok!(
            cache
                .put(&CacheKey::from_query("anything"), &Vec::new(), Duration::from_secs(60))
                .await
        );

        handle.shutdown().await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_in_background_writes_to_cache() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, _handle) = RedisCache::new(client.clone());

        let key = CacheKey::from_query("test_async_write");
        let value = vec![crate::models::ResultItem {
            title: "Foo".to_string(),
            url: "https://www.youtube.com/watch?v=abc123".to_string(),
            thumbnail: "https://i.ytimg.com/vi/abc123/mqdefault.jpg".to_string(),
        }];

        cache.put(&key, &value, Duration::from_secs(60)).await.unwrap();

        // Give the background task time to process
        tokio::time::sleep(Duration::from_millis(100)).await;

        let retrieved = cache.get(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
