pub mod cache;
pub mod memory;
pub mod redis;

pub use cache::{CacheKey, Clock, QueryCache, SystemClock};
pub use memory::MemoryCache;
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisCache};
