use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult, Script, aio::MultiplexedConnection};

use super::TtlStore;
use crate::error::AppResult;

/// 自增后若键没有过期时间则补设，避免进程在 INCR 与 EXPIRE 之间崩溃导致计数永不过期
const INCR_WITH_EXPIRY: &str = r#"
local count = redis.call('INCR', KEYS[1])
if redis.call('TTL', KEYS[1]) < 0 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

const DELETE_IF_EQUALS: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// Redis 实现，所有请求共享一个多路复用连接
#[derive(Clone)]
pub struct RedisTtlStore {
    conn: MultiplexedConnection,
    timeout: Duration,
    incr_script: Script,
    delete_if_equals_script: Script,
}

impl RedisTtlStore {
    pub async fn connect(client: &redis::Client, timeout: Duration) -> AppResult<Self> {
        let conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection()).await??;
        Ok(Self {
            conn,
            timeout,
            incr_script: Script::new(INCR_WITH_EXPIRY),
            delete_if_equals_script: Script::new(DELETE_IF_EQUALS),
        })
    }

    async fn bounded<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = RedisResult<T>> + Send,
    {
        Ok(tokio::time::timeout(self.timeout, fut).await??)
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl TtlStore for RedisTtlStore {
    async fn set_value(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let mut conn = self.conn.clone();
        self.bounded(conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)))
            .await
    }

    async fn get_value(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        self.bounded(conn.del::<_, ()>(key)).await
    }

    async fn take_value(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded(conn.get_del::<_, Option<String>>(key)).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .bounded(async {
                self.delete_if_equals_script
                    .key(key)
                    .arg(expected)
                    .invoke_async(&mut conn)
                    .await
            })
            .await?;
        Ok(deleted > 0)
    }

    async fn incr_with_expiry(&self, key: &str, window: Duration) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        let count: i64 = self
            .bounded(async {
                self.incr_script
                    .key(key)
                    .arg(ttl_secs(window))
                    .invoke_async(&mut conn)
                    .await
            })
            .await?;
        Ok(count.max(0) as u64)
    }
}
