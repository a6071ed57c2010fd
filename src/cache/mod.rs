// 缓存模块
// 短期数据（验证码、重置令牌、限流计数）都存放在带过期时间的键值存储中

pub mod keys;
pub mod memory;
pub mod models;
pub mod operations;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

pub use memory::MemoryTtlStore;
pub use operations::{ConfirmationTokenOperations, OtpOperations, RateLimitOperations, ResetTokenOperations};
pub use redis_store::RedisTtlStore;

/// 带 TTL 的键值存储
///
/// 除基本的 set/get/delete 外，还要求三个原子操作，
/// 以避免"先检查后执行"的竞争：取出并删除、比较并删除、计数并设置过期。
#[async_trait]
pub trait TtlStore: Send + Sync {
    async fn set_value(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    async fn get_value(&self, key: &str) -> AppResult<Option<String>>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// 原子地读取并删除；并发调用中至多一个拿到值
    async fn take_value(&self, key: &str) -> AppResult<Option<String>>;

    /// 仅当当前值等于 `expected` 时删除，返回是否删除
    async fn delete_if_equals(&self, key: &str, expected: &str) -> AppResult<bool>;

    /// 原子自增；键没有过期时间时（新建或曾中断）设置为 `window`
    async fn incr_with_expiry(&self, key: &str, window: Duration) -> AppResult<u64>;
}
