use crate::cache::TtlStore;
use crate::cache::keys::rate_limit_key;
use crate::cache::models::RateLimitCounter;
use crate::config::RateLimitRule;
use crate::error::AppResult;

/// 固定窗口限流计数操作
///
/// 窗口边界处的突发请求最多可达规则上限的两倍，这是固定窗口算法的已知限制。
pub struct RateLimitOperations;

impl RateLimitOperations {
    /// 记录一次请求并返回窗口内的计数
    pub async fn hit(
        store: &dyn TtlStore,
        scope: &str,
        path: &str,
        rule: RateLimitRule,
    ) -> AppResult<RateLimitCounter> {
        let key = rate_limit_key(scope, path);
        let count = store.incr_with_expiry(&key, rule.window()).await?;

        Ok(RateLimitCounter {
            key,
            count,
            limit: rule.requests,
            window_secs: rule.window_secs,
        })
    }
}
