/// 速率限制计数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitCounter {
    pub key: String,
    pub count: u64,
    pub limit: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

impl RateLimitCounter {
    pub fn decision(&self) -> RateLimitDecision {
        if self.count > u64::from(self.limit) {
            RateLimitDecision::Limited
        } else {
            RateLimitDecision::Allowed
        }
    }
}
