/// 缓存操作
/// 验证码、一次性令牌与限流计数的签发、校验和消费

pub mod otp;
pub mod rate_limit;
pub mod token;

pub use otp::OtpOperations;
pub use rate_limit::RateLimitOperations;
pub use token::{ConfirmationTokenOperations, ResetTokenOperations};
