/// 缓存数据模型
/// 在存储边界把原始字符串值转换为明确的类型

pub mod otp;
pub mod rate_limit;
pub mod token;

pub use otp::OtpEntry;
pub use rate_limit::{RateLimitCounter, RateLimitDecision};
pub use token::{ConfirmationToken, ResetToken};
