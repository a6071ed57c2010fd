/// 缓存键模块
/// 提供各种缓存键生成函数

// 认证相关缓存键
pub mod auth_keys;

pub use auth_keys::{confirm_email_key, otp_key, rate_limit_key, reset_password_key};
