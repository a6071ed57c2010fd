use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// 密码重置令牌，一次性使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: String,
    pub user_id: Uuid,
    pub ttl_secs: u64,
}

/// 邮箱确认链接令牌，一次性使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationToken {
    pub token: String,
    pub user_id: Uuid,
}

/// 缓存中保存的用户ID必须是合法 UUID
pub(crate) fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| AppError::Internal(format!("malformed user id in token store: {}", e)))
}
