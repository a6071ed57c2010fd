use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;

use crate::cache::TtlStore;
use crate::cache::keys::{confirm_email_key, reset_password_key};
use crate::cache::models::token::parse_user_id;
use crate::cache::models::{ConfirmationToken, ResetToken};
use crate::error::{AppError, AppResult};

/// 32 字节随机数，URL 安全的 base64 编码（无填充）
pub fn generate_url_token() -> AppResult<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::Internal(format!("failed to generate token: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// 密码重置令牌缓存操作
pub struct ResetTokenOperations;

impl ResetTokenOperations {
    pub async fn issue(store: &dyn TtlStore, user_id: Uuid, ttl: Duration) -> AppResult<ResetToken> {
        let token = generate_url_token()?;
        store
            .set_value(&reset_password_key(&token), &user_id.to_string(), ttl)
            .await?;

        Ok(ResetToken {
            token,
            user_id,
            ttl_secs: ttl.as_secs(),
        })
    }

    /// 取出并删除令牌，返回绑定的用户ID
    pub async fn redeem(store: &dyn TtlStore, token: &str) -> AppResult<Uuid> {
        match store.take_value(&reset_password_key(token)).await? {
            Some(raw) => parse_user_id(&raw),
            None => Err(AppError::Token("Invalid or expired token".into())),
        }
    }
}

/// 邮箱确认令牌缓存操作
pub struct ConfirmationTokenOperations;

impl ConfirmationTokenOperations {
    pub async fn issue(
        store: &dyn TtlStore,
        user_id: Uuid,
        ttl: Duration,
    ) -> AppResult<ConfirmationToken> {
        let token = generate_url_token()?;
        store
            .set_value(&confirm_email_key(&token), &user_id.to_string(), ttl)
            .await?;

        Ok(ConfirmationToken { token, user_id })
    }

    pub async fn redeem(store: &dyn TtlStore, token: &str) -> AppResult<Uuid> {
        match store.take_value(&confirm_email_key(token)).await? {
            Some(raw) => parse_user_id(&raw),
            None => Err(AppError::Token("Invalid or expired token".into())),
        }
    }
}
