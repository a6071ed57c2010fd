use std::time::Duration;

use rand::Rng;

use crate::cache::TtlStore;
use crate::cache::keys::otp_key;
use crate::cache::models::OtpEntry;
use crate::error::{AppError, AppResult};

/// 生成 000000-999999 均匀分布的6位验证码，保留前导零
pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// 邮箱验证码缓存操作
pub struct OtpOperations;

impl OtpOperations {
    /// 签发新验证码，覆盖该邮箱之前的验证码
    pub async fn issue(store: &dyn TtlStore, email: &str, ttl: Duration) -> AppResult<OtpEntry> {
        let code = generate_otp();
        store.set_value(&otp_key(email), &code, ttl).await?;
        tracing::debug!(email = %email, "Issued OTP");

        Ok(OtpEntry {
            email: email.to_string(),
            code,
            ttl_secs: ttl.as_secs(),
        })
    }

    /// 校验验证码但不消费；不匹配时保留原验证码
    pub async fn check(store: &dyn TtlStore, email: &str, code: &str) -> AppResult<()> {
        match store.get_value(&otp_key(email)).await? {
            None => Err(AppError::Token("OTP expired or not found".into())),
            Some(stored) if stored != code => Err(AppError::Token("Invalid OTP code".into())),
            Some(_) => Ok(()),
        }
    }

    /// 原子地消费验证码；并发请求中只有一个能成功
    pub async fn consume(store: &dyn TtlStore, email: &str, code: &str) -> AppResult<()> {
        if store.delete_if_equals(&otp_key(email), code).await? {
            Ok(())
        } else {
            Err(AppError::Token("OTP expired or not found".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTtlStore;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..1000 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn reissue_overwrites_previous_code() {
        let store = MemoryTtlStore::new();
        let ttl = Duration::from_secs(600);
        let first = OtpOperations::issue(&store, "a@b.co", ttl).await.unwrap();
        let second = OtpOperations::issue(&store, "a@b.co", ttl).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get_value(&otp_key("a@b.co")).await.unwrap(),
            Some(second.code.clone())
        );
        if first.code != second.code {
            assert!(OtpOperations::check(&store, "a@b.co", &first.code).await.is_err());
        }
    }

    #[tokio::test]
    async fn mismatch_keeps_entry() {
        let store = MemoryTtlStore::new();
        store
            .set_value(&otp_key("a@b.co"), "123456", Duration::from_secs(600))
            .await
            .unwrap();

        let err = OtpOperations::check(&store, "a@b.co", "654321").await.unwrap_err();
        assert!(matches!(err, AppError::Token(_)));
        assert!(OtpOperations::check(&store, "a@b.co", "123456").await.is_ok());
    }

    #[tokio::test]
    async fn consume_succeeds_once() {
        let store = MemoryTtlStore::new();
        store
            .set_value(&otp_key("a@b.co"), "123456", Duration::from_secs(600))
            .await
            .unwrap();

        OtpOperations::consume(&store, "a@b.co", "123456").await.unwrap();
        let err = OtpOperations::consume(&store, "a@b.co", "123456").await.unwrap_err();
        assert!(matches!(err, AppError::Token(_)));
    }

    #[tokio::test]
    async fn missing_code_is_token_error() {
        let store = MemoryTtlStore::new();
        let err = OtpOperations::check(&store, "nobody@b.co", "123456").await.unwrap_err();
        assert!(matches!(err, AppError::Token(_)));
    }
}
