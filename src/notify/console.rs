use async_trait::async_trait;

use super::{Notifier, NotifyError, OTP_EMAIL_SUBJECT, otp_email_body};

/// 未配置 SMTP 时使用：把邮件内容写入日志
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_otp_email(&self, email: &str, code: &str) -> Result<(), NotifyError> {
        tracing::info!(to = %email, subject = OTP_EMAIL_SUBJECT, "EMAIL SIMULATION");
        tracing::debug!(to = %email, "Body: {}", otp_email_body(code));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_notifier_never_fails() {
        assert!(ConsoleNotifier::new().send_otp_email("a@b.co", "123456").await.is_ok());
        assert!(otp_email_body("123456").contains("123456"));
    }
}
