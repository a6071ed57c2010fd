//! 邮件通知

pub mod console;

pub use console::ConsoleNotifier;

use async_trait::async_trait;
use thiserror::Error;

/// 邮件发送失败
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

/// 验证码邮件发送；由调用方在后台任务中执行，失败只记录日志
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_otp_email(&self, email: &str, code: &str) -> Result<(), NotifyError>;
}

/// 验证码邮件正文
pub fn otp_email_body(code: &str) -> String {
    format!(
        "Hello,\n\n\
         Thank you for signing up with MugShot Studio!\n\n\
         Your verification code is: {}\n\n\
         Please enter this code in the app to verify your email address.\n\n\
         If you didn't sign up for MugShot Studio, please ignore this email.\n\n\
         Best regards,\n\
         The MugShot Studio Team",
        code
    )
}

pub const OTP_EMAIL_SUBJECT: &str = "MugShot Studio - Email Verification Code";
