use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::User;
use crate::utils::IssuedToken;

/// 防枚举：无论账号是否存在都返回相同文案
pub const RESEND_CONFIRMATION_MESSAGE: &str = "If account exists, confirmation email sent";
pub const FORGOT_PASSWORD_MESSAGE: &str = "If account exists, reset instructions sent";

pub const SIGNUP_MESSAGE: &str =
    "User created successfully. Please check your email for confirmation code.";
pub const EMAIL_VERIFIED_MESSAGE: &str = "Email verified successfully";
pub const EMAIL_CONFIRMED_MESSAGE: &str = "Email confirmed successfully";
pub const PASSWORD_RESET_MESSAGE: &str = "Password reset successfully";

/// 客户端下一步应进行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    CreateAccount,
    Password,
    SocialLogin,
    ConfirmEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOutcome {
    pub exists: bool,
    pub next: NextStep,
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub username: String,
    pub full_name: String,
    pub dob: NaiveDate,
    pub newsletter_opt_in: bool,
}

#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub user_id: Uuid,
    pub next: NextStep,
}

/// 登录或验证成功后签发的会话
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub token: IssuedToken,
    pub user: User,
}
