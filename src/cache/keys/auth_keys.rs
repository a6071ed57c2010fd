/// 邮箱验证码键前缀
const OTP_PREFIX: &str = "otp_confirm:";

/// 密码重置令牌键前缀
const RESET_PASSWORD_PREFIX: &str = "reset_password:";

/// 邮箱确认链接令牌键前缀
const CONFIRM_EMAIL_PREFIX: &str = "confirm_email:";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成验证码键，每个邮箱至多一个
pub fn otp_key(email: &str) -> String {
    format!("{}{}", OTP_PREFIX, email)
}

pub fn reset_password_key(token: &str) -> String {
    format!("{}{}", RESET_PASSWORD_PREFIX, token)
}

pub fn confirm_email_key(token: &str) -> String {
    format!("{}{}", CONFIRM_EMAIL_PREFIX, token)
}

/// 生成限流计数键：身份（用户ID或IP）+ 路由路径
pub fn rate_limit_key(scope: &str, path: &str) -> String {
    format!("{}{}:{}", RATE_LIMIT_PREFIX, scope, path)
}
