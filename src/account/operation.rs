use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::types::{
    FORGOT_PASSWORD_MESSAGE, NextStep, RESEND_CONFIRMATION_MESSAGE, SessionOutcome, SignupInput,
    SignupOutcome, StartOutcome,
};
use super::validation::{is_valid_username, require_email, require_matching_passwords};
use crate::cache::{
    ConfirmationTokenOperations, OtpOperations, ResetTokenOperations, TtlStore,
};
use crate::config::Config;
use crate::database::{AuditAction, NewAuditEntry, NewUser, User, UserStore};
use crate::error::{AppError, AppResult};
use crate::notify::Notifier;
use crate::utils::{PasswordHasher, TokenCodec};

/// 账号状态机
///
/// 账号状态：未验证（`email_confirmed = false`）→ 已验证。
/// 密码重置是独立流程，除重置令牌外不保存任何状态。
pub struct AccountService {
    users: Arc<dyn UserStore>,
    cache: Arc<dyn TtlStore>,
    notifier: Arc<dyn Notifier>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    config: Arc<Config>,
}

impl AccountService {
    pub fn new(
        config: Arc<Config>,
        users: Arc<dyn UserStore>,
        cache: Arc<dyn TtlStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            cache,
            notifier,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            codec: TokenCodec::new(&config.jwt_secret, config.jwt_expiration()),
            config,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// 根据邮箱判断下一步：注册、密码登录或第三方登录
    pub async fn start(&self, email: &str) -> AppResult<StartOutcome> {
        let email = require_email(email)?;

        let outcome = match self.users.find_by_email(&email).await? {
            None => StartOutcome {
                exists: false,
                next: NextStep::CreateAccount,
            },
            Some(user) if user.supports_password() => StartOutcome {
                exists: true,
                next: NextStep::Password,
            },
            Some(_) => StartOutcome {
                exists: true,
                next: NextStep::SocialLogin,
            },
        };
        Ok(outcome)
    }

    pub async fn signup(&self, input: SignupInput) -> AppResult<SignupOutcome> {
        require_matching_passwords(&input.password, &input.confirm_password)?;
        let email = require_email(&input.email)?;
        if !is_valid_username(&input.username) {
            return Err(AppError::Validation(
                "Username must be 3-30 characters of letters, digits, '.', '_' or '-'".into(),
            ));
        }

        // 并发注册可能同时通过此检查，最终以存储层唯一约束为准
        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".into()));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user = self
            .users
            .insert_user(NewUser {
                email: email.clone(),
                username: input.username,
                password_hash: Some(password_hash),
                full_name: Some(input.full_name),
                dob: Some(input.dob),
                credits: self.config.signup_credits,
                newsletter_opt_in: input.newsletter_opt_in,
            })
            .await?;

        let otp = OtpOperations::issue(self.cache.as_ref(), &email, self.config.otp_ttl()).await?;

        let confirmation = ConfirmationTokenOperations::issue(
            self.cache.as_ref(),
            user.id,
            self.config.confirm_token_ttl(),
        )
        .await?;
        tracing::info!(
            user_id = %user.id,
            "Confirm email link: {}/auth/confirm?token={}",
            self.frontend_base(),
            confirmation.token
        );

        self.users
            .append_audit(NewAuditEntry {
                user_id: user.id,
                action: AuditAction::UserSignup,
                delta_credits: 0,
                meta: json!({ "email": email }),
            })
            .await?;

        self.dispatch_otp(email, otp.code);

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(SignupOutcome {
            user_id: user.id,
            next: NextStep::ConfirmEmail,
        })
    }

    /// 邮箱不存在与密码错误返回同一个错误
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<SessionOutcome> {
        let email = require_email(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AppError::InvalidCredentials);
        };

        match self.hasher.verify(password, password_hash) {
            Ok(true) => {}
            Ok(false) => return Err(AppError::InvalidCredentials),
            Err(e) => {
                tracing::error!(user_id = %user.id, "Stored password hash unusable: {}", e);
                return Err(AppError::InvalidCredentials);
            }
        }

        let token = self.codec.issue(user.id)?;
        tracing::info!(user_id = %user.id, "User signed in");
        Ok(SessionOutcome { token, user })
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> AppResult<SessionOutcome> {
        let email = require_email(email)?;

        OtpOperations::check(self.cache.as_ref(), &email, code).await?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        OtpOperations::consume(self.cache.as_ref(), &email, code).await?;

        let user = self.users.set_email_confirmed(user.id).await?;
        let token = self.codec.issue(user.id)?;

        tracing::info!(user_id = %user.id, "Email verified by OTP");
        Ok(SessionOutcome { token, user })
    }

    pub async fn resend_confirmation(&self, email: &str) -> AppResult<&'static str> {
        let email = require_email(email)?;

        match self.users.find_by_email(&email).await? {
            None => {
                tracing::debug!("Resend confirmation for unknown email ignored");
            }
            Some(user) if user.email_confirmed => {
                tracing::debug!(user_id = %user.id, "Resend confirmation for confirmed account ignored");
            }
            Some(user) => {
                let otp =
                    OtpOperations::issue(self.cache.as_ref(), &email, self.config.otp_ttl()).await?;
                self.dispatch_otp(email, otp.code);
                tracing::info!(user_id = %user.id, "Resent confirmation code");
            }
        }

        Ok(RESEND_CONFIRMATION_MESSAGE)
    }

    /// 重置链接只写入日志，不在响应中返回
    pub async fn forgot_password(&self, email: &str) -> AppResult<&'static str> {
        let email = require_email(email)?;

        if let Some(user) = self.users.find_by_email(&email).await? {
            let reset = ResetTokenOperations::issue(
                self.cache.as_ref(),
                user.id,
                self.config.reset_token_ttl(),
            )
            .await?;
            tracing::info!(
                user_id = %user.id,
                "Reset password link: {}/auth/reset-password?token={}",
                self.frontend_base(),
                reset.token
            );
        }

        Ok(FORGOT_PASSWORD_MESSAGE)
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> AppResult<()> {
        require_matching_passwords(new_password, confirm_password)?;

        let user_id = ResetTokenOperations::redeem(self.cache.as_ref(), token).await?;

        let password_hash = self.hasher.hash(new_password)?;
        self.users.set_password_hash(user_id, &password_hash).await?;

        self.users
            .append_audit(NewAuditEntry {
                user_id,
                action: AuditAction::PasswordReset,
                delta_credits: 0,
                meta: json!({}),
            })
            .await?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    pub async fn confirm_email(&self, token: &str) -> AppResult<()> {
        let user_id = ConfirmationTokenOperations::redeem(self.cache.as_ref(), token).await?;
        self.users.set_email_confirmed(user_id).await?;
        tracing::info!(user_id = %user_id, "Email confirmed by link");
        Ok(())
    }

    /// 用户名已被占用时返回 `Conflict`
    pub async fn check_username(&self, username: &str) -> AppResult<()> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".into()));
        }
        Ok(())
    }

    /// 会话令牌持有者只能读取自己的记录
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Authentication)
    }

    fn frontend_base(&self) -> &str {
        self.config.frontend_url.trim_end_matches('/')
    }

    /// 后台发送验证码邮件，失败只记录日志
    fn dispatch_otp(&self, email: String, code: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send_otp_email(&email, &code).await {
                tracing::warn!(email = %email, "Failed to send OTP email: {}", e);
            }
        });
    }
}
