// 账号模块
// 注册、邮箱验证、登录与密码重置的状态流转

mod operation;
pub mod types;
pub mod validation;

pub use operation::AccountService;
pub use types::{
    FORGOT_PASSWORD_MESSAGE, NextStep, RESEND_CONFIRMATION_MESSAGE, SessionOutcome, SignupInput,
    SignupOutcome, StartOutcome,
};
