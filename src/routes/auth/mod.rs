mod handler;
mod model;

pub use handler::{
    check_username, confirm, forgot_password, me, resend_confirmation, reset_password, signin,
    signup, start, verify_otp,
};
