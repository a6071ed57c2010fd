use axum::{extract::FromRequest, response::IntoResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::{NextStep, SignupInput};
use crate::database::User;
use crate::error::AppError;

/// JSON 提取器，解析失败时返回 `AppError::Validation`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub exists: bool,
    pub next: NextStep,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub username: String,
    pub full_name: String,
    pub dob: NaiveDate,
    #[serde(default)]
    pub newsletter_opt_in: bool,
}

impl From<SignupRequest> for SignupInput {
    fn from(req: SignupRequest) -> Self {
        SignupInput {
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
            username: req.username,
            full_name: req.full_name,
            dob: req.dob,
            newsletter_opt_in: req.newsletter_opt_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub message: String,
    pub next: NextStep,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub user_id: Uuid,
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsernameAvailableResponse {
    pub available: bool,
}

pub const TOKEN_TYPE: &str = "bearer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_request_reads_camel_case() {
        let req: SignupRequest = serde_json::from_value(serde_json::json!({
            "email": "a@b.co",
            "password": "pw",
            "confirmPassword": "pw",
            "username": "alice",
            "fullName": "Alice",
            "dob": "2000-01-01"
        }))
        .unwrap();
        assert_eq!(req.confirm_password, "pw");
        assert_eq!(req.full_name, "Alice");
        assert!(!req.newsletter_opt_in);
        assert_eq!(req.dob, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    }

    #[test]
    fn signup_request_rejects_bad_dob() {
        let result = serde_json::from_value::<SignupRequest>(serde_json::json!({
            "email": "a@b.co",
            "password": "pw",
            "confirmPassword": "pw",
            "username": "alice",
            "fullName": "Alice",
            "dob": "01/01/2000"
        }));
        assert!(result.is_err());
    }
}
