use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    account::types::{
        EMAIL_CONFIRMED_MESSAGE, EMAIL_VERIFIED_MESSAGE, PASSWORD_RESET_MESSAGE, SIGNUP_MESSAGE,
    },
    database::User,
    error::{AppError, AppResult},
    middleware::AuthUser,
};

use super::model::{
    AppJson, ConfirmQuery, EmailRequest, MessageResponse, ResetPasswordRequest, SigninRequest,
    SigninResponse, SignupRequest, SignupResponse, StartRequest, StartResponse, TOKEN_TYPE,
    UsernameAvailableResponse, VerifyOtpRequest, VerifyOtpResponse,
};

pub async fn start(
    State(state): State<AppState>,
    AppJson(req): AppJson<StartRequest>,
) -> AppResult<AppJson<StartResponse>> {
    let outcome = state.accounts.start(&req.email).await?;
    Ok(AppJson(StartResponse {
        exists: outcome.exists,
        next: outcome.next,
    }))
}

pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.accounts.signup(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        AppJson(SignupResponse {
            user_id: outcome.user_id,
            message: SIGNUP_MESSAGE.to_string(),
            next: outcome.next,
        }),
    ))
}

pub async fn signin(
    State(state): State<AppState>,
    AppJson(req): AppJson<SigninRequest>,
) -> AppResult<AppJson<SigninResponse>> {
    let session = state.accounts.signin(&req.email, &req.password).await?;
    Ok(AppJson(SigninResponse {
        access_token: session.token.token,
        token_type: TOKEN_TYPE,
        expires_in: session.token.expires_in,
        user: session.user,
    }))
}

pub async fn confirm(
    State(state): State<AppState>,
    query: Result<Query<ConfirmQuery>, axum::extract::rejection::QueryRejection>,
) -> AppResult<AppJson<MessageResponse>> {
    let Query(query) = query?;
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Missing token".into()))?;

    state.accounts.confirm_email(&token).await?;
    Ok(AppJson(MessageResponse::new(EMAIL_CONFIRMED_MESSAGE)))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<VerifyOtpRequest>,
) -> AppResult<AppJson<VerifyOtpResponse>> {
    let session = state.accounts.verify_otp(&req.email, &req.code).await?;
    Ok(AppJson(VerifyOtpResponse {
        user_id: session.user.id,
        access_token: session.token.token,
        token_type: TOKEN_TYPE,
        expires_in: session.token.expires_in,
        user: session.user,
        message: EMAIL_VERIFIED_MESSAGE.to_string(),
    }))
}

pub async fn resend_confirmation(
    State(state): State<AppState>,
    AppJson(req): AppJson<EmailRequest>,
) -> AppResult<AppJson<MessageResponse>> {
    let message = state.accounts.resend_confirmation(&req.email).await?;
    Ok(AppJson(MessageResponse::new(message)))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<EmailRequest>,
) -> AppResult<AppJson<MessageResponse>> {
    let message = state.accounts.forgot_password(&req.email).await?;
    Ok(AppJson(MessageResponse::new(message)))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> AppResult<AppJson<MessageResponse>> {
    state
        .accounts
        .reset_password(&req.token, &req.new_password, &req.confirm_password)
        .await?;
    Ok(AppJson(MessageResponse::new(PASSWORD_RESET_MESSAGE)))
}

pub async fn check_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<AppJson<UsernameAvailableResponse>> {
    state.accounts.check_username(&username).await?;
    Ok(AppJson(UsernameAvailableResponse { available: true }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<AppJson<User>> {
    let user = state.accounts.current_user(auth.user_id).await?;
    Ok(AppJson(user))
}
