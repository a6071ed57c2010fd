use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{MethodRouter, get, post},
};

use crate::{
    AppState,
    config::RateLimitRule,
    middleware::{RateLimiter, log_errors, rate_limit},
    routes,
};

/// 为单个路由加上限流中间件
fn limited(
    route: MethodRouter<AppState>,
    limiter: &Arc<RateLimiter>,
    rule: RateLimitRule,
) -> MethodRouter<AppState> {
    route.layer(from_fn_with_state(limiter.rule(rule), rate_limit))
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let limiter = &state.limiter;
    let limits = &state.config.rate_limits;

    Router::new()
        .route("/auth/start", post(routes::auth::start))
        .route(
            "/auth/signup",
            limited(post(routes::auth::signup), limiter, limits.signup),
        )
        .route(
            "/auth/signin",
            limited(post(routes::auth::signin), limiter, limits.signin),
        )
        .route(
            "/auth/confirm",
            limited(post(routes::auth::confirm), limiter, limits.default),
        )
        .route(
            "/auth/verify-otp",
            limited(post(routes::auth::verify_otp), limiter, limits.default),
        )
        .route(
            "/auth/resend-confirmation",
            limited(
                post(routes::auth::resend_confirmation),
                limiter,
                limits.resend_confirmation,
            ),
        )
        .route(
            "/auth/forgot-password",
            limited(
                post(routes::auth::forgot_password),
                limiter,
                limits.forgot_password,
            ),
        )
        .route(
            "/auth/reset-password",
            limited(post(routes::auth::reset_password), limiter, limits.default),
        )
        .route(
            "/auth/check-username/{username}",
            get(routes::auth::check_username),
        )
        .route("/auth/me", get(routes::auth::me))
}

/// 构建完整的应用路由
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth_routes(&state))
        .route("/ping", get(routes::health::ping));

    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(base, api)
    };
    let router = router.layer(from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
