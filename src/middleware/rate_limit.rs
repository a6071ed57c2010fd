use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};

use crate::{
    cache::{RateLimitOperations, TtlStore, models::RateLimitDecision},
    config::RateLimitRule,
    error::AppError,
    utils::TokenCodec,
};

/// 固定窗口限流器
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
    codec: TokenCodec,
    trusted_proxies: Vec<IpAddr>,
}

/// 绑定到某个路由的限流规则，作为中间件状态
#[derive(Clone)]
pub struct RouteRateLimit {
    limiter: Arc<RateLimiter>,
    rule: RateLimitRule,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn TtlStore>, codec: TokenCodec, trusted_proxies: Vec<IpAddr>) -> Self {
        Self {
            store,
            codec,
            trusted_proxies,
        }
    }

    pub fn rule(self: &Arc<Self>, rule: RateLimitRule) -> RouteRateLimit {
        RouteRateLimit {
            limiter: Arc::clone(self),
            rule,
        }
    }

    /// 计数范围：有效会话令牌的用户ID，否则为客户端IP
    fn scope(&self, req: &Request<Body>) -> String {
        if let Some(user_id) = bearer_token(req.headers())
            .and_then(|token| self.codec.verify(token).ok())
            .map(|claims| claims.sub)
        {
            return format!("user:{}", user_id);
        }

        match self.client_ip(req) {
            Some(ip) => format!("ip:{}", ip),
            None => "ip:unknown".to_string(),
        }
    }

    /// 默认使用连接的对端地址；仅当对端是受信代理时才采信转发头
    fn client_ip(&self, req: &Request<Body>) -> Option<IpAddr> {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_canonical())?; // 双栈监听时 IPv4 对端为映射地址

        if !self.trusted_proxies.contains(&peer) {
            return Some(peer);
        }

        let headers = req.headers();
        let forwarded = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .or_else(|| {
                headers
                    .get("x-forwarded-for")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
                    .and_then(|s| s.trim().parse::<IpAddr>().ok())
            });
        Some(forwarded.unwrap_or(peer))
    }

    pub async fn check(
        &self,
        rule: RateLimitRule,
        req: Request<Body>,
        next: Next,
    ) -> Result<Response, AppError> {
        let scope = self.scope(&req);
        let path = req.uri().path().to_string();

        let counter = RateLimitOperations::hit(self.store.as_ref(), &scope, &path, rule).await?;

        if counter.decision() == RateLimitDecision::Limited {
            tracing::warn!(
                scope = %scope,
                path = %path,
                count = counter.count,
                "Rate limit exceeded"
            );
            return Err(AppError::RateLimitExceeded {
                retry_after_secs: rule.window_secs,
            });
        }

        Ok(next.run(req).await)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn rate_limit(
    State(route): State<RouteRateLimit>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    route.limiter.check(route.rule, req, next).await
}
