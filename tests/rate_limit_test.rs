//! 按路由的固定窗口限流

mod common;

use axum::http::{StatusCode, header};
use common::{TestApp, signup_body, test_config};
use serde_json::json;
use studio_auth::config::RateLimitRule;

#[tokio::test]
async fn fourth_signup_from_same_ip_is_limited() {
    let app = TestApp::new();

    for i in 0..3 {
        let resp = app
            .post_from(
                "10.0.0.1",
                "/auth/signup",
                signup_body(&format!("user{}@example.com", i), &format!("user{}", i), "secretpassword"),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
    }

    let resp = app
        .post_from(
            "10.0.0.1",
            "/auth/signup",
            signup_body("user3@example.com", "user3", "secretpassword"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.body["code"], 429);
    assert_eq!(resp.headers.get(header::RETRY_AFTER).unwrap(), "60");
    assert_eq!(app.users.user_count(), 3);

    // 其他 IP 不受影响
    let resp = app
        .post_from(
            "10.0.0.2",
            "/auth/signup",
            signup_body("user3@example.com", "user3", "secretpassword"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
}

#[tokio::test]
async fn limits_are_counted_per_route() {
    let mut config = test_config();
    config.rate_limits.forgot_password = RateLimitRule::new(1, 60);
    let app = TestApp::with_config(config);

    let body = json!({"email": "nobody@example.com"});
    let first = app.post_from("10.0.0.1", "/auth/forgot-password", body.clone()).await;
    assert_eq!(first.status, StatusCode::OK);
    let second = app.post_from("10.0.0.1", "/auth/forgot-password", body.clone()).await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);

    let other = app.post_from("10.0.0.1", "/auth/resend-confirmation", body).await;
    assert_eq!(other.status, StatusCode::OK);
}

#[tokio::test]
async fn start_is_not_limited() {
    let mut config = test_config();
    config.rate_limits.default = RateLimitRule::new(1, 60);
    let app = TestApp::with_config(config);

    for _ in 0..5 {
        let resp = app
            .post_from("10.0.0.1", "/auth/start", json!({"email": "a@example.com"}))
            .await;
        assert_eq!(resp.status, StatusCode::OK);
    }
}

#[tokio::test]
async fn rotating_forwarding_headers_from_untrusted_peer_is_still_limited() {
    let app = TestApp::new();

    let mut created = 0;
    let mut limited = 0;
    for i in 0..4 {
        let forged = format!("10.9.0.{}", i + 1);
        let resp = app
            .post_with(
                "203.0.113.7",
                "/auth/signup",
                signup_body(&format!("user{}@example.com", i), &format!("user{}", i), "secretpassword"),
                &[("x-real-ip", &forged), ("x-forwarded-for", &forged)],
            )
            .await;
        match resp.status {
            StatusCode::CREATED => created += 1,
            StatusCode::TOO_MANY_REQUESTS => limited += 1,
            other => panic!("unexpected status {}: {}", other, resp.body),
        }
    }

    assert_eq!((created, limited), (3, 1));
    assert_eq!(app.users.user_count(), 3);
}

#[tokio::test]
async fn trusted_proxy_forwards_client_address() {
    let mut config = test_config();
    config.trusted_proxies = vec!["192.168.0.10".parse().unwrap()];
    config.rate_limits.forgot_password = RateLimitRule::new(1, 60);
    let app = TestApp::with_config(config);

    let body = json!({"email": "nobody@example.com"});
    let first = app
        .post_with("192.168.0.10", "/auth/forgot-password", body.clone(), &[("x-real-ip", "10.0.0.1")])
        .await;
    assert_eq!(first.status, StatusCode::OK);

    // 同一代理后的不同客户端分别计数
    let other_client = app
        .post_with("192.168.0.10", "/auth/forgot-password", body.clone(), &[("x-real-ip", "10.0.0.2")])
        .await;
    assert_eq!(other_client.status, StatusCode::OK);

    let repeat = app
        .post_with("192.168.0.10", "/auth/forgot-password", body, &[("x-real-ip", "10.0.0.1")])
        .await;
    assert_eq!(repeat.status, StatusCode::TOO_MANY_REQUESTS);
}
