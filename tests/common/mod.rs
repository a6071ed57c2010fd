//! 集成测试公共工具

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{Value, json};
use studio_auth::{
    AppState,
    cache::{MemoryTtlStore, TtlStore, keys::otp_key},
    config::Config,
    database::MemoryUserStore,
    notify::{Notifier, NotifyError},
    router::build_router,
};
use tower::ServiceExt;

/// 只记录验证码邮件，不实际发送
#[derive(Default)]
pub struct MockNotifier {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn send_otp_email(&self, email: &str, code: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub cache: Arc<MemoryTtlStore>,
    pub notifier: Arc<MockNotifier>,
    next_peer: AtomicU32,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_config() -> Config {
    let mut config = Config::defaults("integration-secret");
    config.bcrypt_cost = 4;
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let cache = Arc::new(MemoryTtlStore::new());
        let notifier = Arc::new(MockNotifier::default());
        let state = AppState::new(config, users.clone(), cache.clone(), notifier.clone());

        Self {
            router: build_router(state),
            users,
            cache,
            notifier,
            next_peer: AtomicU32::new(1),
        }
    }

    /// 发送请求；`peer` 为连接的对端地址
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        peer: Option<IpAddr>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        if let Some(ip) = peer {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::new(ip, 40000)));
        }

        let resp = self.router.clone().oneshot(request).await.expect("request");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, &api(uri), Some(body), None, &[])
            .await
    }

    /// 从指定对端地址发起 POST
    pub async fn post_from(&self, peer: &str, uri: &str, body: Value) -> TestResponse {
        self.post_with(peer, uri, body, &[]).await
    }

    pub async fn post_with(
        &self,
        peer: &str,
        uri: &str,
        body: Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let peer = peer.parse().expect("peer address");
        self.request(Method::POST, &api(uri), Some(body), Some(peer), headers)
            .await
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.request(Method::GET, &api(uri), None, None, headers)
            .await
    }

    pub async fn current_otp(&self, email: &str) -> Option<String> {
        self.cache.get_value(&otp_key(email)).await.unwrap()
    }

    /// 每次调用使用不同的对端地址，避免触发注册限流
    fn fresh_peer(&self) -> String {
        let n = self.next_peer.fetch_add(1, Ordering::Relaxed);
        IpAddr::V4(Ipv4Addr::from(0x0a64_0000 + n)).to_string()
    }

    /// 使用默认资料注册，返回新用户ID
    pub async fn signup(&self, email: &str, username: &str, password: &str) -> String {
        let peer = self.fresh_peer();
        let resp = self
            .post_from(&peer, "/auth/signup", signup_body(email, username, password))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        resp.body["user_id"].as_str().unwrap().to_string()
    }
}

pub fn api(path: &str) -> String {
    format!("/api/v1{}", path)
}

pub fn signup_body(email: &str, username: &str, password: &str) -> Value {
    json!({
        "email": email,
        "password": password,
        "confirmPassword": password,
        "username": username,
        "fullName": "Test User",
        "dob": "2000-01-01",
        "newsletterOptIn": false
    })
}
