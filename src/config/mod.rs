use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// 单个路由的限流规则：窗口内最多 `requests` 次请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct RateLimitRule {
    pub requests: u32,
    pub window_secs: u64,
}

impl RateLimitRule {
    pub const fn new(requests: u32, window_secs: u64) -> Self {
        Self {
            requests,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl FromStr for RateLimitRule {
    type Err = String;

    /// 格式 `"<requests>/<window secs>"`，例如 `"3/60"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (requests, window) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("invalid rate limit rule: {}", s))?;
        let requests = requests
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid request count in {}: {}", s, e))?;
        let window_secs = window
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid window in {}: {}", s, e))?;
        if window_secs == 0 {
            return Err(format!("rate limit window must be positive: {}", s));
        }
        Ok(Self::new(requests, window_secs))
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RateLimits {
    pub signup: RateLimitRule,
    pub signin: RateLimitRule,
    pub resend_confirmation: RateLimitRule,
    pub forgot_password: RateLimitRule,
    /// 其余写接口（confirm、verify-otp、reset-password）
    pub default: RateLimitRule,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            signup: RateLimitRule::new(3, 60),
            signin: RateLimitRule::new(5, 60),
            resend_confirmation: RateLimitRule::new(3, 60),
            forgot_password: RateLimitRule::new(3, 60),
            default: RateLimitRule::new(10, 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    pub otp_ttl_secs: u64,
    pub reset_token_ttl_secs: u64,
    pub confirm_token_ttl_secs: u64,
    pub bcrypt_cost: u32,
    pub store_timeout_ms: u64,
    pub signup_credits: i64,
    pub frontend_url: String,
    pub rate_limits: RateLimits,
    /// 只有来自这些地址的请求才会采信 X-Real-IP / X-Forwarded-For
    pub trusted_proxies: Vec<IpAddr>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub log_format: LogFormat,
}

impl Config {
    /// 全部使用默认值的配置，仅需提供签名密钥
    pub fn defaults(jwt_secret: impl Into<String>) -> Self {
        Config {
            database_url: String::new(),
            redis_url: String::new(),
            jwt_secret: jwt_secret.into(),
            jwt_expiration_minutes: 15,
            otp_ttl_secs: 600,
            reset_token_ttl_secs: 600,
            confirm_token_ttl_secs: 86_400,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            store_timeout_ms: 3_000,
            signup_credits: 100,
            frontend_url: "http://localhost:3000".to_string(),
            rate_limits: RateLimits::default(),
            trusted_proxies: Vec::new(),
            server_host: "::".to_string(),
            server_port: 3000,
            api_base_uri: "/api/v1".to_string(),
            log_format: LogFormat::Pretty,
        }
    }

    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let mut config = Config::defaults(env::var("JWT_SECRET")?);
        config.database_url = env::var("DATABASE_URL")?;
        config.redis_url = env::var("REDIS_URL")?;

        override_parsed("JWT_EXPIRATION_MINUTES", &mut config.jwt_expiration_minutes);
        override_parsed("OTP_TTL_SECS", &mut config.otp_ttl_secs);
        override_parsed("RESET_TOKEN_TTL_SECS", &mut config.reset_token_ttl_secs);
        override_parsed("CONFIRM_TOKEN_TTL_SECS", &mut config.confirm_token_ttl_secs);
        override_parsed("BCRYPT_COST", &mut config.bcrypt_cost);
        override_parsed("STORE_TIMEOUT_MS", &mut config.store_timeout_ms);
        override_parsed("SIGNUP_CREDITS", &mut config.signup_credits);
        override_parsed("SERVER_PORT", &mut config.server_port);
        override_parsed("RATE_LIMIT_SIGNUP", &mut config.rate_limits.signup);
        override_parsed("RATE_LIMIT_SIGNIN", &mut config.rate_limits.signin);
        override_parsed(
            "RATE_LIMIT_RESEND_CONFIRMATION",
            &mut config.rate_limits.resend_confirmation,
        );
        override_parsed(
            "RATE_LIMIT_FORGOT_PASSWORD",
            &mut config.rate_limits.forgot_password,
        );
        override_parsed("RATE_LIMIT_DEFAULT", &mut config.rate_limits.default);

        if let Ok(host) = env::var("SERVER_HOST") {
            config.server_host = host;
        }
        if let Ok(base) = env::var("API_BASE_URI") {
            config.api_base_uri = base;
        }
        if let Ok(url) = env::var("FRONTEND_URL") {
            config.frontend_url = url;
        }
        if let Ok(raw) = env::var("TRUSTED_PROXIES") {
            config.trusted_proxies = parse_trusted_proxies(&raw);
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            config.log_format = parse_log_format(&format);
        }

        Ok(config)
    }

    pub fn jwt_expiration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.jwt_expiration_minutes)
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::from_secs(self.otp_ttl_secs)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_secs)
    }

    pub fn confirm_token_ttl(&self) -> Duration {
        Duration::from_secs(self.confirm_token_ttl_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_log_format(value: &str) -> LogFormat {
    if value.eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    }
}

/// 逗号分隔的代理地址列表，无法解析的条目告警后跳过
fn parse_trusted_proxies(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(e) => {
                tracing::warn!("Ignoring invalid trusted proxy {:?}: {}", s, e);
                None
            }
        })
        .collect()
}

/// 环境变量存在且可解析时覆盖默认值，解析失败则保留默认值并告警
fn override_parsed<T>(name: &str, target: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(e) => tracing::warn!("Ignoring invalid {}={:?}: {}", name, raw, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rate_limit_rule() {
        let rule: RateLimitRule = "3/60".parse().unwrap();
        assert_eq!(rule, RateLimitRule::new(3, 60));
        assert_eq!(rule.window(), Duration::from_secs(60));

        let spaced: RateLimitRule = " 5 / 30 ".parse().unwrap();
        assert_eq!(spaced, RateLimitRule::new(5, 30));
    }

    #[test]
    fn rejects_malformed_rate_limit_rule() {
        assert!("3".parse::<RateLimitRule>().is_err());
        assert!("a/60".parse::<RateLimitRule>().is_err());
        assert!("3/0".parse::<RateLimitRule>().is_err());
    }

    #[test]
    fn defaults_follow_documented_values() {
        let config = Config::defaults("secret");
        assert_eq!(config.jwt_expiration(), chrono::Duration::minutes(15));
        assert_eq!(config.otp_ttl(), Duration::from_secs(600));
        assert_eq!(config.reset_token_ttl(), Duration::from_secs(600));
        assert_eq!(config.rate_limits.signup, RateLimitRule::new(3, 60));
        assert_eq!(config.rate_limits.signin, RateLimitRule::new(5, 60));
        assert_eq!(config.signup_credits, 100);
    }

    #[test]
    fn parses_trusted_proxies() {
        let proxies = parse_trusted_proxies(" 10.0.0.1, ::1 ,not-an-ip,, ");
        assert_eq!(
            proxies,
            vec![
                "10.0.0.1".parse::<IpAddr>().unwrap(),
                "::1".parse::<IpAddr>().unwrap()
            ]
        );
        assert!(Config::defaults("secret").trusted_proxies.is_empty());
    }

    #[test]
    fn log_format_is_case_insensitive() {
        assert_eq!(parse_log_format("JSON"), LogFormat::Json);
        assert_eq!(parse_log_format("pretty"), LogFormat::Pretty);
        assert_eq!(parse_log_format("anything"), LogFormat::Pretty);
    }
}
