use std::sync::Arc;

use config::Config;

pub mod account;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod router;
pub mod routes;
pub mod utils;

use account::AccountService;
use cache::TtlStore;
use database::UserStore;
use middleware::RateLimiter;
use notify::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<AccountService>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// 由配置与各存储实现组装应用状态
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        cache: Arc<dyn TtlStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let config = Arc::new(config);
        let accounts = Arc::new(AccountService::new(
            Arc::clone(&config),
            users,
            Arc::clone(&cache),
            notifier,
        ));
        let limiter = Arc::new(RateLimiter::new(
            cache,
            accounts.codec().clone(),
            config.trusted_proxies.clone(),
        ));

        Self {
            config,
            accounts,
            limiter,
        }
    }
}
