use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::TtlStore;
use crate::error::{AppError, AppResult};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// 进程内 TTL 存储，用于测试及无 Redis 的本地运行
///
/// 使用 tokio 的时钟，因此在 `start_paused` 测试中可以通过 `tokio::time::advance` 推进过期。
#[derive(Default)]
pub struct MemoryTtlStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 强制使某个键立即过期
    pub fn expire(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    /// 剩余存活时间；键不存在返回 None
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key).filter(|e| e.is_live(now))?;
        entry
            .expires_at
            .map(|at| at.saturating_duration_since(now))
    }

    /// 当前存活的键数量
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, HashMap<String, Entry>>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("ttl store lock poisoned".into()))?;
        let now = Instant::now();
        entries.retain(|_, e| e.is_live(now));
        Ok(entries)
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn set_value(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get_value(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.lock()?;
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn take_value(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.remove(key).map(|e| e.value))
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> AppResult<bool> {
        let mut entries = self.lock()?;
        if entries.get(key).is_some_and(|e| e.value == expected) {
            entries.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn incr_with_expiry(&self, key: &str, window: Duration) -> AppResult<u64> {
        let mut entries = self.lock()?;
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });
        let count = entry
            .value
            .parse::<u64>()
            .map_err(|_| AppError::Internal(format!("value at {} is not an integer", key)))?
            + 1;
        entry.value = count.to_string();
        if entry.expires_at.is_none() {
            entry.expires_at = Some(Instant::now() + window);
        }
        Ok(count)
    }
}
