use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::UserStore;
use crate::database::models::audit::{AuditEntry, NewAuditEntry};
use crate::database::models::user::{NewUser, User};
use crate::error::{AppError, AppResult};

/// 进程内用户存储，与 PostgreSQL 实现遵守相同的唯一性约束
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的审计日志（测试用）
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.read().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, HashMap<Uuid, User>>> {
        self.users
            .read()
            .map_err(|_| AppError::Internal("user store lock poisoned".into()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, HashMap<Uuid, User>>> {
        self.users
            .write()
            .map_err(|_| AppError::Internal("user store lock poisoned".into()))
    }

    fn update<F>(&self, id: Uuid, apply: F) -> AppResult<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.write()?;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.read()?.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .read()?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.write()?;
        if users.values().any(|u| u.username == new_user.username) {
            return Err(AppError::Conflict("Username already taken".into()));
        }
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            username: new_user.username,
            password_hash: new_user.password_hash,
            full_name: new_user.full_name,
            dob: new_user.dob,
            email_confirmed: false,
            credits: new_user.credits,
            newsletter_opt_in: new_user.newsletter_opt_in,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_email_confirmed(&self, id: Uuid) -> AppResult<User> {
        self.update(id, |u| u.email_confirmed = true)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<User> {
        self.update(id, |u| u.password_hash = Some(password_hash.to_string()))
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> AppResult<()> {
        let mut audit = self
            .audit
            .write()
            .map_err(|_| AppError::Internal("audit lock poisoned".into()))?;
        audit.push(AuditEntry {
            user_id: entry.user_id,
            action: entry.action.as_str().to_string(),
            delta_credits: entry.delta_credits,
            meta: entry.meta,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: Some("hash".to_string()),
            full_name: None,
            dob: None,
            credits: 100,
            newsletter_opt_in: false,
        }
    }

    #[tokio::test]
    async fn enforces_unique_username_and_email() {
        let store = MemoryUserStore::new();
        store.insert_user(new_user("a@b.co", "alice")).await.unwrap();

        let err = store
            .insert_user(new_user("other@b.co", "alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = store
            .insert_user(new_user("a@b.co", "alice2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn updates_missing_user_is_not_found() {
        let store = MemoryUserStore::new();
        let err = store.set_email_confirmed(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
