// 数据库模块
// 用户记录与审计日志的存储

pub mod models; // 数据库实体定义
pub mod repositories; // 存储实现

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;

pub use models::audit::{AuditAction, AuditEntry, NewAuditEntry};
pub use models::user::{NewUser, User};
pub use repositories::memory::MemoryUserStore;
pub use repositories::user::PgUserStore;

/// 用户记录存储
///
/// 邮箱与用户名的唯一性由存储层保证，冲突时返回 `AppError::Conflict`。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    /// 标记邮箱已验证，返回更新后的记录
    async fn set_email_confirmed(&self, id: Uuid) -> AppResult<User>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<User>;

    async fn append_audit(&self, entry: NewAuditEntry) -> AppResult<()>;
}
