use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 用户数据库实体
///
/// `password_hash` 为空表示仅支持第三方登录的账号。
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub email_confirmed: bool,
    pub credits: i64,
    pub newsletter_opt_in: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn supports_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// 待插入的用户
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub credits: i64,
    pub newsletter_opt_in: bool,
}
