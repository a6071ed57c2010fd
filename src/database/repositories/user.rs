use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::UserStore;
use crate::database::models::audit::NewAuditEntry;
use crate::database::models::user::{NewUser, User};
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str = "id, email, username, password_hash, full_name, dob, \
     email_confirmed, credits, newsletter_opt_in, created_at";

/// PostgreSQL 用户存储
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        tokio::time::timeout(self.timeout, fut)
            .await?
            .map_err(map_sqlx_error)
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        self.bounded(
            sqlx::query_as::<_, User>(&sql)
                .bind(value)
                .fetch_optional(&self.pool),
        )
        .await
    }
}

/// 在存储边界把数据库错误转换为服务错误
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            Some("23505") => {
                let message = match db.constraint() {
                    Some(c) if c.contains("username") => "Username already taken",
                    Some(c) if c.contains("email") => "Email already registered",
                    _ => "Account already exists",
                };
                return AppError::Conflict(message.to_string());
            }
            Some("42501") => return AppError::Permission(db.message().to_string()),
            _ => {}
        }
        if db.message().to_lowercase().contains("row-level security") {
            return AppError::Permission(db.message().to_string());
        }
    }
    AppError::Internal(format!("database: {}", e))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        self.bounded(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users
                (id, email, username, password_hash, full_name, dob,
                 email_confirmed, credits, newsletter_opt_in)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let result = self
            .bounded(
                sqlx::query_as::<_, User>(&sql)
                    .bind(Uuid::new_v4())
                    .bind(&user.email)
                    .bind(&user.username)
                    .bind(&user.password_hash)
                    .bind(&user.full_name)
                    .bind(user.dob)
                    .bind(user.credits)
                    .bind(user.newsletter_opt_in)
                    .fetch_one(&self.pool),
            )
            .await;

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Created user");
                Ok(user)
            }
            Err(e) => {
                tracing::error!("Failed to create user: {:?}", e);
                Err(e)
            }
        }
    }

    async fn set_email_confirmed(&self, id: Uuid) -> AppResult<User> {
        let sql = format!(
            "UPDATE users SET email_confirmed = TRUE WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        self.bounded(
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<User> {
        let sql = format!(
            "UPDATE users SET password_hash = $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        self.bounded(
            sqlx::query_as::<_, User>(&sql)
                .bind(password_hash)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> AppResult<()> {
        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO audit (user_id, action, delta_credits, meta)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(entry.user_id)
            .bind(entry.action.as_str())
            .bind(entry.delta_credits)
            .bind(&entry.meta)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
