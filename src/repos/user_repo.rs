/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (UserStore trait + PostgreSQL 実装)
 * - DB エラーは RepoError に変換して返す (一意制約違反は Conflict)
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::models::UserRole;
use crate::repos::error::RepoError;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "userId")]
    pub id: i64,
    pub email: String,
    // argon2 PHC string
    pub password: String,
    pub nickname: String,
    #[sqlx(rename = "userRole", try_from = "String")]
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub role: UserRole,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// email が既に存在する場合は `RepoError::Conflict`
    async fn create(&self, new_user: NewUser) -> Result<UserRow, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, RepoError>;

    /// 対象ユーザーが存在しなければ `Ok(false)`
    async fn update_role(&self, user_id: i64, role: UserRole) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepo {
    async fn create(&self, new_user: NewUser) -> Result<UserRow, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password, nickname, "userRole")
            VALUES ($1, $2, $3, $4)
            RETURNING "userId", email, password, nickname, "userRole"
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.nickname)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT "userId", email, password, nickname, "userRole"
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_role(&self, user_id: i64, role: UserRole) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET "userRole" = $2, "modifiedAt" = now()
            WHERE "userId" = $1
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
