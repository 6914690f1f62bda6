//! PostgreSQL user repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::DomainError;
use crate::domain::user::{User, UserRepository};
use crate::infrastructure::storage::postgres::map_write_error;

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get(&self, username: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT username, password_hash, display_name, email, is_active,
                   created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, display_name, email, is_active,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.username())
        .bind(user.password_hash())
        .bind(user.display_name())
        .bind(user.email())
        .bind(user.is_active())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, "create user", || {
                DomainError::duplicate_username(user.username())
            })
        })?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, display_name = $3, email = $4, is_active = $5,
                updated_at = $6
            WHERE username = $1
            "#,
        )
        .bind(user.username())
        .bind(user.password_hash())
        .bind(user.display_name())
        .bind(user.email())
        .bind(user.is_active())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update user: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.username()
            )));
        }

        Ok(user.clone())
    }

    async fn delete(&self, username: &str) -> Result<bool, DomainError> {
        // api_tokens rows go with the user through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT username, password_hash, display_name, email, is_active,
                   created_at, updated_at
            FROM users
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        Ok(rows.iter().map(row_to_user).collect())
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    User::restore(
        row.get("username"),
        row.get("password_hash"),
        row.get("display_name"),
        row.get("email"),
        row.get("is_active"),
        created_at,
        updated_at,
    )
}
