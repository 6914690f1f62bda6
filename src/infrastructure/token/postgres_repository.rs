//! PostgreSQL API token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::token::{ApiToken, ApiTokenRepository};
use crate::infrastructure::storage::postgres::map_write_error;

#[derive(Debug, Clone)]
pub struct PostgresApiTokenRepository {
    pool: PgPool,
}

impl PostgresApiTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiTokenRepository for PostgresApiTokenRepository {
    async fn create(&self, token: ApiToken) -> Result<ApiToken, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO api_tokens (id, username, token_hash, description, expires_at,
                                    created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.id())
        .bind(token.username())
        .bind(token.token_hash())
        .bind(token.description())
        .bind(token.expires_at())
        .bind(token.created_at())
        .bind(token.last_used_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, "create API token", || {
                DomainError::internal("Token hash collision")
            })
        })?;

        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<ApiToken>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, token_hash, description, expires_at, created_at, last_used_at
            FROM api_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up API token: {}", e)))?;

        Ok(row.as_ref().map(row_to_token))
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_owned(&self, username: &str, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE id = $1 AND username = $2")
            .bind(id)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, username: &str) -> Result<Vec<ApiToken>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, token_hash, description, expires_at, created_at, last_used_at
            FROM api_tokens
            WHERE username = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list API tokens: {}", e)))?;

        Ok(rows.iter().map(row_to_token).collect())
    }

    async fn record_usage(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE api_tokens SET last_used_at = $2 WHERE token_hash = $1")
            .bind(token_hash)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record token usage: {}", e)))?;

        Ok(())
    }

    async fn delete_for_user(&self, username: &str) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM api_tokens WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API tokens: {}", e)))?;

        Ok(result.rows_affected())
    }
}

fn row_to_token(row: &sqlx::postgres::PgRow) -> ApiToken {
    let id: Uuid = row.get("id");
    let token_hash: String = row.get("token_hash");
    let expires_at: DateTime<Utc> = row.get("expires_at");
    let created_at: DateTime<Utc> = row.get("created_at");
    let last_used_at: Option<DateTime<Utc>> = row.get("last_used_at");

    ApiToken::restore(
        id,
        row.get("username"),
        token_hash.trim_end().to_string(),
        row.get("description"),
        expires_at,
        created_at,
        last_used_at,
    )
}
