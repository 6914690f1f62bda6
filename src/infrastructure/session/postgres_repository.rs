//! PostgreSQL session repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::domain::session::{Session, SessionRepository};

#[derive(Debug, Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, session_token_hash, username, auth_type, display_name,
                                  email, groups, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.id)
        .bind(&session.token_hash)
        .bind(&session.username)
        .bind(session.auth_source.as_str())
        .bind(&session.display_name)
        .bind(&session.email)
        .bind(Json(&session.groups))
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create session: {}", e)))?;

        Ok(session)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, session_token_hash, username, auth_type, display_name, email, groups,
                   expires_at, created_at
            FROM sessions
            WHERE session_token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up session: {}", e)))?;

        row.as_ref().map(row_to_session).transpose()
    }

    async fn delete_by_hash(&self, token_hash: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE session_token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete session: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, username: &str) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete sessions: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to purge expired sessions: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}

fn row_to_session(row: &sqlx::postgres::PgRow) -> Result<Session, DomainError> {
    let id: Uuid = row.get("id");
    let token_hash: String = row.get("session_token_hash");
    let auth_type: String = row.get("auth_type");
    let groups: Json<Vec<String>> = row.get("groups");

    Ok(Session {
        id,
        token_hash: token_hash.trim_end().to_string(),
        username: row.get("username"),
        auth_source: auth_type.parse()?,
        display_name: row.get("display_name"),
        email: row.get("email"),
        groups: groups.0,
        expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}
