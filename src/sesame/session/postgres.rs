//! Postgres-backed sessions, for deployments that must survive restarts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::Instrument;

use crate::sesame::db_span;

use super::store::{SessionData, SessionStore};

#[derive(Clone, Debug)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, token_hash: &[u8]) -> Result<Option<SessionData>> {
        let query = r"
            SELECT username, user_id, flash
            FROM sessions
            WHERE token_hash = $1
              AND expires_at > NOW()
        ";
        let row = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await
            .context("failed to lookup session")?;

        Ok(row.map(|row| SessionData {
            username: row.get("username"),
            user_id: row.get("user_id"),
            flash: row.get("flash"),
        }))
    }

    async fn save(&self, token_hash: &[u8], data: &SessionData, ttl: Duration) -> Result<()> {
        let query = r"
            INSERT INTO sessions
                (token_hash, username, user_id, flash, expires_at)
            VALUES ($1, $2, $3, $4, NOW() + ($5 * INTERVAL '1 second'))
            ON CONFLICT (token_hash) DO UPDATE
            SET username = EXCLUDED.username,
                user_id = EXCLUDED.user_id,
                flash = EXCLUDED.flash,
                expires_at = EXCLUDED.expires_at
        ";
        let ttl_seconds =
            i64::try_from(ttl.as_secs()).context("session ttl out of range")?;
        sqlx::query(query)
            .bind(token_hash)
            .bind(data.username.as_deref())
            .bind(data.user_id.as_deref())
            .bind(data.flash.as_deref())
            .bind(ttl_seconds)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await
            .context("failed to save session")?;

        Ok(())
    }

    async fn destroy(&self, token_hash: &[u8]) -> Result<()> {
        let query = "DELETE FROM sessions WHERE token_hash = $1";
        sqlx::query(query)
            .bind(token_hash)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await
            .context("failed to delete session")?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let query = "DELETE FROM sessions WHERE expires_at <= NOW()";
        let result = sqlx::query(query)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await
            .context("failed to purge expired sessions")?;

        Ok(result.rows_affected())
    }
}
