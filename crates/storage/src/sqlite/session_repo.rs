use chrono::{DateTime, Utc};
use quiz_core::model::{QuizSession, SessionId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, decode_session, encode_session, ser, session_key};
use crate::repository::{SessionStore, StorageError};

#[async_trait::async_trait]
impl SessionStore for SqliteRepository {
    async fn load(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let row = sqlx::query("SELECT state FROM quiz_sessions WHERE id = ?1")
            .bind(session_key(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("state").map_err(ser)?;
        decode_session(&raw).map(Some)
    }

    async fn save(&self, id: SessionId, session: &QuizSession) -> Result<(), StorageError> {
        let state = encode_session(session)?;
        sqlx::query(
            r"
                INSERT INTO quiz_sessions (id, state, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    state = excluded.state,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(session_key(id))
        .bind(state)
        .bind(session.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn remove(&self, id: SessionId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_sessions WHERE id = ?1")
            .bind(session_key(id))
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let res = sqlx::query("DELETE FROM quiz_sessions WHERE updated_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        usize::try_from(res.rows_affected()).map_err(ser)
    }
}
