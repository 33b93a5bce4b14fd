use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::SessionModel;
use crate::shared::AppError;

/// Trait for session repository operations
#[async_trait]
pub trait SessionRepository {
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError>;
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError>;
    /// Deletes a session. Deleting an absent session is not an error - logout is idempotent.
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError>;
    /// Deletes every session with expires_at strictly in the past, returning the count.
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError>;
}

/// In-memory implementation of SessionRepository for development and testing
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, SessionModel>>,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current number of sessions in the repository
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        debug!(session_id = %session.id, user_id = %session.user_id, "Creating session in memory");

        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&session.id) {
            warn!(session_id = %session.id, "Session already exists in memory");
            return Err(AppError::DatabaseError(
                "Session already exists".to_string(),
            ));
        }
        sessions.insert(session.id.clone(), session.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.get(session_id).cloned())
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        debug!(session_id = %session_id, "Deleting session from memory");

        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(session_id);

        Ok(())
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock().unwrap();
        let now = Utc::now();
        let initial_count = sessions.len();

        sessions.retain(|_, session| session.expires_at > now);

        let removed_count = initial_count - sessions.len();
        debug!(
            expired_sessions_removed = removed_count,
            "Expired sessions cleaned up from memory"
        );
        Ok(removed_count as u64)
    }
}

/// PostgreSQL implementation of session repository
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
    #[instrument(skip(self, session))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        debug!(session_id = %session.id, user_id = %session.user_id, "Creating session in database");

        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create session in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, session_id = %session_id, "Failed to fetch session from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|row| SessionModel {
            id: row.get("id"),
            user_id: row.get("user_id"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        }))
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        debug!(session_id = %session_id, "Deleting session from database");

        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, session_id = %session_id, "Failed to delete session from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }

    /// Single conditional statement - safe against concurrent reapers.
    #[instrument(skip(self))]
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let now = Utc::now();
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to cleanup expired sessions");
                AppError::DatabaseError(e.to_string())
            })?;

        let rows_affected = result.rows_affected();
        debug!(
            expired_sessions_removed = rows_affected,
            "Expired sessions cleaned up"
        );
        Ok(rows_affected)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use chrono::Duration;

    /// Test helper functions for creating test data
    mod helpers {
        use super::*;

        pub fn create_test_session(user_id: &str, expiration_days: i64) -> SessionModel {
            SessionModel::new(user_id.to_string(), expiration_days)
        }

        pub fn create_expired_session(user_id: &str) -> SessionModel {
            let mut session = SessionModel::new(user_id.to_string(), 7);
            session.expires_at = Utc::now() - Duration::hours(1);
            session
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_create_and_get_session() {
        let repo = InMemorySessionRepository::new();
        let session = create_test_session("user-1", 7);

        repo.create_session(&session).await.unwrap();

        let retrieved = repo.get_session(&session.id).await.unwrap();
        assert!(retrieved.is_some());
        let retrieved_session = retrieved.unwrap();
        assert_eq!(retrieved_session.id, session.id);
        assert_eq!(retrieved_session.user_id, session.user_id);
    }

    #[tokio::test]
    async fn test_get_nonexistent_session() {
        let repo = InMemorySessionRepository::new();

        let result = repo.get_session("nonexistent-id").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_session_is_idempotent() {
        let repo = InMemorySessionRepository::new();
        let session = create_test_session("user-1", 7);

        repo.create_session(&session).await.unwrap();
        repo.delete_session(&session.id).await.unwrap();

        let result = repo.get_session(&session.id).await.unwrap();
        assert!(result.is_none());

        // Deleting again is fine
        repo.delete_session(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let repo = InMemorySessionRepository::new();

        let expired_session = create_expired_session("expired-user");
        repo.create_session(&expired_session).await.unwrap();

        let valid_session = create_test_session("valid-user", 7);
        repo.create_session(&valid_session).await.unwrap();

        let removed_count = repo.cleanup_expired_sessions().await.unwrap();
        assert_eq!(removed_count, 1);

        let expired_result = repo.get_session(&expired_session.id).await.unwrap();
        assert!(expired_result.is_none());

        let valid_result = repo.get_session(&valid_session.id).await.unwrap();
        assert!(valid_result.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_no_expired_sessions() {
        let repo = InMemorySessionRepository::new();

        let valid_session = create_test_session("valid-user", 7);
        repo.create_session(&valid_session).await.unwrap();

        let removed_count = repo.cleanup_expired_sessions().await.unwrap();
        assert_eq!(removed_count, 0);

        let result = repo.get_session(&valid_session.id).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_runs_twice_removes_nothing_new() {
        let repo = InMemorySessionRepository::new();

        let expired_session = create_expired_session("expired-user");
        repo.create_session(&expired_session).await.unwrap();

        let first = repo.cleanup_expired_sessions().await.unwrap();
        let second = repo.cleanup_expired_sessions().await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }
}
