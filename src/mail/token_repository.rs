use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{GmailTokenModel, TokenState};
use crate::shared::AppError;

/// Trait for Gmail token storage. One row per user.
#[async_trait]
pub trait GmailTokenRepository {
    async fn get_token(&self, user_id: &str) -> Result<Option<GmailTokenModel>, AppError>;
    /// Inserts or replaces the user's token row
    async fn upsert_token(&self, token: &GmailTokenModel) -> Result<(), AppError>;
    /// Removes the user's token row, returning them to the NoToken state
    async fn clear_token(&self, user_id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of GmailTokenRepository for development and testing
pub struct InMemoryGmailTokenRepository {
    tokens: Mutex<HashMap<String, GmailTokenModel>>,
}

impl Default for InMemoryGmailTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGmailTokenRepository {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GmailTokenRepository for InMemoryGmailTokenRepository {
    #[instrument(skip(self))]
    async fn get_token(&self, user_id: &str) -> Result<Option<GmailTokenModel>, AppError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens.get(user_id).cloned())
    }

    #[instrument(skip(self, token))]
    async fn upsert_token(&self, token: &GmailTokenModel) -> Result<(), AppError> {
        debug!(user_id = %token.user_id, state = token.state.as_str(), "Upserting Gmail token in memory");

        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert(token.user_id.clone(), token.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_token(&self, user_id: &str) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.remove(user_id);

        Ok(())
    }
}

/// PostgreSQL implementation of Gmail token storage
pub struct PostgresGmailTokenRepository {
    pool: PgPool,
}

impl PostgresGmailTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GmailTokenRepository for PostgresGmailTokenRepository {
    #[instrument(skip(self))]
    async fn get_token(&self, user_id: &str) -> Result<Option<GmailTokenModel>, AppError> {
        let row = sqlx::query(
            "SELECT user_id, state, access_token, refresh_token, expiry FROM gmail_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch Gmail token from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|row| {
            let state: String = row.get("state");
            GmailTokenModel {
                user_id: row.get("user_id"),
                state: TokenState::from_str(&state),
                access_token: row.get("access_token"),
                refresh_token: row.get("refresh_token"),
                expiry: row.get("expiry"),
            }
        }))
    }

    #[instrument(skip(self, token))]
    async fn upsert_token(&self, token: &GmailTokenModel) -> Result<(), AppError> {
        debug!(user_id = %token.user_id, state = token.state.as_str(), "Upserting Gmail token in database");

        sqlx::query(
            "INSERT INTO gmail_tokens (user_id, state, access_token, refresh_token, expiry) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET \
             state = EXCLUDED.state, access_token = EXCLUDED.access_token, \
             refresh_token = EXCLUDED.refresh_token, expiry = EXCLUDED.expiry",
        )
        .bind(&token.user_id)
        .bind(token.state.as_str())
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to upsert Gmail token in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_token(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM gmail_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to clear Gmail token in database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(())
    }
}
