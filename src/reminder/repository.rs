use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::ReminderModel;
use crate::shared::AppError;

/// Trait for reminder repository operations
#[async_trait]
pub trait ReminderRepository {
    /// Inserts one reminder row. No ordering, dedup, or conflict logic.
    async fn create_reminder(&self, reminder: &ReminderModel) -> Result<(), AppError>;

    /// Full-table read, no pagination.
    async fn get_all_reminders(&self) -> Result<Vec<ReminderModel>, AppError>;
}

/// In-memory implementation of ReminderRepository for development and testing
pub struct InMemoryReminderRepository {
    reminders: Mutex<Vec<ReminderModel>>,
}

impl Default for InMemoryReminderRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReminderRepository {
    pub fn new() -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
        }
    }

    pub fn reminder_count(&self) -> usize {
        self.reminders.lock().unwrap().len()
    }
}

#[async_trait]
impl ReminderRepository for InMemoryReminderRepository {
    #[instrument(skip(self, reminder))]
    async fn create_reminder(&self, reminder: &ReminderModel) -> Result<(), AppError> {
        debug!(reminder_id = %reminder.id, company_id = %reminder.company_id, "Creating reminder in memory");

        let mut reminders = self.reminders.lock().unwrap();
        reminders.push(reminder.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_all_reminders(&self) -> Result<Vec<ReminderModel>, AppError> {
        let reminders = self.reminders.lock().unwrap();
        Ok(reminders.clone())
    }
}

/// PostgreSQL implementation of reminder repository
pub struct PostgresReminderRepository {
    pool: PgPool,
}

impl PostgresReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRepository for PostgresReminderRepository {
    #[instrument(skip(self, reminder))]
    async fn create_reminder(&self, reminder: &ReminderModel) -> Result<(), AppError> {
        debug!(reminder_id = %reminder.id, company_id = %reminder.company_id, "Creating reminder in database");

        sqlx::query(
            "INSERT INTO reminders (id, company_id, description, due_date, log_id, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&reminder.id)
        .bind(&reminder.company_id)
        .bind(&reminder.description)
        .bind(reminder.due_date)
        .bind(&reminder.log_id)
        .bind(reminder.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create reminder in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_all_reminders(&self) -> Result<Vec<ReminderModel>, AppError> {
        let rows = sqlx::query(
            "SELECT id, company_id, description, due_date, log_id, created_at FROM reminders",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch reminders from database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .map(|row| ReminderModel {
                id: row.get("id"),
                company_id: row.get("company_id"),
                description: row.get("description"),
                due_date: row.get("due_date"),
                log_id: row.get("log_id"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
