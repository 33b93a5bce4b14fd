use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the reminders table. Append-only; rows are never
/// updated in place.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReminderModel {
    pub id: String, // UUID v4 as string
    pub company_id: String,
    pub description: String,
    /// Accepted as-is, including dates in the past
    pub due_date: DateTime<Utc>,
    /// Links back to the originating email thread, when there is one
    pub log_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReminderModel {
    pub fn new(
        company_id: String,
        description: String,
        due_date: DateTime<Utc>,
        log_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            company_id,
            description,
            due_date,
            log_id,
            created_at: Utc::now(),
        }
    }
}

/// Request body for POST /reminders
#[derive(Debug, Deserialize)]
pub struct CreateReminderRequest {
    pub company_id: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub log_id: Option<String>,
}
