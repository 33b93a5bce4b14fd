use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the companies table. One row per municipality.
/// Immutable once imported; admin edits live outside this service.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CompanyModel {
    pub id: String, // UUID v4 as string
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl CompanyModel {
    pub fn new(name: String, code: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            code,
            created_at: Utc::now(),
        }
    }
}
