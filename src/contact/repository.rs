use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// Trait for the responsible-party lookup
#[async_trait]
pub trait ContactRepository {
    /// Returns the responsible-party email addresses for a set of companies,
    /// resolved with a single set-membership query rather than N lookups.
    /// No deduplication is applied to the returned list.
    async fn get_email_addresses_by_company_ids(
        &self,
        company_ids: &[String],
    ) -> Result<Vec<String>, AppError>;
}

/// In-memory implementation of ContactRepository for development and testing
pub struct InMemoryContactRepository {
    contacts: Mutex<HashMap<String, Vec<String>>>, // company_id -> emails
}

impl Default for InMemoryContactRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self {
            contacts: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_contacts(entries: Vec<(String, String)>) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (company_id, email) in entries {
            map.entry(company_id).or_default().push(email);
        }

        Self {
            contacts: Mutex::new(map),
        }
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    #[instrument(skip(self))]
    async fn get_email_addresses_by_company_ids(
        &self,
        company_ids: &[String],
    ) -> Result<Vec<String>, AppError> {
        let contacts = self.contacts.lock().unwrap();

        let emails: Vec<String> = company_ids
            .iter()
            .filter_map(|id| contacts.get(id))
            .flatten()
            .cloned()
            .collect();

        debug!(
            companies = company_ids.len(),
            emails = emails.len(),
            "Responsible parties resolved in memory"
        );
        Ok(emails)
    }
}

/// PostgreSQL implementation of the responsible-party lookup
pub struct PostgresContactRepository {
    pool: PgPool,
}

impl PostgresContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    #[instrument(skip(self))]
    async fn get_email_addresses_by_company_ids(
        &self,
        company_ids: &[String],
    ) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT email FROM company_contacts WHERE company_id = ANY($1)")
            .bind(company_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch responsible parties from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(rows.into_iter().map(|row| row.get("email")).collect())
    }
}
