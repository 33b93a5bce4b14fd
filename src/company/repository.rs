use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::CompanyModel;
use crate::shared::AppError;

/// Trait for company repository operations
#[async_trait]
pub trait CompanyRepository {
    /// Returns every company. No filtering, pagination, or caching.
    async fn get_companies(&self) -> Result<Vec<CompanyModel>, AppError>;

    /// Inserts a batch of companies as a single unit. Any row failure
    /// aborts the whole batch. Returns the number inserted.
    async fn insert_companies(&self, companies: &[CompanyModel]) -> Result<u64, AppError>;
}

/// In-memory implementation of CompanyRepository for development and testing
pub struct InMemoryCompanyRepository {
    companies: Mutex<HashMap<String, CompanyModel>>,
}

impl Default for InMemoryCompanyRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCompanyRepository {
    pub fn new() -> Self {
        Self {
            companies: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_companies(companies: Vec<CompanyModel>) -> Self {
        let mut map = HashMap::new();
        for company in companies {
            map.insert(company.id.clone(), company);
        }

        Self {
            companies: Mutex::new(map),
        }
    }

    pub fn company_count(&self) -> usize {
        self.companies.lock().unwrap().len()
    }
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    #[instrument(skip(self))]
    async fn get_companies(&self) -> Result<Vec<CompanyModel>, AppError> {
        let companies = self.companies.lock().unwrap();
        Ok(companies.values().cloned().collect())
    }

    #[instrument(skip(self, companies))]
    async fn insert_companies(&self, companies: &[CompanyModel]) -> Result<u64, AppError> {
        let mut map = self.companies.lock().unwrap();

        // All-or-nothing: reject the whole batch before touching the map
        for company in companies {
            let duplicate = map.values().any(|existing| existing.code == company.code);
            if duplicate {
                warn!(code = %company.code, "Duplicate company code in import");
                return Err(AppError::DatabaseError(format!(
                    "Company code {} already exists",
                    company.code
                )));
            }
        }

        for company in companies {
            map.insert(company.id.clone(), company.clone());
        }

        debug!(inserted = companies.len(), "Companies inserted in memory");
        Ok(companies.len() as u64)
    }
}

/// PostgreSQL implementation of company repository
pub struct PostgresCompanyRepository {
    pool: PgPool,
}

impl PostgresCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    #[instrument(skip(self))]
    async fn get_companies(&self) -> Result<Vec<CompanyModel>, AppError> {
        let rows = sqlx::query("SELECT id, name, code, created_at FROM companies")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch companies from database");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(rows
            .into_iter()
            .map(|row| CompanyModel {
                id: row.get("id"),
                name: row.get("name"),
                code: row.get("code"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// One transaction for the whole batch - a failing row rolls back everything.
    #[instrument(skip(self, companies))]
    async fn insert_companies(&self, companies: &[CompanyModel]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            warn!(error = %e, "Failed to open import transaction");
            AppError::DatabaseError(e.to_string())
        })?;

        for company in companies {
            sqlx::query("INSERT INTO companies (id, name, code, created_at) VALUES ($1, $2, $3, $4)")
                .bind(&company.id)
                .bind(&company.name)
                .bind(&company.code)
                .bind(company.created_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    warn!(error = %e, code = %company.code, "Company insert failed, rolling back import");
                    AppError::DatabaseError(e.to_string())
                })?;
        }

        tx.commit().await.map_err(|e| {
            warn!(error = %e, "Failed to commit import transaction");
            AppError::DatabaseError(e.to_string())
        })?;

        info!(inserted = companies.len(), "Company import committed");
        Ok(companies.len() as u64)
    }
}
