use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::shared::{AppError, AppState, Envelope};

#[derive(Debug, Deserialize)]
pub struct ResponsibleQuery {
    /// Comma-separated company ids
    pub company_ids: String,
}

/// HTTP handler for the responsible-party lookup
///
/// GET /contacts/responsible?company_ids=a,b (protected)
/// Returns the matching addresses joined with a comma.
#[instrument(name = "get_responsible_emails", skip(state))]
pub async fn get_responsible_emails(
    State(state): State<AppState>,
    Query(query): Query<ResponsibleQuery>,
) -> Result<Json<Envelope<String>>, AppError> {
    let company_ids: Vec<String> = query
        .company_ids
        .split(',')
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    if company_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one company id is required".to_string(),
        ));
    }

    let emails = state
        .contact_repository
        .get_email_addresses_by_company_ids(&company_ids)
        .await?;

    info!(
        companies = company_ids.len(),
        emails = emails.len(),
        "Responsible parties listed"
    );

    Ok(Json(Envelope::success(emails.join(","))))
}
