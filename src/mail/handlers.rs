use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::models::TokenState;
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState, Envelope};

/// HTTP handler for the per-municipality email listing
///
/// GET /companies/:id/emails (protected)
/// With an authorized token this returns summaries; otherwise it answers
/// with a redirect to the Gmail consent screen, carrying this route as the
/// deep link to return to.
#[instrument(name = "get_company_emails", skip(state, claims))]
pub async fn get_company_emails(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(company_id): Path<String>,
) -> Result<Response, AppError> {
    let company = state
        .company_repository
        .get_companies()
        .await?
        .into_iter()
        .find(|c| c.id == company_id)
        .ok_or_else(|| AppError::BadRequest("Unknown company".to_string()))?;

    match state.mail_provider.token_state(&claims.user_id).await? {
        TokenState::Authorized => {
            let emails = state
                .mail_provider
                .emails_per_municipality(&claims.user_id, &company)
                .await?;

            info!(
                company_id = %company.id,
                emails = emails.len(),
                "Municipality emails returned"
            );
            Ok(Json(Envelope::success(emails)).into_response())
        }
        TokenState::NoToken | TokenState::PendingAuthorization => {
            let return_to = format!("/companies/{}/emails", company.id);
            let consent_url = state
                .mail_provider
                .begin_authorization(&claims.user_id, &return_to)
                .await?;

            info!(user_id = %claims.user_id, "Redirecting to Gmail consent");
            Ok((StatusCode::FOUND, [(header::LOCATION, consent_url)]).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: String,
    /// The deep link this authorization started from
    pub state: Option<String>,
}

/// HTTP handler for the OAuth callback
///
/// GET /auth/google/callback?code=..&state=.. (protected)
/// Exchanges the code for a token persisted against the session's user, then
/// sends the user back to the deep link carried in `state`.
#[instrument(name = "google_oauth_callback", skip(state, claims, query))]
pub async fn google_oauth_callback(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, AppError> {
    if query.code.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Missing authorization code".to_string(),
        ));
    }

    state
        .mail_provider
        .set_token(query.code.trim(), &claims.user_id)
        .await?;

    // Only follow relative deep links back into this application
    let return_to = query
        .state
        .filter(|s| s.starts_with('/'))
        .unwrap_or_else(|| "/".to_string());

    info!(user_id = %claims.user_id, "Gmail authorization completed");
    Ok((StatusCode::FOUND, [(header::LOCATION, return_to)]).into_response())
}
