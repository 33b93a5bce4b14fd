use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{instrument, warn};

use super::service::SessionService;
use crate::shared::{AppError, AppState};

/// Session authentication middleware. Validates the Authorization Bearer token
/// against the session store and adds SessionClaims to request extensions.
/// Any failure answers with a redirect to the sign-in path, never an error body.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::session_auth))
#[instrument(skip(state, req, next))]
pub async fn session_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let service = SessionService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.session_repository),
    );

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthenticated)?;

    let claims = match service.validate_session(token).await {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, uri = %req.uri(), "Rejecting unauthenticated request");
            return Err(AppError::Unauthenticated);
        }
    };

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
