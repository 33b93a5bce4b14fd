use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::SessionService,
    types::{AuthResponse, LoginRequest, SessionClaims, SignUpRequest},
};
use crate::shared::{AppError, AppState, Envelope};

fn service(state: &AppState) -> SessionService {
    SessionService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.session_repository),
    )
}

/// HTTP handler for creating a new staff account
///
/// POST /auth/sign-up
/// The password/confirm mismatch check runs before any user-creation call.
#[instrument(name = "sign_up", skip(state, request))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<Json<Envelope<AuthResponse>>, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    if request.password != request.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    let auth = service(&state)
        .sign_up(request.email.trim(), request.name.trim(), &request.password)
        .await?;

    info!(user_id = %auth.user_id, "Sign-up completed");
    Ok(Json(Envelope::success(auth)))
}

/// HTTP handler for logging in
///
/// POST /auth/login
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Envelope<AuthResponse>>, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let auth = service(&state)
        .login(request.email.trim(), &request.password)
        .await?;

    Ok(Json(Envelope::success(auth)))
}

/// HTTP handler for logging out the current session
///
/// POST /auth/logout (protected)
#[instrument(name = "logout", skip(state, claims))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Envelope<String>>, AppError> {
    service(&state).logout(&claims.session_id).await?;

    Ok(Json(Envelope::success("Logged out".to_string())))
}

/// GET /sign-in - the entry point unauthenticated requests are redirected to.
/// The UI that renders the actual form lives outside this service.
#[instrument(name = "sign_in")]
pub async fn sign_in() -> Json<Envelope<String>> {
    Json(Envelope::success("Please sign in".to_string()))
}
