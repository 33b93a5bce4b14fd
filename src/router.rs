use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::shared::{AppState, Envelope, SIGN_IN_PATH};
use crate::{company, contact, mail, reminder, session};

/// GET /health - liveness probe
async fn health() -> Json<Envelope<String>> {
    Json(Envelope::success("ok".to_string()))
}

/// Assembles the full application router. Protected routes sit behind the
/// session middleware; everything else is public.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(session::logout))
        .route("/auth/google/callback", get(mail::google_oauth_callback))
        .route("/companies", get(company::get_companies))
        .route("/companies/import", post(company::import_companies))
        .route("/companies/:id/emails", get(mail::get_company_emails))
        .route("/contacts/responsible", get(contact::get_responsible_emails))
        .route(
            "/reminders",
            get(reminder::get_all_reminders).post(reminder::create_reminder),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .route(SIGN_IN_PATH, get(session::sign_in))
        .route("/auth/sign-up", post(session::sign_up))
        .route("/auth/login", post(session::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
