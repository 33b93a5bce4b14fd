use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use municrm::company::repository::{InMemoryCompanyRepository, PostgresCompanyRepository};
use municrm::contact::repository::{InMemoryContactRepository, PostgresContactRepository};
use municrm::mail::provider::{GmailMailProvider, InMemoryMailProvider, OAuthConfig};
use municrm::mail::token_repository::PostgresGmailTokenRepository;
use municrm::reminder::repository::{InMemoryReminderRepository, PostgresReminderRepository};
use municrm::session::reaper::{start_session_reaper, ReaperConfig};
use municrm::session::repository::{InMemorySessionRepository, PostgresSessionRepository};
use municrm::user::repository::{InMemoryUserRepository, PostgresUserRepository};
use municrm::{app, AppState};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "municrm=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting municipality CRM server");

    // Postgres when DATABASE_URL is set, in-memory repositories otherwise
    let state = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("Failed to connect to database");

            AppState::new(
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresSessionRepository::new(pool.clone())),
                Arc::new(PostgresCompanyRepository::new(pool.clone())),
                Arc::new(PostgresContactRepository::new(pool.clone())),
                Arc::new(PostgresReminderRepository::new(pool.clone())),
                Arc::new(GmailMailProvider::new(
                    Arc::new(PostgresGmailTokenRepository::new(pool)),
                    OAuthConfig::from_env(),
                )),
            )
        }
        Err(_) => {
            info!("DATABASE_URL not set, using in-memory repositories");
            AppState::new(
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemorySessionRepository::new()),
                Arc::new(InMemoryCompanyRepository::new()),
                Arc::new(InMemoryContactRepository::new()),
                Arc::new(InMemoryReminderRepository::new()),
                Arc::new(InMemoryMailProvider::new()),
            )
        }
    };

    // Daily expired-session cleanup
    tokio::spawn(start_session_reaper(
        Arc::clone(&state.session_repository),
        ReaperConfig::from_env(),
    ));

    let app = app(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await.expect("Server exited");
}
