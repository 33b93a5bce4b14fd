use std::sync::Arc;

use axum::Router;
use tower::ServiceExt; // for `oneshot`

use municrm::{
    app,
    company::repository::InMemoryCompanyRepository,
    contact::repository::InMemoryContactRepository,
    mail::provider::InMemoryMailProvider,
    reminder::repository::InMemoryReminderRepository,
    session::repository::InMemorySessionRepository,
    user::repository::InMemoryUserRepository,
    AppState,
};

use super::requests::{body_json, post_json};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub companies: Arc<InMemoryCompanyRepository>,
    pub contacts: Arc<InMemoryContactRepository>,
    pub reminders: Arc<InMemoryReminderRepository>,
    pub mail: Arc<InMemoryMailProvider>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_mail_provider(Arc::new(InMemoryMailProvider::new()))
    }

    pub fn with_mail_provider(mail: Arc<InMemoryMailProvider>) -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let companies = Arc::new(InMemoryCompanyRepository::new());
        let contacts = Arc::new(InMemoryContactRepository::new());
        let reminders = Arc::new(InMemoryReminderRepository::new());

        let state = AppState::new(
            users.clone(),
            sessions.clone(),
            companies.clone(),
            contacts.clone(),
            reminders.clone(),
            mail.clone(),
        );

        Self {
            state,
            users,
            sessions,
            companies,
            contacts,
            reminders,
            mail,
        }
    }

    /// Swaps in a preloaded company repository
    pub fn set_companies(&mut self, companies: Arc<InMemoryCompanyRepository>) {
        self.companies = companies;
        self.rebuild_state();
    }

    /// Swaps in a preloaded contact repository
    pub fn set_contacts(&mut self, contacts: Arc<InMemoryContactRepository>) {
        self.contacts = contacts;
        self.rebuild_state();
    }

    fn rebuild_state(&mut self) {
        self.state = AppState::new(
            self.users.clone(),
            self.sessions.clone(),
            self.companies.clone(),
            self.contacts.clone(),
            self.reminders.clone(),
            self.mail.clone(),
        );
    }

    pub fn app(&self) -> Router {
        app(self.state.clone())
    }

    /// Signs up a staff account through the API and returns the session token
    pub async fn sign_up(&self, email: &str, password: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "name": "Test Staff",
            "password": password,
            "confirm_password": password,
        });
        let response = self
            .app()
            .oneshot(post_json("/auth/sign-up", &body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "sign-up should succeed");

        let json = body_json(response).await;
        json["message"]["token"].as_str().unwrap().to_string()
    }
}

impl Default for TestSetup {
    fn default() -> Self {
        Self::new()
    }
}
