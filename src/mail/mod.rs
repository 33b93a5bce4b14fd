// Public API - what other modules can use
pub use handlers::{get_company_emails, google_oauth_callback};
pub use models::{EmailSummary, GmailTokenModel, TokenState};

// Internal modules
mod handlers;
mod headers;
pub mod models;
pub mod provider;
pub mod token_repository;
