// Public API - what other modules can use
pub use handlers::{login, logout, sign_in, sign_up};
pub use middleware::session_auth;
pub use types::SessionClaims;

// Internal modules
mod handlers;
mod middleware;
pub mod models;
pub mod reaper;
pub mod repository;
pub mod service;
mod token;
mod types;
