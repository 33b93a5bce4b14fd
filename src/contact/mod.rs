// Public API - what other modules can use
pub use handlers::get_responsible_emails;

// Internal modules
mod handlers;
pub mod repository;
