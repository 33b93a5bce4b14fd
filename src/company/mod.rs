// Public API - what other modules can use
pub use handlers::{get_companies, import_companies};
pub use models::CompanyModel;

// Internal modules
mod handlers;
mod import;
pub mod models;
pub mod repository;
