// Public API - what other modules can use
pub use models::UserModel;
pub use password::{hash_password, verify_password};

// Internal modules
pub mod models;
mod password;
pub mod repository;
