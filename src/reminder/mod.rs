// Public API - what other modules can use
pub use handlers::{create_reminder, get_all_reminders};
pub use models::ReminderModel;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
