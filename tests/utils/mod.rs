pub mod requests;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use requests::{authed_get, authed_post_json, authed_post_multipart, body_bytes, body_json, get, post_json};
pub use setup::TestSetup;
