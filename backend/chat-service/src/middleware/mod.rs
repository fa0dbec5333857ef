pub mod auth;

pub use auth::{issue_token, verify_token, AuthenticatedUser, Claims};
