//! Gmail API module
//!
//! OAuth-backed mailbox access: token refresh, API types and the client.

pub mod auth;
pub mod client;
pub mod types;
pub mod utils;
