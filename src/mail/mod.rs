//! Send path
//!
//! SMTP transport with app-password credentials and canned message bodies.

pub mod compose;
pub mod transport;
