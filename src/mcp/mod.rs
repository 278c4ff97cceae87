//! MCP layer
//!
//! JSON-RPC framing over stdio, the tool catalog and the dispatcher that
//! routes tool calls to the mail, mailbox and template code.

pub mod server;
pub mod tools;
pub mod types;
