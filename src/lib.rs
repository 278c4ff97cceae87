//! Gmail Mailer MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing a small set of Gmail tools:
//! sending (plain, introduction and template emails) over SMTP with an app
//! password, and OAuth-backed mailbox access (labels, unread, read, archive,
//! trash) via the Gmail API.

pub mod config;
pub mod error;
pub mod gmail;
pub mod mail;
pub mod mcp;
pub mod templates;

pub use config::Config;
pub use error::{GmailMcpError, Result, ToolError};
