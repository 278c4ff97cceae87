//! Error types for the Gmail mailer MCP server
//!
//! Handler code works with [`GmailMcpError`]; the dispatcher collapses those
//! into a [`ToolError`] at the protocol boundary.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the Gmail mailer MCP server
#[derive(Error, Debug)]
pub enum GmailMcpError {
    /// OAuth token errors
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Gmail API errors
    #[error(transparent)]
    Gmail(#[from] GmailApiError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Outbound mail errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Template errors
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// MCP protocol errors
    #[error(transparent)]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// OAuth token errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to refresh access token: {message}")]
    TokenRefreshFailed { message: String },
}

/// Gmail API errors
#[derive(Error, Debug)]
pub enum GmailApiError {
    #[error("Message not found: {message_id}")]
    MessageNotFound { message_id: String },

    #[error("API request failed: {message}")]
    RequestFailed { message: String },

    #[error("Malformed message body: {message}")]
    MalformedBody { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Gmail configuration not found. Please check your .env file.")]
    MissingSendCredentials,

    #[error(
        "Missing OAuth2 environment variables. Required: GMAIL_CLIENT_ID, GMAIL_CLIENT_SECRET, GMAIL_REDIRECT_URI, GMAIL_REFRESH_TOKEN."
    )]
    MissingOAuthCredentials,

    #[error("Failed to load environment file {path}: {message}")]
    EnvFile { path: String, message: String },
}

/// Outbound mail errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP connection test failed for {host}")]
    VerifyFailed { host: String },
}

/// Template errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

/// Result type alias for Gmail mailer operations
pub type Result<T> = std::result::Result<T, GmailMcpError>;

/// Coarse classification of a failed tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    NotFound,
    Unconfigured,
    RemoteFailure,
    Internal,
}

/// Failure of a single tool call, as seen by the protocol layer
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {tool}")]
    NotFound { tool: String },

    #[error("Error executing {tool}: {message}")]
    Unconfigured { tool: String, message: String },

    #[error("Error executing {tool}: {message}")]
    RemoteFailure { tool: String, message: String },

    #[error("Error executing {tool}: {message}")]
    Internal { tool: String, message: String },
}

impl ToolError {
    /// Wrap a handler failure, keeping its message and the failing tool name
    pub fn from_failure(tool: &str, err: GmailMcpError) -> Self {
        let tool = tool.to_string();
        let message = err.to_string();
        match err {
            GmailMcpError::Config(_) => ToolError::Unconfigured { tool, message },
            GmailMcpError::Auth(_)
            | GmailMcpError::Gmail(_)
            | GmailMcpError::Http(_)
            | GmailMcpError::Transport(TransportError::Smtp(_))
            | GmailMcpError::Transport(TransportError::VerifyFailed { .. }) => {
                ToolError::RemoteFailure { tool, message }
            }
            _ => ToolError::Internal { tool, message },
        }
    }

    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::NotFound { .. } => ToolErrorKind::NotFound,
            ToolError::Unconfigured { .. } => ToolErrorKind::Unconfigured,
            ToolError::RemoteFailure { .. } => ToolErrorKind::RemoteFailure,
            ToolError::Internal { .. } => ToolErrorKind::Internal,
        }
    }

    pub fn tool(&self) -> &str {
        match self {
            ToolError::NotFound { tool }
            | ToolError::Unconfigured { tool, .. }
            | ToolError::RemoteFailure { tool, .. }
            | ToolError::Internal { tool, .. } => tool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GmailApiError::MessageNotFound {
            message_id: "abc123".to_string(),
        };
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::MissingSendCredentials;
        let err: GmailMcpError = config_err.into();
        assert!(matches!(err, GmailMcpError::Config(_)));
    }

    #[test]
    fn test_tool_error_classification() {
        let err = ToolError::from_failure("send_email", ConfigError::MissingSendCredentials.into());
        assert_eq!(err.kind(), ToolErrorKind::Unconfigured);
        assert_eq!(err.tool(), "send_email");
        assert!(err.to_string().starts_with("Error executing send_email: "));
        assert!(err.to_string().contains("Please check your .env file"));

        let err = ToolError::from_failure(
            "get_email",
            GmailApiError::MessageNotFound {
                message_id: "m1".to_string(),
            }
            .into(),
        );
        assert_eq!(err.kind(), ToolErrorKind::RemoteFailure);

        let err = ToolError::from_failure(
            "get_email",
            McpError::InvalidArguments {
                message: "missing field `id`".to_string(),
            }
            .into(),
        );
        assert_eq!(err.kind(), ToolErrorKind::Internal);
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn test_tool_error_message_has_single_prefix() {
        let err = ToolError::from_failure("send_email", ConfigError::MissingSendCredentials.into());
        assert_eq!(
            err.to_string(),
            "Error executing send_email: Gmail configuration not found. Please check your .env file."
        );

        let err = ToolError::from_failure(
            "get_email",
            McpError::InvalidArguments {
                message: "missing field `id`".to_string(),
            }
            .into(),
        );
        assert_eq!(
            err.to_string(),
            "Error executing get_email: Invalid tool arguments: missing field `id`"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ToolError::NotFound {
            tool: "bogus".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tool: bogus");
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
    }
}
