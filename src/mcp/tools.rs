//! MCP Tool definitions and handlers
//!
//! Defines the tool catalog and routes each call to the send path, the
//! mailbox client or the template store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::env::OAUTH_VARS;
use crate::config::Config;
use crate::error::{GmailMcpError, McpError, Result, ToolError};
use crate::gmail::client::GmailClient;
use crate::mail::compose::{compose_introduction, DEFAULT_SENDER_NAME};
use crate::mail::transport::{EmailBody, Mailer, OutgoingEmail};
use crate::mcp::types::{CallToolResult, Tool};
use crate::templates::TemplateStore;

/// Default number of unread messages to list
const DEFAULT_MAX_RESULTS: u32 = 5;

/// Largest page the Gmail API serves
const MAX_RESULTS_LIMIT: u32 = 500;

/// Tools that need the OAuth credential set
pub const OAUTH_TOOLS: &[&str] = &[
    "list_labels",
    "list_unread_emails",
    "get_email",
    "archive_email",
    "delete_email",
];

/// Tool handler
pub struct ToolHandler {
    config: Arc<Config>,
    mailer: Arc<dyn Mailer>,
    templates: TemplateStore,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        let templates = TemplateStore::new(config.templates_dir.clone());
        Self {
            config,
            mailer,
            templates,
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        let empty = || json!({"type": "object", "properties": {}});
        vec![
            tool_def("send_email", "Send an email using Gmail", send_email_schema()),
            tool_def("send_introduction_email", "Send a professional introduction email", send_introduction_email_schema()),
            tool_def("check_gmail_config", "Check if Gmail configuration is properly set up", empty()),
            tool_def("list_labels", "List Gmail labels (requires OAuth2 config)", empty()),
            tool_def("list_unread_emails", "List recent unread emails (requires OAuth2 config)", list_unread_emails_schema()),
            tool_def("get_email", "Retrieve a full email by ID (requires OAuth2 config)", message_id_schema("Gmail message ID")),
            tool_def("archive_email", "Archive (remove from INBOX) an email by ID (requires OAuth2 config)", message_id_schema("Gmail message ID")),
            tool_def("delete_email", "Move an email to trash by ID (requires OAuth2 config)", message_id_schema("Gmail message ID")),
            tool_def("list_email_templates", "List available email templates", empty()),
            tool_def("send_template_email", "Send an email using a stored template with variables", send_template_email_schema()),
        ]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> std::result::Result<CallToolResult, ToolError> {
        let args = if args.is_null() { json!({}) } else { args };
        tracing::info!(tool = name, "Calling tool");

        if OAUTH_TOOLS.contains(&name) && !self.config.has_oauth() {
            tracing::debug!(tool = name, "OAuth credentials missing");
            return Ok(self.oauth_missing_result());
        }

        let result = match name {
            "send_email" => self.handle_send_email(args).await,
            "send_introduction_email" => self.handle_send_introduction_email(args).await,
            "check_gmail_config" => self.handle_check_gmail_config().await,
            "list_labels" => self.handle_list_labels().await,
            "list_unread_emails" => self.handle_list_unread_emails(args).await,
            "get_email" => self.handle_get_email(args).await,
            "archive_email" => self.handle_archive_email(args).await,
            "delete_email" => self.handle_delete_email(args).await,
            "list_email_templates" => self.handle_list_email_templates().await,
            "send_template_email" => self.handle_send_template_email(args).await,
            _ => {
                return Err(ToolError::NotFound {
                    tool: name.to_string(),
                })
            }
        };

        result.map_err(|e| {
            tracing::warn!(tool = name, "Tool failed: {}", e);
            ToolError::from_failure(name, e)
        })
    }

    /// Explanation returned instead of an error when OAuth is not configured
    fn oauth_missing_result(&self) -> CallToolResult {
        let mut text = format!(
            "OAuth2 environment variables missing. Provide {} to use this tool.",
            OAUTH_VARS.join(", ")
        );
        if !self.config.missing_oauth_vars.is_empty() {
            text.push_str(&format!("\nMissing: {}", self.config.missing_oauth_vars.join(", ")));
        }
        CallToolResult::text(text)
    }

    // ==================== Send Handlers ====================

    async fn send(&self, to: String, subject: String, body: EmailBody) -> Result<CallToolResult> {
        let credentials = self.config.require_send()?;
        let email = OutgoingEmail { to, subject, body };

        let message_id = self.mailer.send(credentials, email).await?;
        Ok(CallToolResult::text(format!(
            "Email sent successfully! Message ID: {}",
            message_id
        )))
    }

    async fn handle_send_email(&self, args: Value) -> Result<CallToolResult> {
        #[derive(Deserialize)]
        struct Args {
            to: String,
            subject: String,
            body: String,
            html: Option<bool>,
        }

        let args: Args = parse_args(args)?;
        let body = EmailBody::new(args.body, args.html.unwrap_or_default());
        self.send(args.to, args.subject, body)
            .await
    }

    async fn handle_send_introduction_email(&self, args: Value) -> Result<CallToolResult> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            to: String,
            name: Option<String>,
            custom_message: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let name = args.name.as_deref().unwrap_or(DEFAULT_SENDER_NAME);
        let account = self
            .config
            .send
            .as_ref()
            .map(|c| c.user.as_str())
            .unwrap_or_default();

        let custom_message = args.custom_message.unwrap_or_default();
        let (subject, body) = compose_introduction(name, &custom_message, account);
        self.send(args.to, subject, EmailBody::Text(body)).await
    }

    async fn handle_check_gmail_config(&self) -> Result<CallToolResult> {
        let Some(credentials) = self.config.send.as_ref() else {
            return Ok(CallToolResult::text(
                "Missing environment variables: GMAIL_USER or GMAIL_APP_PASSWORD\n\nPlease check your .env file configuration.",
            ));
        };

        let text = match self.mailer.verify(credentials).await {
            Ok(()) => format!("Gmail configuration is valid!\nEmail: {}", credentials.user),
            Err(e) => format!("Gmail configuration error: {}", e),
        };
        Ok(CallToolResult::text(text))
    }

    // ==================== Mailbox Handlers ====================

    async fn handle_list_labels(&self) -> Result<CallToolResult> {
        let client = GmailClient::from_config(&self.config)?;
        let labels = client.list_labels().await?;
        Ok(CallToolResult::json(&labels)?)
    }

    async fn handle_list_unread_emails(&self, args: Value) -> Result<CallToolResult> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            query: Option<String>,
            max_results: Option<f64>,
        }

        let args: Args = parse_args(args)?;
        let query = args.query.unwrap_or_default();
        let client = GmailClient::from_config(&self.config)?;
        let messages = client
            .list_unread(&query, max_results(args.max_results))
            .await?;
        Ok(CallToolResult::json(&messages)?)
    }

    async fn handle_get_email(&self, args: Value) -> Result<CallToolResult> {
        let args: IdArgs = parse_args(args)?;
        let client = GmailClient::from_config(&self.config)?;
        let message = client.get_email(&args.id).await?;
        Ok(CallToolResult::json(&message)?)
    }

    async fn handle_archive_email(&self, args: Value) -> Result<CallToolResult> {
        let args: IdArgs = parse_args(args)?;
        let client = GmailClient::from_config(&self.config)?;
        let status = client.archive_email(&args.id).await?;
        Ok(CallToolResult::json(&status)?)
    }

    async fn handle_delete_email(&self, args: Value) -> Result<CallToolResult> {
        let args: IdArgs = parse_args(args)?;
        let client = GmailClient::from_config(&self.config)?;
        let status = client.delete_email(&args.id).await?;
        Ok(CallToolResult::json(&status)?)
    }

    // ==================== Template Handlers ====================

    async fn handle_list_email_templates(&self) -> Result<CallToolResult> {
        match self.templates.list().await? {
            Some(names) => Ok(CallToolResult::json(&names)?),
            None => Ok(CallToolResult::text("No templates directory found.")),
        }
    }

    async fn handle_send_template_email(&self, args: Value) -> Result<CallToolResult> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            to: String,
            template: String,
            variables: Option<Map<String, Value>>,
            fallback_subject: Option<String>,
        }

        let args: Args = parse_args(args)?;
        let Some(template) = self.templates.load(&args.template).await? else {
            return Ok(CallToolResult::text(format!(
                "Template not found: {}",
                args.template
            )));
        };

        let variables = args.variables.unwrap_or_default();
        let (subject, body) = template.render(&variables, args.fallback_subject.as_deref());
        self.send(args.to, subject, EmailBody::Text(body)).await
    }
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

/// `maxResults` is a JSON number; fractions are truncated and the value is
/// clamped to what the API accepts. Non-finite values fall back to the default.
fn max_results(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() => v.trunc().clamp(1.0, MAX_RESULTS_LIMIT as f64) as u32,
        _ => DEFAULT_MAX_RESULTS,
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| {
        GmailMcpError::Mcp(McpError::InvalidArguments {
            message: e.to_string(),
        })
    })
}

// ==================== Tool Schemas ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn send_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {
                "type": "string",
                "description": "Recipient email address"
            },
            "subject": {
                "type": "string",
                "description": "Email subject"
            },
            "body": {
                "type": "string",
                "description": "Email body content"
            },
            "html": {
                "type": "boolean",
                "description": "Whether the body is HTML",
                "default": false
            }
        },
        "required": ["to", "subject", "body"]
    })
}

fn send_introduction_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {
                "type": "string",
                "description": "Recipient email address"
            },
            "name": {
                "type": "string",
                "description": "Your name",
                "default": DEFAULT_SENDER_NAME
            },
            "customMessage": {
                "type": "string",
                "description": "Custom message to include"
            }
        },
        "required": ["to"]
    })
}

fn list_unread_emails_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Additional Gmail search query (optional)"
            },
            "maxResults": {
                "type": "number",
                "description": "Max number of emails",
                "default": DEFAULT_MAX_RESULTS
            }
        }
    })
}

fn message_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": description
            }
        },
        "required": ["id"]
    })
}

fn send_template_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {
                "type": "string",
                "description": "Recipient email address"
            },
            "template": {
                "type": "string",
                "description": "Template name (filename without extension)"
            },
            "variables": {
                "type": "object",
                "description": "Key-value variables for template interpolation"
            },
            "fallbackSubject": {
                "type": "string",
                "description": "Subject if not specified in template"
            }
        },
        "required": ["to", "template"]
    })
}
