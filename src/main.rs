//! Gmail Mailer MCP Server
//!
//! A Model Context Protocol (MCP) server for sending and triaging Gmail.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use gmail_mailer_mcp::config::Config;
use gmail_mailer_mcp::mail::transport::SmtpMailer;
use gmail_mailer_mcp::mcp::server::McpServer;
use gmail_mailer_mcp::mcp::tools::ToolHandler;

/// Gmail Mailer MCP Server
#[derive(Parser)]
#[command(name = "gmail-mailer-mcp")]
#[command(author, version, about = "Gmail Mailer MCP Server - send and triage Gmail over MCP")]
struct Cli {
    /// Environment file to load before reading configuration (default: ./.env)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Directory containing .txt email templates
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the send credentials against the SMTP relay
    Check,

    /// List available email templates
    Templates,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::new(cli.env_file.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = cli.templates_dir {
        config.templates_dir = dir;
    }
    let config = Arc::new(config);

    let mailer = Arc::new(SmtpMailer::new(config.smtp_host.clone()));
    let tool_handler = ToolHandler::new(config, mailer);

    match cli.command {
        Some(Commands::Check) => run_tool(&tool_handler, "check_gmail_config").await,
        Some(Commands::Templates) => run_tool(&tool_handler, "list_email_templates").await,
        None => {
            let mut server = McpServer::new(tool_handler);
            server.run_stdio().await.context("MCP server failed")?;
            Ok(())
        }
    }
}

/// Invoke a single tool and print its text
async fn run_tool(tool_handler: &ToolHandler, name: &str) -> anyhow::Result<()> {
    let result = tool_handler.call_tool(name, json!({})).await?;
    println!("{}", result.as_text());
    Ok(())
}
