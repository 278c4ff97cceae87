//! Outbound mail over SMTP
//!
//! Sending authenticates with the account's app password. A fresh transport
//! is built for every send and every connection check.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SendCredentials;
use crate::error::{Result, TransportError};

/// Message body; an email carries exactly one of the two
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    Text(String),
    Html(String),
}

impl EmailBody {
    /// Pick the body kind from the `html` flag of the send tools
    pub fn new(body: String, html: bool) -> Self {
        if html {
            EmailBody::Html(body)
        } else {
            EmailBody::Text(body)
        }
    }

    pub fn content(&self) -> &str {
        match self {
            EmailBody::Text(body) | EmailBody::Html(body) => body,
        }
    }
}

/// An email ready to hand to a [`Mailer`]
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    /// Recipients, comma-separated
    pub to: String,
    pub subject: String,
    pub body: EmailBody,
}

/// Sends mail on behalf of the configured account
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message, returning its Message-ID
    async fn send(&self, credentials: &SendCredentials, email: OutgoingEmail) -> Result<String>;

    /// Check that the transport accepts the credentials
    async fn verify(&self, credentials: &SendCredentials) -> Result<()>;
}

/// Build the RFC 5322 message for an outgoing email
pub fn build_message(from: &str, email: &OutgoingEmail) -> Result<Message> {
    let from: Mailbox = from.parse().map_err(TransportError::from)?;
    let mut builder = Message::builder()
        .from(from)
        .subject(email.subject.as_str())
        .message_id(None);

    for recipient in email.to.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        let mailbox: Mailbox = recipient.parse().map_err(TransportError::from)?;
        builder = builder.to(mailbox);
    }

    let (content_type, body) = match &email.body {
        EmailBody::Text(body) => (ContentType::TEXT_PLAIN, body.clone()),
        EmailBody::Html(body) => (ContentType::TEXT_HTML, body.clone()),
    };

    let message = builder
        .header(content_type)
        .body(body)
        .map_err(TransportError::from)?;
    Ok(message)
}

/// SMTP mailer for the Gmail relay
pub struct SmtpMailer {
    host: String,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    fn create_transport(
        &self,
        credentials: &SendCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        tracing::debug!(user = %credentials.user, host = %self.host, "Creating SMTP transport");

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(TransportError::from)?
            .credentials(Credentials::new(
                credentials.user.clone(),
                credentials.app_password.clone(),
            ))
            .build();
        Ok(transport)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, credentials: &SendCredentials, email: OutgoingEmail) -> Result<String> {
        let message = build_message(&credentials.user, &email)?;
        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .unwrap_or_default()
            .to_string();

        let transport = self.create_transport(credentials)?;
        transport.send(message).await.map_err(TransportError::from)?;

        tracing::info!(to = %email.to, "Email sent");
        Ok(message_id)
    }

    async fn verify(&self, credentials: &SendCredentials) -> Result<()> {
        let transport = self.create_transport(credentials)?;
        let connected = transport
            .test_connection()
            .await
            .map_err(TransportError::from)?;

        if connected {
            Ok(())
        } else {
            Err(TransportError::VerifyFailed {
                host: self.host.clone(),
            }
            .into())
        }
    }
}
