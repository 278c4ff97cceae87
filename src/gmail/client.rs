//! Gmail API client
//!
//! Mailbox operations for the OAuth-backed tools. One client is built per
//! tool call and every operation is a plain sequence of awaited requests.

use crate::config::gmail::{labels, USER_ID};
use crate::config::Config;
use crate::error::{GmailApiError, GmailMcpError, Result};
use crate::gmail::auth::Authenticator;
use crate::gmail::types::*;
use crate::gmail::utils::{decode_message_body, extract_headers, DETAIL_HEADERS, SUMMARY_HEADERS};

/// Gmail API client
pub struct GmailClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// OAuth authenticator
    authenticator: Authenticator,

    /// API base URL
    api_base_url: String,
}

impl GmailClient {
    /// Create a client from the OAuth credential set.
    ///
    /// Fails with a configuration error if any OAuth field is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config.require_oauth()?.clone();
        let http_client = reqwest::Client::new();
        let authenticator =
            Authenticator::new(http_client.clone(), credentials, config.token_uri.clone());

        Ok(Self {
            http_client,
            authenticator,
            api_base_url: config.api_base_url.clone(),
        })
    }

    /// Get a valid access token
    async fn access_token(&self) -> Result<String> {
        self.authenticator.get_access_token().await
    }

    /// Base URL for messages
    fn messages_url(&self) -> String {
        format!("{}/users/{}/messages", self.api_base_url, USER_ID)
    }

    /// Base URL for labels
    fn labels_url(&self) -> String {
        format!("{}/users/{}/labels", self.api_base_url, USER_ID)
    }

    // ==================== Primitive API calls ====================

    /// List message references matching a search query
    pub async fn list_messages(&self, query: &str, max_results: u32) -> Result<Vec<MessageRef>> {
        let token = self.access_token().await?;
        let url = format!(
            "{}?q={}&maxResults={}",
            self.messages_url(),
            urlencoding::encode(query),
            max_results
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await?;

        let response = check_status(response, "list messages", None).await?;
        let list: MessageList = response.json().await?;
        Ok(list.messages)
    }

    /// Get a message by ID
    pub async fn get_message(&self, message_id: &str, format: MessageFormat) -> Result<Message> {
        let token = self.access_token().await?;
        let url = match format {
            MessageFormat::Full => format!("{}/{}?format=full", self.messages_url(), message_id),
            MessageFormat::Metadata(headers) => {
                let mut url = format!("{}/{}?format=metadata", self.messages_url(), message_id);
                for header in headers {
                    url.push_str("&metadataHeaders=");
                    url.push_str(header);
                }
                url
            }
        };

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await?;

        let response = check_status(response, "get message", Some(message_id)).await?;
        Ok(response.json().await?)
    }

    /// Modify message labels
    pub async fn modify_message(
        &self,
        message_id: &str,
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
    ) -> Result<()> {
        let token = self.access_token().await?;
        let url = format!("{}/{}/modify", self.messages_url(), message_id);

        let request = ModifyMessageRequest {
            add_label_ids,
            remove_label_ids,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        check_status(response, "modify message", Some(message_id)).await?;
        Ok(())
    }

    /// Move a message to trash
    pub async fn trash_message(&self, message_id: &str) -> Result<()> {
        let token = self.access_token().await?;
        let url = format!("{}/{}/trash", self.messages_url(), message_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .header("Content-Length", "0")
            .send()
            .await?;

        check_status(response, "trash message", Some(message_id)).await?;
        Ok(())
    }

    // ==================== Mailbox tools ====================

    /// List all labels
    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .get(self.labels_url())
            .bearer_auth(&token)
            .send()
            .await?;

        let response = check_status(response, "list labels", None).await?;
        let list: LabelList = response.json().await?;
        Ok(list.labels)
    }

    /// List unread messages, newest first as the API orders them.
    ///
    /// One list call, then one metadata fetch per match, in listing order.
    pub async fn list_unread(&self, query: &str, max_results: u32) -> Result<Vec<MessageSummary>> {
        let q = format!("is:unread {}", query);
        let refs = self.list_messages(q.trim(), max_results).await?;

        let mut summaries = Vec::with_capacity(refs.len());
        for msg_ref in refs {
            let message = self
                .get_message(&msg_ref.id, MessageFormat::Metadata(SUMMARY_HEADERS))
                .await?;
            summaries.push(MessageSummary {
                headers: extract_headers(&message, SUMMARY_HEADERS),
                id: msg_ref.id,
                thread_id: message.thread_id,
                snippet: message.snippet,
            });
        }

        tracing::debug!("Fetched {} unread messages", summaries.len());
        Ok(summaries)
    }

    /// Fetch one message with its decoded plain-text body
    pub async fn get_email(&self, message_id: &str) -> Result<MessageDetail> {
        let message = self.get_message(message_id, MessageFormat::Full).await?;

        Ok(MessageDetail {
            id: message_id.to_string(),
            body: decode_message_body(&message),
            headers: extract_headers(&message, DETAIL_HEADERS),
            thread_id: message.thread_id,
            snippet: message.snippet,
        })
    }

    /// Archive a message by removing it from the inbox
    pub async fn archive_email(&self, message_id: &str) -> Result<MessageStatus> {
        self.modify_message(message_id, None, Some(vec![labels::INBOX.to_string()]))
            .await?;

        Ok(MessageStatus {
            id: message_id.to_string(),
            status: MessageState::Archived,
        })
    }

    /// Delete a message by moving it to trash
    pub async fn delete_email(&self, message_id: &str) -> Result<MessageStatus> {
        self.trash_message(message_id).await?;

        Ok(MessageStatus {
            id: message_id.to_string(),
            status: MessageState::Trashed,
        })
    }
}

/// Pass successful responses through; map failures to API errors
async fn check_status(
    response: reqwest::Response,
    action: &str,
    message_id: Option<&str>,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 404 {
        if let Some(message_id) = message_id {
            return Err(GmailMcpError::Gmail(GmailApiError::MessageNotFound {
                message_id: message_id.to_string(),
            }));
        }
    }

    let text = response.text().await.unwrap_or_default();
    Err(GmailMcpError::Gmail(GmailApiError::RequestFailed {
        message: format!("Failed to {} ({}): {}", action, status, text),
    }))
}
