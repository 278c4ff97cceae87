//! Gmail utility functions
//!
//! Body decoding and header extraction for messages returned by the API.

use std::collections::{BTreeMap, VecDeque};

use base64::{engine::general_purpose, Engine};

use crate::error::{GmailApiError, GmailMcpError, Result};
use crate::gmail::types::{Message, MessagePart};

/// Headers reported for unread-message summaries
pub const SUMMARY_HEADERS: &[&str] = &["Subject", "From", "Date"];

/// Headers reported for a full message
pub const DETAIL_HEADERS: &[&str] = &["Subject", "From", "To", "Date"];

/// Decode base64url data from Gmail API
/// Handles both padded and non-padded base64url encoding
pub fn decode_base64url(data: &str) -> Result<Vec<u8>> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| general_purpose::URL_SAFE.decode(data))
        .or_else(|_| general_purpose::STANDARD.decode(data))
        .map_err(|e| {
            GmailMcpError::Gmail(GmailApiError::MalformedBody {
                message: e.to_string(),
            })
        })
}

/// Return the first `text/plain` leaf of the message, breadth-first.
///
/// Parts are visited in the provider's order, so a plain-text part wins over
/// an HTML sibling regardless of which comes first. Returns an empty string
/// when the message has no plain-text part with data.
pub fn decode_message_body(message: &Message) -> String {
    let Some(payload) = message.payload.as_ref() else {
        return String::new();
    };

    let mut queue: VecDeque<&MessagePart> = VecDeque::from([payload]);
    while let Some(part) = queue.pop_front() {
        queue.extend(part.parts.iter());

        if part.mime_type.as_deref() != Some("text/plain") {
            continue;
        }
        let Some(data) = part
            .body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
        else {
            continue;
        };

        match decode_base64url(data) {
            Ok(bytes) => return String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => tracing::debug!("Skipping undecodable text/plain part: {}", e),
        }
    }

    String::new()
}

/// Collect the requested top-level headers, keyed by the requested name.
/// Matching is case-insensitive; unrequested headers are ignored.
pub fn extract_headers(message: &Message, wanted: &[&str]) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    let Some(payload) = message.payload.as_ref() else {
        return headers;
    };

    for header in &payload.headers {
        if let Some(name) = wanted.iter().find(|w| w.eq_ignore_ascii_case(&header.name)) {
            headers.insert(name.to_string(), header.value.clone());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::types::{Header, MessagePartBody};

    fn leaf(mime_type: &str, text: &str) -> MessagePart {
        MessagePart {
            mime_type: Some(mime_type.to_string()),
            body: Some(MessagePartBody {
                data: Some(general_purpose::URL_SAFE_NO_PAD.encode(text)),
            }),
            ..Default::default()
        }
    }

    fn message(payload: MessagePart) -> Message {
        Message {
            id: "m1".to_string(),
            thread_id: None,
            snippet: None,
            payload: Some(payload),
        }
    }

    #[test]
    fn test_decode_base64url() {
        let decoded = decode_base64url("SGVsbG8gV29ybGQ").unwrap();
        assert_eq!(decoded, b"Hello World");
        let padded = decode_base64url("SGVsbG8gV29ybGQ=").unwrap();
        assert_eq!(padded, b"Hello World");
    }

    #[test]
    fn test_plain_text_after_html() {
        let msg = message(MessagePart {
            mime_type: Some("multipart/alternative".to_string()),
            parts: vec![leaf("text/html", "<p>hi</p>"), leaf("text/plain", "hi")],
            ..Default::default()
        });
        assert_eq!(decode_message_body(&msg), "hi");
    }

    #[test]
    fn test_breadth_first_prefers_shallow_part() {
        let nested = MessagePart {
            mime_type: Some("multipart/alternative".to_string()),
            parts: vec![leaf("text/plain", "deep")],
            ..Default::default()
        };
        let msg = message(MessagePart {
            mime_type: Some("multipart/mixed".to_string()),
            parts: vec![nested, leaf("text/plain", "shallow")],
            ..Default::default()
        });
        assert_eq!(decode_message_body(&msg), "shallow");
    }

    #[test]
    fn test_single_part_message() {
        let msg = message(leaf("text/plain", "just text"));
        assert_eq!(decode_message_body(&msg), "just text");
    }

    #[test]
    fn test_no_plain_text() {
        let msg = message(MessagePart {
            mime_type: Some("multipart/alternative".to_string()),
            parts: vec![leaf("text/html", "<p>only html</p>")],
            ..Default::default()
        });
        assert_eq!(decode_message_body(&msg), "");

        let empty = Message {
            payload: None,
            ..msg
        };
        assert_eq!(decode_message_body(&empty), "");
    }

    #[test]
    fn test_extract_headers() {
        let msg = message(MessagePart {
            headers: vec![
                Header { name: "subject".to_string(), value: "Hi".to_string() },
                Header { name: "From".to_string(), value: "a@b.com".to_string() },
                Header { name: "Received".to_string(), value: "x".to_string() },
            ],
            ..Default::default()
        });
        let headers = extract_headers(&msg, SUMMARY_HEADERS);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Subject"], "Hi");
        assert_eq!(headers["From"], "a@b.com");
    }
}
