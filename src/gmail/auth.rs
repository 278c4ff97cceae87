//! OAuth access tokens for the Gmail API
//!
//! Exchanges the configured refresh token for a short-lived access token.
//! Tokens live only as long as the [`Authenticator`] that fetched them.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::OAuthCredentials;
use crate::error::{AuthError, GmailMcpError, Result};

/// Refresh this many seconds before the provider's expiry
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Token response from OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// A fetched access token
#[derive(Debug, Clone)]
struct AccessToken {
    token: String,

    /// Expiry timestamp (Unix seconds)
    expires_at: Option<i64>,
}

impl AccessToken {
    fn is_fresh(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expiry) => expiry - now >= EXPIRY_MARGIN_SECS,
            None => true,
        }
    }
}

/// OAuth authenticator
pub struct Authenticator {
    /// HTTP client
    http_client: reqwest::Client,

    /// OAuth client credentials and refresh token
    credentials: OAuthCredentials,

    /// Token endpoint
    token_uri: String,

    /// Current access token
    access_token: RwLock<Option<AccessToken>>,
}

impl Authenticator {
    /// Create a new authenticator
    pub fn new(http_client: reqwest::Client, credentials: OAuthCredentials, token_uri: String) -> Self {
        Self {
            http_client,
            credentials,
            token_uri,
            access_token: RwLock::new(None),
        }
    }

    /// Get a valid access token, refreshing if necessary
    pub async fn get_access_token(&self) -> Result<String> {
        if let Some(ref token) = *self.access_token.read().await {
            if token.is_fresh(unix_now()) {
                return Ok(token.token.clone());
            }
        }

        self.refresh_token().await
    }

    /// Refresh the access token using the refresh token
    async fn refresh_token(&self) -> Result<String> {
        tracing::debug!(client_id = %self.credentials.client_id, "Refreshing Gmail access token");

        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GmailMcpError::Auth(AuthError::TokenRefreshFailed {
                message: format!("({}) {}", status, text),
            }));
        }

        let token_response: TokenResponse = response.json().await?;

        let token = AccessToken {
            token: token_response.access_token,
            expires_at: token_response.expires_in.map(|e| unix_now() + e),
        };
        let value = token.token.clone();
        *self.access_token.write().await = Some(token);

        Ok(value)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> OAuthCredentials {
        OAuthCredentials {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "http://localhost:3000/oauth2callback".to_string(),
            refresh_token: "refresh-token".to_string(),
        }
    }

    #[test]
    fn test_token_freshness() {
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: Some(1_000),
        };
        assert!(token.is_fresh(600));
        assert!(!token.is_fresh(800));

        let forever = AccessToken {
            token: "t".to_string(),
            expires_at: None,
        };
        assert!(forever.is_fresh(i64::MAX));
    }

    #[tokio::test]
    async fn test_refresh_once_then_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = Authenticator::new(
            reqwest::Client::new(),
            credentials(),
            format!("{}/token", server.uri()),
        );
        assert_eq!(auth.get_access_token().await.unwrap(), "access-1");
        assert_eq!(auth.get_access_token().await.unwrap(), "access-1");
    }

    #[tokio::test]
    async fn test_refresh_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let auth = Authenticator::new(
            reqwest::Client::new(),
            credentials(),
            format!("{}/token", server.uri()),
        );
        let err = auth.get_access_token().await.unwrap_err();
        assert!(matches!(err, GmailMcpError::Auth(AuthError::TokenRefreshFailed { .. })));
        assert!(err.to_string().contains("invalid_grant"));
    }
}
