//! Configuration management for the Gmail mailer MCP server
//!
//! Credentials are read once from the environment (optionally seeded from a
//! `.env` file) into an immutable [`Config`] shared by the dispatcher and the
//! adapters.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, GmailMcpError, Result};

/// Environment variable names
pub mod env {
    pub const GMAIL_USER: &str = "GMAIL_USER";
    pub const GMAIL_APP_PASSWORD: &str = "GMAIL_APP_PASSWORD";

    pub const GMAIL_CLIENT_ID: &str = "GMAIL_CLIENT_ID";
    pub const GMAIL_CLIENT_SECRET: &str = "GMAIL_CLIENT_SECRET";
    pub const GMAIL_REDIRECT_URI: &str = "GMAIL_REDIRECT_URI";
    pub const GMAIL_REFRESH_TOKEN: &str = "GMAIL_REFRESH_TOKEN";

    pub const GMAIL_TEMPLATES_DIR: &str = "GMAIL_TEMPLATES_DIR";
    pub const GMAIL_SMTP_HOST: &str = "GMAIL_SMTP_HOST";
    pub const GMAIL_API_BASE_URL: &str = "GMAIL_API_BASE_URL";
    pub const GMAIL_TOKEN_URI: &str = "GMAIL_TOKEN_URI";

    /// The four variables every OAuth-backed tool needs
    pub const OAUTH_VARS: [&str; 4] = [
        GMAIL_CLIENT_ID,
        GMAIL_CLIENT_SECRET,
        GMAIL_REDIRECT_URI,
        GMAIL_REFRESH_TOKEN,
    ];
}

/// App-password credentials for the send path
#[derive(Clone)]
pub struct SendCredentials {
    pub user: String,
    pub app_password: String,
}

impl fmt::Debug for SendCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendCredentials")
            .field("user", &self.user)
            .field("app_password", &"[HIDDEN]")
            .finish()
    }
}

/// OAuth2 credentials for mailbox access
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[HIDDEN]")
            .field("redirect_uri", &self.redirect_uri)
            .field("refresh_token", &"[HIDDEN]")
            .finish()
    }
}

/// Configuration for the Gmail mailer MCP server
#[derive(Debug, Clone)]
pub struct Config {
    /// Sending account and app password, when both are set
    pub send: Option<SendCredentials>,

    /// OAuth2 credential set, when all four fields are set
    pub oauth: Option<OAuthCredentials>,

    /// Names of OAuth variables that were absent or empty
    pub missing_oauth_vars: Vec<&'static str>,

    /// Directory holding `.txt` email templates
    pub templates_dir: PathBuf,

    /// SMTP relay host for the send path
    pub smtp_host: String,

    /// Base URL for Gmail API
    pub api_base_url: String,

    /// OAuth token endpoint
    pub token_uri: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `env_file` is loaded first if given; otherwise `./.env` is loaded when
    /// present. Variables already set in the environment take precedence.
    pub fn new(env_file: Option<&Path>) -> Result<Self> {
        load_env_file(env_file);
        let cwd = std::env::current_dir()?;
        Ok(Self::from_vars(std::env::vars(), &cwd))
    }

    /// Build a configuration from explicit variables, resolving relative
    /// paths against `base_dir`
    pub fn from_vars<I>(vars: I, base_dir: &Path) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        let get = |key: &str| vars.get(key).cloned();

        let send = match (get(env::GMAIL_USER), get(env::GMAIL_APP_PASSWORD)) {
            (Some(user), Some(app_password)) => Some(SendCredentials { user, app_password }),
            _ => None,
        };

        let missing_oauth_vars: Vec<&'static str> = env::OAUTH_VARS
            .iter()
            .copied()
            .filter(|key| !vars.contains_key(*key))
            .collect();

        let oauth = match (
            get(env::GMAIL_CLIENT_ID),
            get(env::GMAIL_CLIENT_SECRET),
            get(env::GMAIL_REDIRECT_URI),
            get(env::GMAIL_REFRESH_TOKEN),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_uri), Some(refresh_token)) => {
                Some(OAuthCredentials {
                    client_id,
                    client_secret,
                    redirect_uri,
                    refresh_token,
                })
            }
            _ => None,
        };

        let templates_dir = get(env::GMAIL_TEMPLATES_DIR)
            .map(|dir| base_dir.join(dir))
            .unwrap_or_else(|| base_dir.join(defaults::TEMPLATES_DIR));

        Self {
            send,
            oauth,
            missing_oauth_vars,
            templates_dir,
            smtp_host: get(env::GMAIL_SMTP_HOST).unwrap_or_else(|| defaults::SMTP_HOST.to_string()),
            api_base_url: get(env::GMAIL_API_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| gmail::API_BASE_URL.to_string()),
            token_uri: get(env::GMAIL_TOKEN_URI).unwrap_or_else(|| gmail::TOKEN_URI.to_string()),
        }
    }

    /// Send credentials, or a configuration error when either is missing
    pub fn require_send(&self) -> Result<&SendCredentials> {
        self.send
            .as_ref()
            .ok_or(GmailMcpError::Config(ConfigError::MissingSendCredentials))
    }

    /// OAuth credentials, or a configuration error when any field is missing
    pub fn require_oauth(&self) -> Result<&OAuthCredentials> {
        self.oauth
            .as_ref()
            .ok_or(GmailMcpError::Config(ConfigError::MissingOAuthCredentials))
    }

    /// Whether all four OAuth variables are present
    pub fn has_oauth(&self) -> bool {
        self.oauth.is_some()
    }
}

/// Load a dotenv file into the process environment without overriding
/// variables that are already set. Failures are logged, never fatal.
fn load_env_file(env_file: Option<&Path>) {
    let result = match env_file {
        Some(path) => dotenv::from_path(path).map_err(|e| (path.to_path_buf(), e)),
        None => {
            let local = PathBuf::from(".env");
            if !local.exists() {
                return;
            }
            dotenv::from_path(&local).map_err(|e| (local, e))
        }
    };

    match result {
        Ok(()) => tracing::debug!("Loaded environment file"),
        Err((path, e)) => {
            let err = ConfigError::EnvFile {
                path: path.display().to_string(),
                message: e.to_string(),
            };
            tracing::warn!("{}", err);
        }
    }
}

/// Built-in defaults
pub mod defaults {
    /// Templates directory, relative to the working directory
    pub const TEMPLATES_DIR: &str = "templates";

    /// Gmail SMTP relay
    pub const SMTP_HOST: &str = "smtp.gmail.com";
}

/// Gmail API constants
pub mod gmail {
    /// Base URL for Gmail API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// Google OAuth2 token endpoint
    pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";

    /// System label IDs
    pub mod labels {
        pub const INBOX: &str = "INBOX";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new(), Path::new("/srv/mailer"));
        assert!(config.send.is_none());
        assert!(config.oauth.is_none());
        assert_eq!(config.missing_oauth_vars.len(), 4);
        assert_eq!(config.templates_dir, PathBuf::from("/srv/mailer/templates"));
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.api_base_url, gmail::API_BASE_URL);
        assert_eq!(config.token_uri, gmail::TOKEN_URI);
    }

    #[test]
    fn test_send_credentials_need_both_fields() {
        let config = Config::from_vars(vars(&[("GMAIL_USER", "me@example.com")]), Path::new("/"));
        assert!(config.send.is_none());
        assert!(config.require_send().is_err());

        let config = Config::from_vars(
            vars(&[("GMAIL_USER", "me@example.com"), ("GMAIL_APP_PASSWORD", "abcd efgh")]),
            Path::new("/"),
        );
        assert_eq!(config.require_send().unwrap().user, "me@example.com");
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let config = Config::from_vars(
            vars(&[
                ("GMAIL_CLIENT_ID", "id"),
                ("GMAIL_CLIENT_SECRET", "secret"),
                ("GMAIL_REDIRECT_URI", "http://localhost"),
                ("GMAIL_REFRESH_TOKEN", ""),
            ]),
            Path::new("/"),
        );
        assert!(!config.has_oauth());
        assert_eq!(config.missing_oauth_vars, vec!["GMAIL_REFRESH_TOKEN"]);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = Config::from_vars(
            vars(&[
                ("GMAIL_USER", "me@example.com"),
                ("GMAIL_APP_PASSWORD", "super-secret"),
                ("GMAIL_CLIENT_ID", "id"),
                ("GMAIL_CLIENT_SECRET", "client-secret"),
                ("GMAIL_REDIRECT_URI", "http://localhost"),
                ("GMAIL_REFRESH_TOKEN", "refresh-secret"),
            ]),
            Path::new("/"),
        );
        let debug = format!("{:?}", config);
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("client-secret"));
        assert!(!debug.contains("refresh-secret"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(
            vars(&[
                ("GMAIL_TEMPLATES_DIR", "mail/templates"),
                ("GMAIL_API_BASE_URL", "http://127.0.0.1:9000/"),
                ("GMAIL_TOKEN_URI", "http://127.0.0.1:9000/token"),
            ]),
            Path::new("/srv"),
        );
        assert_eq!(config.templates_dir, PathBuf::from("/srv/mail/templates"));
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.token_uri, "http://127.0.0.1:9000/token");
    }
}
