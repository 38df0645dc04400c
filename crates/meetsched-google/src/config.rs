//! Google Calendar provider configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// Base URL for Google Calendar API v3.
pub(crate) const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google's OAuth token endpoint.
pub(crate) const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth 2.0 client credentials from the Google Cloud Console.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
}

/// On-disk structure of a Google OAuth client-secret file.
///
/// Supports the Cloud Console download format with an "installed" or "web"
/// section, and the flat format with client_id/client_secret at the root.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    /// Creates credentials from raw values.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a client-secret JSON file.
    ///
    /// A missing or malformed file is an authentication error; the caller
    /// surfaces it as an opaque failure.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::authentication(format!(
                "failed to read client secret file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from client-secret JSON.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::authentication(format!("failed to parse client secret file: {}", e))
        })?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err(ProviderError::authentication(
            "client secret file must contain an 'installed'/'web' section \
             or 'client_id'/'client_secret' at the root",
        ))
    }

    /// Checks that the credentials look usable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// How the provider authenticates.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Interactive OAuth 2.0 flow with on-disk token caching.
    OAuth {
        /// Path to the client-secret JSON file.
        credentials_path: PathBuf,
        /// Path where OAuth tokens are cached.
        token_path: PathBuf,
        /// Loopback port for the authorization redirect.
        redirect_port: u16,
    },
    /// Non-interactive service-account key.
    ServiceAccount {
        /// Path to the provider-issued key file.
        key_path: PathBuf,
    },
}

/// Configuration for the Google Calendar provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Calendar to operate on (e.g. "primary").
    pub calendar_id: String,

    /// Credential acquisition mode.
    pub auth: AuthMode,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,

    /// Request timeout.
    pub timeout: Duration,

    /// Calendar API base URL. Overridable for tests.
    pub api_base_url: String,

    /// OAuth token endpoint. Overridable for tests.
    pub token_url: String,
}

impl GoogleConfig {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// OAuth scope for full calendar access (lists and inserts events).
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";

    /// Creates a configuration using the interactive OAuth flow.
    pub fn oauth(
        credentials_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
        redirect_port: u16,
    ) -> Self {
        Self::with_auth(AuthMode::OAuth {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            redirect_port,
        })
    }

    /// Creates a configuration using a service-account key.
    pub fn service_account(key_path: impl Into<PathBuf>) -> Self {
        Self::with_auth(AuthMode::ServiceAccount {
            key_path: key_path.into(),
        })
    }

    fn with_auth(auth: AuthMode) -> Self {
        Self {
            calendar_id: "primary".to_string(),
            auth,
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            api_base_url: CALENDAR_API_BASE.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    /// Sets the calendar id.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Overrides the Calendar API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Overrides the OAuth token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.calendar_id.is_empty() {
            return Err(ProviderError::configuration("calendar_id must not be empty"));
        }
        if self.scopes.is_empty() {
            return Err(ProviderError::configuration(
                "at least one OAuth scope is required",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_config_defaults() {
        let config = GoogleConfig::oauth("credentials.json", "token.json", 8080);
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.scopes, vec![GoogleConfig::DEFAULT_SCOPE.to_string()]);
        assert_eq!(config.api_base_url, CALENDAR_API_BASE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn service_account_config() {
        let config = GoogleConfig::service_account("service-account.json")
            .with_calendar_id("team@example.com");
        assert_eq!(config.calendar_id, "team@example.com");
        assert!(matches!(config.auth, AuthMode::ServiceAccount { .. }));
    }

    #[test]
    fn validate_rejects_empty_values() {
        let config = GoogleConfig::oauth("c.json", "t.json", 8080).with_calendar_id("");
        assert!(config.validate().is_err());

        let config = GoogleConfig::oauth("c.json", "t.json", 8080).with_scopes(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn credentials_from_json_installed() {
        let json = r#"{
            "installed": {
                "client_id": "test-id.apps.googleusercontent.com",
                "client_secret": "test-secret"
            }
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "test-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "test-secret");
    }

    #[test]
    fn credentials_from_json_flat() {
        let json = r#"{
            "client_id": "flat-id.apps.googleusercontent.com",
            "client_secret": "flat-secret"
        }"#;

        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "flat-id.apps.googleusercontent.com");
    }

    #[test]
    fn credentials_from_json_invalid() {
        assert!(OAuthCredentials::from_json(r#"{ "other": {} }"#).is_err());
        assert!(OAuthCredentials::from_json("not json").is_err());
    }

    #[test]
    fn credentials_validation() {
        assert!(OAuthCredentials::new("id", "secret").validate().is_ok());
        assert!(OAuthCredentials::new("", "secret").validate().is_err());
        assert!(OAuthCredentials::new("id", "").validate().is_err());
    }
}
