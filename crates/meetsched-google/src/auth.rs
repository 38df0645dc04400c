//! Credential acquisition with an explicit two-state handle.
//!
//! The authenticator starts `Uninitialized` and moves to `Ready` on the
//! first [`Authenticator::ensure_ready`] call. Authentication never happens
//! at construction time; every later call reuses the cached credentials
//! until the access token expires, then re-authenticates.
//!
//! Per-call states within one authentication attempt:
//! cached-valid (use as-is), cached-expired (refresh, persist on success),
//! absent (interactive flow in OAuth mode, assertion exchange in
//! service-account mode).

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{AuthMode, GoogleConfig, OAuthCredentials};
use crate::error::{ProviderError, ProviderResult};
use crate::oauth::OAuthClient;
use crate::service_account::ServiceAccountKey;
use crate::tokens::{TokenInfo, TokenStorage};

/// Credentials ready for API use.
#[derive(Debug, Clone)]
pub struct AccessCredentials {
    /// Bearer token for API requests.
    pub access_token: String,
    /// When the token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessCredentials {
    fn new(access_token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: expires_in_secs
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs.saturating_sub(60))),
        }
    }

    fn from_tokens(tokens: &TokenInfo) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            expires_at: tokens.expires_at,
        }
    }

    /// Returns true if the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}

/// The authenticator's cached state.
#[derive(Debug)]
enum AuthState {
    Uninitialized,
    Ready(AccessCredentials),
}

/// Produces valid provider credentials on demand.
#[derive(Debug)]
pub struct Authenticator {
    mode: AuthMode,
    scopes: Vec<String>,
    timeout: Duration,
    token_url: String,
    /// OAuth token cache; None in service-account mode.
    storage: Option<TokenStorage>,
    state: RwLock<AuthState>,
}

impl Authenticator {
    /// Creates an authenticator from the provider configuration.
    ///
    /// No I/O happens here; credentials are acquired lazily.
    pub fn new(config: &GoogleConfig) -> Self {
        let storage = match &config.auth {
            AuthMode::OAuth { token_path, .. } => Some(TokenStorage::new(token_path)),
            AuthMode::ServiceAccount { .. } => None,
        };

        Self {
            mode: config.auth.clone(),
            scopes: config.scopes.clone(),
            timeout: config.timeout,
            token_url: config.token_url.clone(),
            storage,
            state: RwLock::new(AuthState::Uninitialized),
        }
    }

    /// Returns valid credentials, authenticating or refreshing as needed.
    pub async fn ensure_ready(&self) -> ProviderResult<AccessCredentials> {
        {
            let state = self.state.read().await;
            if let AuthState::Ready(creds) = &*state
                && !creds.is_expired()
            {
                return Ok(creds.clone());
            }
        }

        let mut state = self.state.write().await;
        // Another task may have authenticated while we waited for the lock.
        if let AuthState::Ready(creds) = &*state
            && !creds.is_expired()
        {
            return Ok(creds.clone());
        }

        let creds = match &self.mode {
            AuthMode::ServiceAccount { key_path } => {
                debug!("authenticating with service account key {:?}", key_path);
                let key = ServiceAccountKey::from_file(key_path)?;
                let (access_token, expires_in) = key.exchange(&self.scopes, self.timeout).await?;
                AccessCredentials::new(access_token, expires_in)
            }
            AuthMode::OAuth {
                credentials_path,
                redirect_port,
                ..
            } => {
                self.oauth_authenticate(credentials_path, *redirect_port)
                    .await?
            }
        };

        *state = AuthState::Ready(creds.clone());
        Ok(creds)
    }

    /// Runs the OAuth branch: cached token, refresh, or interactive flow.
    async fn oauth_authenticate(
        &self,
        credentials_path: &std::path::Path,
        redirect_port: u16,
    ) -> ProviderResult<AccessCredentials> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| ProviderError::internal("token storage missing in OAuth mode"))?;
        storage.load()?;

        if let Some(tokens) = storage.get() {
            if !tokens.is_expired() {
                debug!("using cached access token from {:?}", storage.path());
                return Ok(AccessCredentials::from_tokens(&tokens));
            }

            if let Some(refresh_token) = tokens.refresh_token.clone() {
                debug!("cached access token expired, refreshing");
                let client = self.oauth_client(credentials_path)?;
                match client.refresh_token(&refresh_token).await {
                    Ok((access_token, expires_in)) => {
                        storage.update_access_token(&access_token, expires_in)?;
                        return Ok(AccessCredentials::new(access_token, expires_in));
                    }
                    Err(e) => {
                        // Treat a failed refresh like an absent token and
                        // fall through to the interactive flow.
                        warn!("token refresh failed: {}", e);
                    }
                }
            }
        }

        info!("no usable cached token, starting interactive authorization");
        let client = self.oauth_client(credentials_path)?;
        let tokens = client.authorize(&self.scopes, redirect_port).await?;
        storage.set(tokens.clone())?;
        Ok(AccessCredentials::from_tokens(&tokens))
    }

    fn oauth_client(&self, credentials_path: &std::path::Path) -> ProviderResult<OAuthClient> {
        let credentials = OAuthCredentials::from_file(credentials_path)?;
        credentials
            .validate()
            .map_err(ProviderError::authentication)?;
        OAuthClient::new(credentials, self.timeout, &self.token_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    fn write_client_secret(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "test.apps.googleusercontent.com", "client_secret": "s"}}"#,
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn service_account_missing_key_fails_before_any_call() {
        let config = GoogleConfig::service_account("/nonexistent/key.json");
        let auth = Authenticator::new(&config);

        let err = auth.ensure_ready().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn cached_valid_token_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let credentials_path = write_client_secret(&dir);
        let token_path = dir.path().join("token.json");

        TokenStorage::new(&token_path)
            .set(TokenInfo::new("cached-token", None, Some(3600), vec![]))
            .unwrap();

        let config = GoogleConfig::oauth(credentials_path, token_path, 18080);
        let auth = Authenticator::new(&config);

        let creds = auth.ensure_ready().await.unwrap();
        assert_eq!(creds.access_token, "cached-token");

        // Second call hits the Ready state, not the token file.
        let again = auth.ensure_ready().await.unwrap();
        assert_eq!(again.access_token, "cached-token");
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "refreshed-token", "expires_in": 3600}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let credentials_path = write_client_secret(&dir);
        let token_path = dir.path().join("token.json");

        let mut stale = TokenInfo::new(
            "stale-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec![],
        );
        stale.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        TokenStorage::new(&token_path).set(stale).unwrap();

        let config = GoogleConfig::oauth(credentials_path, &token_path, 18081)
            .with_token_url(format!("{}/token", server.url()));
        let auth = Authenticator::new(&config);

        let creds = auth.ensure_ready().await.unwrap();
        assert_eq!(creds.access_token, "refreshed-token");

        // The refreshed token was written back to the token file.
        let storage = TokenStorage::new(&token_path);
        storage.load().unwrap();
        assert_eq!(storage.get().unwrap().access_token, "refreshed-token");
    }
}
