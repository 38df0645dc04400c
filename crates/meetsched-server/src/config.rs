//! Application configuration, read from the environment at startup.
//!
//! Every variable has a documented default so a bare `meetsched` invocation
//! runs against the primary calendar with an interactive OAuth flow:
//!
//! | Variable              | Default        |
//! |-----------------------|----------------|
//! | `MEETSCHED_HOST`      | `0.0.0.0`      |
//! | `MEETSCHED_PORT`      | `3000`         |
//! | `CALENDAR_ID`         | `primary`      |
//! | `USE_SERVICE_ACCOUNT` | `false`        |
//! | `OAUTH_REDIRECT_PORT` | `8080`         |
//! | `CONFIG_DIR`          | `./config`     |
//! | `DEFAULT_EVENT_TITLE` | `Demo Meeting` |
//! | `DEFAULT_TIMEZONE`    | `UTC`          |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono_tz::Tz;
use thiserror::Error;

use meetsched_google::GoogleConfig;

/// Client-secret file expected inside the config directory in OAuth mode.
const CREDENTIALS_FILE: &str = "credentials.json";

/// Token cache file written inside the config directory in OAuth mode.
const TOKENS_FILE: &str = "tokens.json";

/// Key file expected inside the config directory in service-account mode.
const SERVICE_ACCOUNT_FILE: &str = "service-account.json";

/// A configuration value that could not be read or parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("credential file not found: {0}")]
    MissingCredentials(PathBuf),

    #[error("failed to create config directory {path}: {source}")]
    ConfigDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Interface the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Calendar all operations target.
    pub calendar_id: String,
    /// Use a service-account key instead of the interactive OAuth flow.
    pub use_service_account: bool,
    /// Loopback port for the OAuth authorization redirect.
    pub oauth_redirect_port: u16,
    /// Directory holding credential and token files.
    pub config_dir: PathBuf,
    /// Title substituted when a create request omits one.
    pub default_event_title: String,
    /// Timezone substituted when a create request omits one.
    pub default_timezone: Tz,
}

impl AppConfig {
    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("MEETSCHED_HOST", "0.0.0.0");
        let port = parse_env("MEETSCHED_PORT", 3000)?;
        let calendar_id = env_or("CALENDAR_ID", "primary");
        let use_service_account = parse_bool_env("USE_SERVICE_ACCOUNT", false)?;
        let oauth_redirect_port = parse_env("OAUTH_REDIRECT_PORT", 8080)?;
        let config_dir = PathBuf::from(env_or("CONFIG_DIR", "./config"));
        let default_event_title = env_or("DEFAULT_EVENT_TITLE", "Demo Meeting");

        let tz_name = env_or("DEFAULT_TIMEZONE", "UTC");
        let default_timezone: Tz =
            tz_name
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    var: "DEFAULT_TIMEZONE",
                    value: tz_name.clone(),
                    reason: "not an IANA timezone name".to_string(),
                })?;

        Ok(Self {
            host,
            port,
            calendar_id,
            use_service_account,
            oauth_redirect_port,
            config_dir,
            default_event_title,
            default_timezone,
        })
    }

    /// The socket address the server listens on.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                var: "MEETSCHED_HOST",
                value: self.host.clone(),
                reason: format!("{}", e),
            })
    }

    /// Creates the config directory if it does not exist yet.
    pub fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::ConfigDir {
            path: self.config_dir.clone(),
            source,
        })
    }

    /// Checks that the credential file for the active auth mode exists.
    ///
    /// Run after [`ensure_config_dir`](Self::ensure_config_dir) so a missing
    /// file fails at startup with a clear path instead of on the first
    /// request.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        let required = if self.use_service_account {
            self.config_dir.join(SERVICE_ACCOUNT_FILE)
        } else {
            self.config_dir.join(CREDENTIALS_FILE)
        };

        if !required.is_file() {
            return Err(ConfigError::MissingCredentials(required));
        }
        Ok(())
    }

    /// Builds the provider configuration for this application config.
    pub fn google_config(&self) -> GoogleConfig {
        let config = if self.use_service_account {
            GoogleConfig::service_account(self.config_dir.join(SERVICE_ACCOUNT_FILE))
        } else {
            GoogleConfig::oauth(
                self.config_dir.join(CREDENTIALS_FILE),
                self.config_dir.join(TOKENS_FILE),
                self.oauth_redirect_port,
            )
        };
        config.with_calendar_id(&self.calendar_id)
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            value,
            reason: format!("{}", e),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool_env(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var,
                value,
                reason: "expected true/false".to_string(),
            }),
        },
        Err(_) => Ok(default),
    }
}
