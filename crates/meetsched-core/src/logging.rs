//! Logging setup for meetsched.
//!
//! Provides a single tracing-subscriber initialization shared by the
//! server binary and tests. The profile is picked from the `ENVIRONMENT`
//! variable (development, staging, production) and the level can be
//! overridden with `LOG_LEVEL` or a full `RUST_LOG` directive.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to set the global subscriber (already initialized).
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse an env filter directive.
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format for local development.
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
    /// JSON format for structured log collection.
    Json,
}

/// Configuration for logging initialization.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level when `RUST_LOG` is not set.
    pub level: Level,
    /// Output format for log lines.
    pub format: LogFormat,
    /// Whether to include file/line information.
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Builds a config from `ENVIRONMENT` and `LOG_LEVEL`.
    ///
    /// - `development` (default): debug level, pretty output, locations
    /// - `staging`: warn level, compact output
    /// - `production`: info level, JSON output
    pub fn from_env() -> Self {
        let environment = std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        let mut config = match environment.as_str() {
            "production" => Self {
                level: Level::INFO,
                format: LogFormat::Json,
                include_location: false,
            },
            "staging" => Self {
                level: Level::WARN,
                format: LogFormat::Compact,
                include_location: false,
            },
            _ => Self {
                level: Level::DEBUG,
                format: LogFormat::Pretty,
                include_location: true,
            },
        };

        if let Ok(level) = std::env::var("LOG_LEVEL")
            && let Ok(parsed) = level.parse::<Level>()
        {
            config.level = parsed;
        }

        config
    }

    /// Sets the default level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Initializes the global tracing subscriber.
///
/// Call once at process start. `RUST_LOG` overrides the default
/// per-crate filter.
///
/// # Errors
///
/// Returns an error if a global subscriber was already set.
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "meetsched_server={level},meetsched_google={level},meetsched_core={level}",
            level = config.level
        ))
    });

    match config.format {
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .pretty()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Compact => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .compact()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .json()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            );
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.include_location);
    }

    #[test]
    fn builder_methods() {
        let config = LogConfig::default()
            .with_level(Level::TRACE)
            .with_format(LogFormat::Json);
        assert_eq!(config.level, Level::TRACE);
        assert_eq!(config.format, LogFormat::Json);
    }
}
