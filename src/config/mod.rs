use std::env;
use std::fmt;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub transport: TransportConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let bot_token =
            env::var("APP_BOT_TOKEN").map_err(|_| ConfigError::Missing("APP_BOT_TOKEN"))?;
        let database_url =
            env::var("APP_DATABASE_URL").map_err(|_| ConfigError::Missing("APP_DATABASE_URL"))?;

        let session_ttl_minutes = env::var("APP_SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSessionTtl)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            transport: TransportConfig { bot_token },
            storage: StorageConfig { database_url },
            session: SessionConfig {
                idle_ttl: Duration::from_secs(session_ttl_minutes * 60),
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Credential for the hosting chat transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub bot_token: String,
}

/// Connection string for the backing store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_url: String,
}

/// Conversation-session controls.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_ttl: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidSessionTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{var} must be set"),
            ConfigError::InvalidSessionTtl => {
                write!(f, "APP_SESSION_TTL_MINUTES must be a whole number of minutes")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
