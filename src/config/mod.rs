use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
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

const DEV_WEBHOOK_SECRET: &str = "watchyard-dev-secret";

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub webhook: WebhookConfig,
    pub vendor: VendorConfig,
    pub moderation: ModerationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let shared_secret =
            env::var("WEBHOOK_SHARED_SECRET").unwrap_or_else(|_| DEV_WEBHOOK_SECRET.to_string());
        if environment == AppEnvironment::Production && shared_secret == DEV_WEBHOOK_SECRET {
            return Err(ConfigError::MissingWebhookSecret);
        }

        let callback_url = env::var("VENDOR_CALLBACK_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api/v1/identity/verification/webhook".to_string());

        let min_report_reason_chars = parse_env("REPORT_REASON_MIN_CHARS", 10usize)?;
        let report_rate_limit = parse_env("REPORT_RATE_LIMIT", 5u32)?;
        let report_rate_window_secs = parse_env("REPORT_RATE_WINDOW_SECS", 3600u64)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            webhook: WebhookConfig { shared_secret },
            vendor: VendorConfig { callback_url },
            moderation: ModerationConfig {
                min_report_reason_chars,
                report_rate_limit,
                report_rate_window: Duration::from_secs(report_rate_window_secs),
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Shared secret used to authenticate inbound identity-vendor callbacks.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub shared_secret: String,
}

/// Settings for outbound calls to the identity-verification vendor.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub callback_url: String,
}

/// Policy dials for the moderation services.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub min_report_reason_chars: usize,
    pub report_rate_limit: u32,
    pub report_rate_window: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    MissingWebhookSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::MissingWebhookSecret => {
                write!(
                    f,
                    "WEBHOOK_SHARED_SECRET must be set to a non-default value in production"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
