use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::format::{Item, StrftimeItems};
use chrono::FixedOffset;

use crate::workflows::careers::clients::email::DEFAULT_ENDPOINT;
use crate::workflows::careers::{ExportOptions, NotificationTemplate};

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
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub backend: BackendConfig,
    pub notifications: NotificationConfig,
    pub admin: AdminConfig,
    pub export: ExportConfig,
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let utc_offset_minutes = var_or("EXPORT_UTC_OFFSET_MINUTES", "0")
            .parse::<i32>()
            .map_err(|_| ConfigError::InvalidUtcOffset)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            backend: BackendConfig {
                url: var("RECORD_STORE_URL"),
                api_key: var("RECORD_STORE_KEY"),
                table: var_or("RECORD_STORE_TABLE", "applications"),
                bucket: var_or("BLOB_STORE_BUCKET", "resumes"),
            },
            notifications: NotificationConfig {
                endpoint: var("NOTIFY_ENDPOINT"),
                service_id: var_or("NOTIFY_SERVICE_ID", ""),
                template_id: var_or("NOTIFY_TEMPLATE_ID", ""),
                public_key: var_or("NOTIFY_PUBLIC_KEY", ""),
                recipient: var_or("NOTIFY_RECIPIENT", ""),
            },
            admin: AdminConfig {
                access_token: var("ADMIN_ACCESS_TOKEN"),
            },
            export: ExportConfig {
                date_format: var_or("EXPORT_DATE_FORMAT", "%-m/%-d/%Y"),
                utc_offset_minutes,
            },
        })
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

/// Log filtering and formatting.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Hosted record/blob service. Without a url and key the in-memory backends are used.
#[derive(Clone)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub bucket: String,
}

impl BackendConfig {
    /// Url and key when both are configured.
    pub fn hosted(&self) -> Option<(&str, &str)> {
        match (&self.url, &self.api_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("table", &self.table)
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Email template used for application notifications and contact messages.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub endpoint: Option<String>,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub recipient: String,
}

impl NotificationConfig {
    /// Endpoint of the hosted email service, or `None` to capture notifications locally.
    pub fn hosted_endpoint(&self) -> Option<&str> {
        match &self.endpoint {
            Some(endpoint) if endpoint.eq_ignore_ascii_case("default") => Some(DEFAULT_ENDPOINT),
            Some(endpoint) => Some(endpoint.as_str()),
            None => None,
        }
    }

    pub fn template(&self) -> NotificationTemplate {
        NotificationTemplate {
            service_id: self.service_id.clone(),
            template_id: self.template_id.clone(),
            public_key: self.public_key.clone(),
            recipient: self.recipient.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AdminConfig {
    pub access_token: Option<String>,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub date_format: String,
    pub utc_offset_minutes: i32,
}

impl ExportConfig {
    pub fn options(&self) -> Result<ExportOptions, ConfigError> {
        let utc_offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidUtcOffset)?;
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(self.date_format.clone()));
        }
        Ok(ExportOptions {
            date_format: self.date_format.clone(),
            utc_offset,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUtcOffset,
    InvalidDateFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUtcOffset => write!(
                f,
                "EXPORT_UTC_OFFSET_MINUTES must be whole minutes within +/-24 hours"
            ),
            ConfigError::InvalidDateFormat(format) => write!(
                f,
                "EXPORT_DATE_FORMAT '{format}' is not a valid strftime pattern"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidUtcOffset
            | ConfigError::InvalidDateFormat(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
