//! Configuration module for environment variable parsing.
//!
//! Everything the receiver needs is read once at startup. Header names and the
//! signature base format must match what the sender uses; only change them if
//! CryptoStrazo announces a new format.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Marker left in sample configs; a secret containing it was never filled in.
pub const SECRET_PLACEHOLDER: &str = "PASTE_STRZ_SECRET_HERE";

/// Default signing base-string template.
pub const DEFAULT_BASE_FORMAT: &str = "{timestamp}.{body}";

/// Configuration errors that prevent startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("STRZ_SECRET is missing or still set to the placeholder")]
    MissingSecret,

    #[error("unsupported db driver: {0}")]
    UnsupportedDriver(String),

    #[error("mysql driver selected but STRZ_DB_HOST, STRZ_DB_NAME and STRZ_DB_USER are not all set")]
    MissingMysqlCredentials,
}

/// Storage backend selection as written in the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverChoice {
    Auto,
    Mysql,
    Sqlite,
}

/// Resolved storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Mysql,
    Sqlite,
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub driver: DriverChoice,
    pub host: String,
    pub name: String,
    pub user: String,
    pub pass: String,
    pub charset: String,
    pub sqlite_path: PathBuf,
}

impl DbConfig {
    /// Whether enough network credentials are present to use MySQL.
    pub fn has_mysql_credentials(&self) -> bool {
        !self.host.is_empty() && !self.name.is_empty() && !self.user.is_empty()
    }

    /// Resolve `auto` into a concrete backend.
    pub fn resolve_driver(&self) -> Result<Driver, ConfigError> {
        match self.driver {
            DriverChoice::Auto if self.has_mysql_credentials() => Ok(Driver::Mysql),
            DriverChoice::Auto => Ok(Driver::Sqlite),
            DriverChoice::Mysql if !self.has_mysql_credentials() => {
                Err(ConfigError::MissingMysqlCredentials)
            }
            DriverChoice::Mysql => Ok(Driver::Mysql),
            DriverChoice::Sqlite => Ok(Driver::Sqlite),
        }
    }
}

/// Header names the sender uses.
#[derive(Debug, Clone)]
pub struct HeaderNames {
    pub delivery: String,
    pub timestamp: String,
    pub signature: String,
    pub event: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            delivery: "X-STRZ-Delivery-Id".to_string(),
            timestamp: "X-STRZ-Timestamp".to_string(),
            signature: "X-STRZ-Signature".to_string(),
            event: "X-STRZ-Event".to_string(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared HMAC secret used by CryptoStrazo to sign webhooks
    pub secret: String,

    /// Anti-replay window in seconds (0 or less disables the check)
    pub max_drift_seconds: i64,

    /// Signing base-string template with `{timestamp}` and `{body}`
    pub signature_base_format: String,

    pub headers: HeaderNames,

    pub db: DbConfig,

    /// Expose the last stored delivery at `/webhooks/cryptostrazo/last`
    pub debug_ui: bool,

    /// Optional `?token=` required by the debug view
    pub debug_token: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| -> String {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let secret = lookup("STRZ_SECRET").unwrap_or_default();
        if secret.is_empty() || secret.contains(SECRET_PLACEHOLDER) {
            return Err(ConfigError::MissingSecret);
        }

        let driver = match text("STRZ_DB_DRIVER", "auto").to_lowercase().as_str() {
            "auto" => DriverChoice::Auto,
            "mysql" => DriverChoice::Mysql,
            "sqlite" => DriverChoice::Sqlite,
            other => return Err(ConfigError::UnsupportedDriver(other.to_string())),
        };

        let db = DbConfig {
            driver,
            host: text("STRZ_DB_HOST", ""),
            name: text("STRZ_DB_NAME", ""),
            user: text("STRZ_DB_USER", ""),
            pass: lookup("STRZ_DB_PASS").unwrap_or_default(),
            charset: text("STRZ_DB_CHARSET", "utf8mb4"),
            sqlite_path: PathBuf::from(text("STRZ_SQLITE_PATH", "storage/strz.sqlite")),
        };
        db.resolve_driver()?;

        let defaults = HeaderNames::default();

        Ok(Config {
            port: parse_or("PORT", lookup("PORT"), 8080),
            secret,
            max_drift_seconds: parse_or(
                "STRZ_MAX_DRIFT_SECONDS",
                lookup("STRZ_MAX_DRIFT_SECONDS"),
                300,
            ),
            signature_base_format: text("STRZ_SIGNATURE_BASE_FORMAT", DEFAULT_BASE_FORMAT),
            headers: HeaderNames {
                delivery: text("STRZ_DELIVERY_HEADER", &defaults.delivery),
                timestamp: text("STRZ_TIMESTAMP_HEADER", &defaults.timestamp),
                signature: text("STRZ_SIGNATURE_HEADER", &defaults.signature),
                event: text("STRZ_EVENT_HEADER", &defaults.event),
            },
            db,
            debug_ui: parse_flag(lookup("STRZ_DEBUG_UI")),
            debug_token: lookup("STRZ_DEBUG_TOKEN").unwrap_or_default(),
        })
    }
}

/// Parse a numeric variable, warning and falling back to the default when malformed.
fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    let raw = match raw {
        Some(v) if !v.trim().is_empty() => v,
        _ => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

fn parse_flag(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(|v| v.trim().to_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
