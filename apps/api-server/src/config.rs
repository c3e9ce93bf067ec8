//! Application configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use quill_infra::{DatabaseConfig, JwtConfig};
use thiserror::Error;

const MIN_SECRET_LEN: usize = 32;

/// Errors that abort startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Runtime mode. Only `Development` exposes raw error text to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!(
                "expected development, production or test, got {other:?}"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("expected debug, info, warn or error, got {other:?}")),
        }
    }
}

/// Parse a token lifetime: `<n>s`, `<n>m`, `<n>h`, `<n>d`, or bare seconds.
pub fn parse_duration_secs(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last()? {
        's' => (&raw[..raw.len() - 1], 1),
        'm' => (&raw[..raw.len() - 1], 60),
        'h' => (&raw[..raw.len() - 1], 3_600),
        'd' => (&raw[..raw.len() - 1], 86_400),
        _ => (raw, 1),
    };

    let value: i64 = digits.parse().ok()?;
    if value <= 0 {
        return None;
    }
    value.checked_mul(multiplier)
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub allowed_origins: Vec<String>,
    pub log_level: LogLevel,
    pub json_logs: bool,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        url::Url::parse(&database_url).map_err(|e| invalid("DATABASE_URL", e.to_string()))?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| invalid("PORT", e.to_string()))?,
            None => 5000,
        };

        let environment = match get("RUST_ENV") {
            Some(raw) => raw.parse().map_err(|e: String| invalid("RUST_ENV", e))?,
            None => Environment::Development,
        };

        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(invalid(
                "JWT_SECRET",
                format!("must be at least {MIN_SECRET_LEN} characters"),
            ));
        }

        let expires_raw = get("JWT_EXPIRES_IN").unwrap_or_else(|| "7d".to_string());
        let expires_in_seconds = parse_duration_secs(&expires_raw).ok_or_else(|| {
            invalid(
                "JWT_EXPIRES_IN",
                format!("expected <n>[s|m|h|d], got {expires_raw:?}"),
            )
        })?;

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        if let Some(bad) = allowed_origins
            .iter()
            .find(|origin| *origin != "*" && url::Url::parse(origin).is_err())
        {
            return Err(invalid("ALLOWED_ORIGINS", format!("{bad:?} is not an origin")));
        }

        let log_level = match get("LOG_LEVEL") {
            Some(raw) => raw.parse().map_err(|e: String| invalid("LOG_LEVEL", e))?,
            None => LogLevel::Info,
        };

        let max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 100)?;
        let min_connections = parse_or("DB_MIN_CONNECTIONS", get("DB_MIN_CONNECTIONS"), 10)?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            environment,
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                min_connections,
            },
            jwt: JwtConfig {
                secret,
                expires_in_seconds,
            },
            allowed_origins,
            log_level,
            json_logs: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

fn parse_or(key: &'static str, raw: Option<String>, default: u32) -> Result<u32, ConfigError> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| invalid(key, format!("{raw:?} is not a number"))),
        None => Ok(default),
    }
}
