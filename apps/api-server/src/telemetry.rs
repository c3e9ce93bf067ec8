//! Telemetry initialization.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, LogLevel};

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Enable JSON logging (for production).
    pub json_logs: bool,
    /// Default verbosity when `RUST_LOG` is unset.
    pub level: LogLevel,
    pub service_name: String,
}

impl From<&AppConfig> for TelemetryConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            json_logs: config.json_logs,
            level: config.log_level,
            service_name: "quill-api".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Filter directives; `RUST_LOG` wins over the configured level.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = self.level.as_str();
            EnvFilter::new(format!("{level},api_server={level},quill_infra={level}"))
        })
    }
}

/// Install the global subscriber.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter = config.env_filter();

    if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        level = config.level.as_str(),
        "Telemetry initialized"
    );
}
