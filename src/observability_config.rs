//! # Observability Configuration
//!
//! Environment-specific settings for logging and metrics export.

use std::env;

use crate::errors::{AppError, AppResult};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line human readable output
    Pretty,
}

impl LogFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Prometheus metrics endpoint port
    pub metrics_port: u16,
    /// Log level for this service's own targets
    pub log_level: String,
    /// Requested log format; development always logs pretty
    pub log_format: LogFormat,
    /// Whether to serve metrics and health probes on `metrics_port`
    pub enable_metrics_export: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            metrics_port: 9090,
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            enable_metrics_export: true,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    ///
    /// Unparseable values are configuration errors rather than silent
    /// fallbacks.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(environment) = env::var("ENVIRONMENT") {
            config.environment = environment.trim().to_ascii_lowercase();
        }
        if let Ok(port) = env::var("METRICS_PORT") {
            config.metrics_port = port.trim().parse().map_err(|_| {
                AppError::Config(format!("METRICS_PORT must be a valid port number, got '{}'", port))
            })?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            config.log_level = level.trim().to_ascii_lowercase();
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            config.log_format = LogFormat::from_name(&format).ok_or_else(|| {
                AppError::Config(format!("LOG_FORMAT must be 'json' or 'pretty', got '{}'", format))
            })?;
        }
        if let Ok(export) = env::var("ENABLE_METRICS_EXPORT") {
            config.enable_metrics_export = export.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "ENABLE_METRICS_EXPORT must be 'true' or 'false', got '{}'",
                    export
                ))
            })?;
        }

        Ok(config)
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Whether logs should be rendered for humans
    pub fn use_pretty_logs(&self) -> bool {
        self.is_development() || self.log_format == LogFormat::Pretty
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.environment.is_empty() {
            return Err(AppError::Config("ENVIRONMENT cannot be empty".to_string()));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(AppError::Config(format!(
                "Invalid log level '{}', expected one of {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.enable_metrics_export && self.metrics_port == 0 {
            return Err(AppError::Config(format!("Invalid metrics port: {}", self.metrics_port)));
        }

        Ok(())
    }
}
