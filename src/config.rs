//! # Unified Application Configuration
//!
//! This module consolidates the server, OCR and observability settings into a
//! single configuration object. It supports loading from environment
//! variables and validation, both per section and across sections.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use crate::ocr_config::OcrConfig;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Default cap on request bodies (20 MiB); Base64 images are large
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 20 * 1024 * 1024;

/// HTTP server configuration settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// API and static file port
    pub port: u16,
    /// Directory served at `/`
    pub static_dir: String,
    /// Largest accepted request body in bytes
    pub max_request_bytes: usize,
    /// How long shutdown waits for in-flight recognitions
    pub shutdown_drain_secs: u64,
    /// Whether to allow privileged ports (< 1024)
    pub allow_privileged_ports: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: "./static".to_string(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            shutdown_drain_secs: 10,
            allow_privileged_ports: false,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> AppResult<()> {
        self.host.parse::<IpAddr>().map_err(|_| {
            AppError::Config(format!("HOST '{}' is not a valid IP address", self.host))
        })?;

        if self.port == 0 {
            return Err(AppError::Config("Server port cannot be 0".to_string()));
        }

        if !self.allow_privileged_ports && self.port < 1024 {
            return Err(AppError::Config(format!(
                "Server port {} is privileged. Set ALLOW_PRIVILEGED_PORTS=true or use port >= 1024",
                self.port
            )));
        }

        if self.static_dir.trim().is_empty() {
            return Err(AppError::Config("Static directory cannot be empty".to_string()));
        }

        if self.max_request_bytes < 1024 {
            return Err(AppError::Config(
                "MAX_REQUEST_BYTES must be at least 1024".to_string(),
            ));
        }

        if self.shutdown_drain_secs > 300 {
            return Err(AppError::Config(
                "Shutdown drain cannot be greater than 300 seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Address the API server binds to
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            AppError::Config(format!("HOST '{}' is not a valid IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_secs(self.shutdown_drain_secs)
    }

    fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host.trim().to_string();
        }
        config.port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| AppError::Config("PORT must be a valid port number".to_string()))?;
        if let Ok(dir) = env::var("STATIC_DIR") {
            config.static_dir = dir;
        }
        config.max_request_bytes = env::var("MAX_REQUEST_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_REQUEST_BYTES.to_string())
            .parse()
            .map_err(|_| AppError::Config("MAX_REQUEST_BYTES must be a valid number".to_string()))?;
        config.shutdown_drain_secs = env::var("SHUTDOWN_DRAIN_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| {
                AppError::Config("SHUTDOWN_DRAIN_SECS must be a valid number".to_string())
            })?;
        config.allow_privileged_ports = env::var("ALLOW_PRIVILEGED_PORTS")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        Ok(config)
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// OCR processing configuration
    pub ocr: OcrConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            ocr: OcrConfig::from_env()?,
            observability: ObservabilityConfig::from_env()?,
        })
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.server.validate()?;
        self.ocr.validate()?;
        self.observability.validate()?;

        if self.observability.enable_metrics_export
            && self.server.port == self.observability.metrics_port
        {
            return Err(AppError::Config(
                "Server port and metrics port cannot be the same".to_string(),
            ));
        }

        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: listen={}:{}, static_dir={}, max_request_bytes={}, ocr_languages={}, ocr_timeout_secs={}, environment={}, metrics_port={}, metrics_enabled={}",
            self.server.host,
            self.server.port,
            self.server.static_dir,
            self.server.max_request_bytes,
            self.ocr.languages,
            self.ocr.operation_timeout_secs,
            self.observability.environment,
            self.observability.metrics_port,
            self.observability.enable_metrics_export
        )
    }
}
