//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for route
//! telemetry. All types derive Serde traits for deserialization from config
//! files, and every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service identity attached to every data point.
    pub service: ServiceConfig,

    /// Metrics subsystem settings.
    pub metrics: MetricsConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Request headers consulted for span metadata.
    pub headers: HeaderConfig,

    /// Demo server settings.
    pub server: ServerConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Value of the `service_name` metric label.
    pub name: String,

    pub version: String,

    pub namespace: String,

    /// Deployment environment (development, staging, production).
    pub environment: String,

    /// Unique instance identifier (pod name, hostname).
    pub instance_id: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "unknown-rust-service".to_string(),
            version: "1.0.0".to_string(),
            namespace: "default".to_string(),
            environment: "development".to_string(),
            instance_id: None,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Record route metrics at all.
    pub enabled: bool,

    /// Prometheus exporter bind address.
    pub exporter_address: String,

    /// Delay before instruments are created, in milliseconds.
    /// Data points recorded before then are dropped.
    pub init_delay_ms: u64,

    /// Buckets for `http_server_duration_milliseconds`.
    pub duration_buckets_ms: Vec<f64>,

    /// Buckets for the request/response size histograms.
    pub size_buckets_bytes: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exporter_address: "0.0.0.0:9464".to_string(),
            init_delay_ms: 0,
            duration_buckets_ms: vec![
                1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
            ],
            size_buckets_bytes: vec![
                128.0, 512.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0, 1048576.0, 4194304.0,
            ],
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error, off).
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Header precedence lists, highest priority first.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Headers carrying the client IP as set by trusted proxies.
    pub client_ip: Vec<String>,

    /// Correlation headers carrying a request ID.
    pub request_id: Vec<String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            client_ip: vec!["x-real-ip".to_string(), "x-forwarded-for".to_string()],
            request_id: vec![
                "x-request-id".to_string(),
                "x-correlation-id".to_string(),
                "x-trace-id".to_string(),
            ],
        }
    }
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}
