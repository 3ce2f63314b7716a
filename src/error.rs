//! Error taxonomy for the telemetry engine.
//!
//! Every variant is recoverable. Internal functions return these so tests can
//! observe them; the public hooks in [`crate::http::hooks`] log and drop them
//! so that nothing crosses back into request handling.

use thiserror::Error;

/// Errors raised inside the route attribution and metrics engine.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The framework handed us a route registration we cannot use.
    #[error("invalid route registration: {0}")]
    InvalidRegistration(String),

    /// The framework-provided route hint was empty or not a path.
    #[error("malformed route hint: {0:?}")]
    MalformedHint(String),

    /// The span does not accept the attribute (absent span or undeclared field).
    #[error("span attribute {key} not recorded: {reason}")]
    SpanAttribute { key: &'static str, reason: String },

    /// A data point arrived before the metrics subsystem was ready.
    #[error("metrics subsystem is not ready")]
    MetricsNotReady,

    /// The metrics backend rejected instrument creation or an update.
    #[error("instrument {name} failed: {reason}")]
    Instrument { name: &'static str, reason: String },

    /// The metrics exporter could not be installed.
    #[error("metrics exporter failed: {0}")]
    Exporter(String),
}

/// Convenience alias used throughout the engine.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
