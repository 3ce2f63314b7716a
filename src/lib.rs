//! Route attribution and HTTP request metrics for axum services.
//!
//! Resolves every request to a low-cardinality route label, writes it with
//! request metadata onto the active tracing span, and records duration,
//! count and size metrics labelled by method, route, status and service.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod testing;

pub use config::TelemetryConfig;
pub use error::{TelemetryError, TelemetryResult};
pub use http::{instrument, instrument_matched, RequestContext, RouteTelemetry, RouterExt};
pub use observability::metrics::{MetricsFacade, MetricsRecorder, MetricsState};
pub use routing::{Confidence, RouteRegistry};
