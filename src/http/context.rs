//! Per-request telemetry state.

use std::time::{Duration, Instant, SystemTime};

use crate::observability::request_info::RequestMetadata;
use crate::routing::{Confidence, Resolution};

/// State carried from request start to response finish.
///
/// Owned by a single request; inserted into the request extensions so that
/// handlers can read the resolved route too.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request method as received.
    pub method: String,
    /// Path without query string.
    pub path: String,
    pub resolution: Resolution,
    pub metadata: RequestMetadata,
    /// Declared request body size, if the client sent a usable content-length.
    pub request_size: Option<u64>,
    /// Wall-clock time the request was received.
    pub received_at: SystemTime,
    started: Instant,
}

impl RequestContext {
    pub fn new(
        method: &str,
        path: &str,
        resolution: Resolution,
        metadata: RequestMetadata,
        request_size: Option<u64>,
    ) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            resolution,
            metadata,
            request_size,
            received_at: SystemTime::now(),
            started: Instant::now(),
        }
    }

    /// Resolved route label.
    pub fn route(&self) -> &str {
        &self.resolution.route
    }

    pub fn confidence(&self) -> Confidence {
        self.resolution.confidence
    }

    /// Monotonic time since the request was received.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
