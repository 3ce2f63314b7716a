//! Request lifecycle hooks.
//!
//! # Responsibilities
//! - `on_route`: feed framework route registrations into the registry
//! - `on_request`: resolve the route, enrich the span, build the
//!   [`RequestContext`]
//! - `on_response`: enrich the span and record metrics
//!
//! # Design Decisions
//! - The plugin is constructed explicitly and owns its registry handle; the
//!   host application calls the hooks (or installs the axum middleware)
//! - Each hook is an observability boundary: it returns a usable value or
//!   nothing, never an error

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;

use crate::config::{HeaderConfig, TelemetryConfig};
use crate::error::TelemetryResult;
use crate::http::context::RequestContext;
use crate::observability::metrics::MetricsRecorder;
use crate::observability::request_info::{content_length, RequestMetadata, UNKNOWN};
use crate::observability::span::{self, SpanSink};
use crate::routing::resolver::strip_query;
use crate::routing::{MethodSet, RouteRegistry, RouteResolver};

/// What the framework knows about a request when it arrives.
#[derive(Debug, Clone, Copy)]
pub struct RequestHead<'a> {
    pub method: &'a str,
    /// Path with query string, as received.
    pub target: &'a str,
    pub headers: &'a HeaderMap,
    /// Pattern the framework already matched, if it exposes one.
    pub matched_route: Option<&'a str>,
}

/// What the framework knows once the response has been produced.
#[derive(Debug, Clone, Copy)]
pub struct ResponseEvent<'a> {
    pub method: &'a str,
    /// `None` if `on_request` never ran for this request.
    pub context: Option<&'a RequestContext>,
    pub status: u16,
    pub elapsed: Duration,
    pub response_headers: &'a HeaderMap,
    /// Exact body length when known without a content-length header.
    pub body_size_hint: Option<u64>,
}

/// Route attribution and metrics plugin for an HTTP server.
#[derive(Debug)]
pub struct RouteTelemetry {
    resolver: RouteResolver,
    recorder: Arc<MetricsRecorder>,
    headers: HeaderConfig,
}

impl RouteTelemetry {
    pub fn new(
        registry: Arc<RouteRegistry>,
        recorder: Arc<MetricsRecorder>,
        headers: HeaderConfig,
    ) -> Self {
        Self {
            resolver: RouteResolver::new(registry),
            recorder,
            headers,
        }
    }

    /// Build the plugin from configuration with an uninitialized recorder.
    pub fn from_config(config: &TelemetryConfig, registry: Arc<RouteRegistry>) -> Self {
        Self::new(
            registry,
            Arc::new(MetricsRecorder::new(config.service.name.clone())),
            config.headers.clone(),
        )
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        self.resolver.registry()
    }

    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.recorder
    }

    /// Route-registration event. Malformed input is logged and skipped.
    pub fn on_route<I, M>(&self, methods: I, pattern: &str)
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        if let Err(e) = self.try_register(methods, pattern) {
            tracing::warn!(pattern = %pattern, error = %e, "Skipping route registration");
        }
    }

    fn try_register<I, M>(&self, methods: I, pattern: &str) -> TelemetryResult<()>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        let methods = MethodSet::new(methods)?;
        self.registry().register(methods, pattern)
    }

    /// Request-received event. Always returns a context with a non-empty route.
    pub fn on_request(&self, request: RequestHead<'_>, span: &dyn SpanSink) -> RequestContext {
        let path = strip_query(request.target);
        let resolution = self
            .resolver
            .resolve(request.method, request.target, request.matched_route);
        let metadata = RequestMetadata::from_headers(request.headers, request.target, &self.headers);

        let context = RequestContext::new(
            request.method,
            path,
            resolution,
            metadata,
            content_length(request.headers),
        );

        span::enrich_request(&context, span);

        tracing::trace!(
            method = %context.method,
            route = %context.route(),
            confidence = %context.confidence(),
            "Route resolved"
        );
        context
    }

    /// Response-finished event.
    pub fn on_response(&self, response: ResponseEvent<'_>, span: &dyn SpanSink) {
        let route = response.context.map_or(UNKNOWN, RequestContext::route);
        let request_size = response.context.and_then(|c| c.request_size);
        let response_size = content_length(response.response_headers).or(response.body_size_hint);
        let duration_ms = response.elapsed.as_nanos() as f64 / 1_000_000.0;

        span::enrich_response(response.status, response_size, response.response_headers, span);

        self.recorder.record(
            response.method,
            route,
            response.status,
            duration_ms,
            request_size,
            response_size,
        );

        tracing::debug!(
            method = %response.method,
            route = %route,
            status = response.status,
            duration_ms = duration_ms,
            "Request completed"
        );
    }
}
