//! Span enrichment.
//!
//! # Responsibilities
//! - Write the resolved route and request metadata onto the active span
//! - Write response status, size and content type on completion
//!
//! # Design Decisions
//! - The span is reached through [`SpanSink`] so the engine does not care
//!   which tracing backend is active
//! - Every attribute is attempted independently; a failure on one does not
//!   stop the rest
//! - A span that is not recording is treated as absent and skipped

use axum::http::HeaderMap;
use tracing::Span;

use crate::error::{TelemetryError, TelemetryResult};
use crate::http::context::RequestContext;
use crate::observability::request_info::UNKNOWN;

pub const ROUTE: &str = "http.route";
pub const ROUTE_PATTERN: &str = "http.route.pattern";
pub const ROUTE_METHOD: &str = "http.route.method";
pub const ROUTE_MATCHED: &str = "http.route.matched";
pub const ROUTE_CONFIDENCE: &str = "http.route.confidence";
pub const REQUEST_ID: &str = "http.request.id";
pub const USER_AGENT: &str = "http.user_agent";
pub const REAL_IP: &str = "http.real_ip";
pub const HOST: &str = "http.host";
pub const ORIGINAL_URL: &str = "http.original_url";
pub const STATUS_CODE: &str = "http.status_code";
pub const RESPONSE_SIZE: &str = "http.response.size";
pub const RESPONSE_CONTENT_TYPE: &str = "http.response.content_type";

/// An active span that accepts string attributes.
pub trait SpanSink {
    /// False when tracing is disabled or there is no active span.
    fn is_recording(&self) -> bool;

    fn set_attribute(&self, key: &'static str, value: &str) -> TelemetryResult<()>;
}

impl SpanSink for Span {
    fn is_recording(&self) -> bool {
        !self.is_disabled()
    }

    fn set_attribute(&self, key: &'static str, value: &str) -> TelemetryResult<()> {
        if self.is_disabled() {
            return Err(TelemetryError::SpanAttribute {
                key,
                reason: "span is disabled".to_string(),
            });
        }
        // tracing silently drops undeclared fields
        if !self.has_field(key) {
            return Err(TelemetryError::SpanAttribute {
                key,
                reason: "field not declared on span".to_string(),
            });
        }
        self.record(key, value);
        Ok(())
    }
}

fn apply(span: &dyn SpanSink, attributes: &[(&'static str, &str)]) -> TelemetryResult<()> {
    let mut first_error = None;
    for &(key, value) in attributes {
        if let Err(e) = span.set_attribute(key, value) {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Attach route and request metadata. Errors are returned for inspection.
pub fn try_enrich_request(context: &RequestContext, span: &dyn SpanSink) -> TelemetryResult<()> {
    let route = context.route();
    let confidence = context.confidence();
    let meta = &context.metadata;

    apply(
        span,
        &[
            (ROUTE, route),
            (ROUTE_PATTERN, route),
            (ROUTE_METHOD, context.method.as_str()),
            (ROUTE_MATCHED, confidence.matched_flag()),
            (ROUTE_CONFIDENCE, confidence.as_str()),
            (REQUEST_ID, meta.request_id.as_str()),
            (USER_AGENT, meta.user_agent.as_str()),
            (REAL_IP, meta.client_ip.as_str()),
            (HOST, meta.host.as_str()),
            (ORIGINAL_URL, meta.original_url.as_str()),
        ],
    )
}

/// Attach response status, size and content type.
pub fn try_enrich_response(
    status: u16,
    response_size: Option<u64>,
    response_headers: &HeaderMap,
    span: &dyn SpanSink,
) -> TelemetryResult<()> {
    let status = status.to_string();
    let size = response_size.map_or_else(|| UNKNOWN.to_string(), |s| s.to_string());
    let content_type = response_headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(UNKNOWN);

    apply(
        span,
        &[
            (STATUS_CODE, status.as_str()),
            (RESPONSE_SIZE, size.as_str()),
            (RESPONSE_CONTENT_TYPE, content_type),
        ],
    )
}

/// Best-effort request enrichment. Never fails.
pub fn enrich_request(context: &RequestContext, span: &dyn SpanSink) {
    if !span.is_recording() {
        return;
    }
    if let Err(e) = try_enrich_request(context, span) {
        tracing::trace!(error = %e, "Span enrichment incomplete");
    }
}

/// Best-effort response enrichment. Never fails.
pub fn enrich_response(
    status: u16,
    response_size: Option<u64>,
    response_headers: &HeaderMap,
    span: &dyn SpanSink,
) {
    if !span.is_recording() {
        return;
    }
    if let Err(e) = try_enrich_response(status, response_size, response_headers, span) {
        tracing::trace!(error = %e, "Span enrichment incomplete");
    }
}
