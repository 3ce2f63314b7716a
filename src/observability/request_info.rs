//! Request metadata extracted from headers for span attributes.
//!
//! # Design Decisions
//! - Header precedence lists come from config, highest priority first
//! - `x-forwarded-for` style lists contribute their first (client-most) entry
//! - Non-UTF-8 or blank header values count as absent
//! - Missing values become the `unknown` sentinel; a missing request ID is
//!   generated (time-ordered UUID v7)

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::config::HeaderConfig;

/// Sentinel for attributes we could not determine.
pub const UNKNOWN: &str = "unknown";

/// Descriptive metadata about one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub request_id: String,
    pub client_ip: String,
    pub user_agent: String,
    pub host: String,
    pub original_url: String,
}

impl RequestMetadata {
    /// Extract metadata from request headers.
    pub fn from_headers(headers: &HeaderMap, original_url: &str, config: &HeaderConfig) -> Self {
        let request_id =
            first_header(headers, &config.request_id).unwrap_or_else(generate_request_id);
        let client_ip = first_header(headers, &config.client_ip)
            .and_then(|value| first_list_entry(&value))
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            request_id,
            client_ip,
            user_agent: header_str(headers, "user-agent").unwrap_or_else(|| UNKNOWN.to_string()),
            host: header_str(headers, "host").unwrap_or_else(|| UNKNOWN.to_string()),
            original_url: if original_url.is_empty() {
                UNKNOWN.to_string()
            } else {
                original_url.to_string()
            },
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_header(headers: &HeaderMap, names: &[String]) -> Option<String> {
    names.iter().find_map(|name| header_str(headers, name))
}

fn first_list_entry(value: &str) -> Option<String> {
    value
        .split(',')
        .map(str::trim)
        .find(|entry| !entry.is_empty())
        .map(str::to_string)
}

/// Generate a request ID when no correlation header is present.
pub fn generate_request_id() -> String {
    format!("req-{}", Uuid::now_v7())
}

/// Parse a `content-length` header. Unparseable values count as absent.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
