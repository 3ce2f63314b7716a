//! Per-request route resolution.
//!
//! # Data Flow
//! ```text
//! (method, raw path, framework hint)
//!     → hint present and well-formed?        → Exact
//!     → registry scan (matcher + precedence)  → RegistryScan
//!     → normalize(path)                       → Fallback
//! ```
//!
//! # Design Decisions
//! - Resolution is total: a malformed hint or path only moves resolution
//!   down the chain, the fallback always produces a label
//! - Among several registry matches the most literal pattern wins; equal
//!   patterns fall back to registration order

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{TelemetryError, TelemetryResult};
use crate::routing::matcher::{compare_specificity, matches};
use crate::routing::normalize::normalize;
use crate::routing::registry::{RouteEntry, RouteRegistry};

/// Which strategy produced a route label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    /// The framework told us the matched pattern.
    Exact,
    /// Found by scanning the registry.
    RegistryScan,
    /// Synthesized by path normalization.
    Fallback,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Exact => "exact",
            Confidence::RegistryScan => "registry-scan",
            Confidence::Fallback => "fallback",
        }
    }

    /// Value for the `http.route.matched` span attribute.
    pub fn matched_flag(&self) -> &'static str {
        match self {
            Confidence::Exact | Confidence::RegistryScan => "true",
            Confidence::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Non-empty route label.
    pub route: String,
    pub confidence: Confidence,
}

/// Strip query string and fragment from a request target.
///
/// An empty remainder is treated as the root path.
pub fn strip_query(raw: &str) -> &str {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    match &raw[..end] {
        "" => "/",
        path => path,
    }
}

fn validate_hint(hint: &str) -> TelemetryResult<&str> {
    let trimmed = hint.trim();
    if trimmed.is_empty() || !trimmed.starts_with('/') {
        return Err(TelemetryError::MalformedHint(hint.to_string()));
    }
    Ok(hint)
}

/// Resolves requests to route labels against a shared registry.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    registry: Arc<RouteRegistry>,
}

impl RouteResolver {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve a request to its route label. Never fails.
    pub fn resolve(&self, method: &str, raw_path: &str, hint: Option<&str>) -> Resolution {
        if let Some(hint) = hint {
            match validate_hint(hint) {
                Ok(pattern) => {
                    return Resolution {
                        route: pattern.to_string(),
                        confidence: Confidence::Exact,
                    };
                }
                Err(e) => tracing::trace!(error = %e, "Ignoring framework route hint"),
            }
        }

        let path = strip_query(raw_path);

        if let Some(entry) = self.scan(method, path) {
            return Resolution {
                route: entry.pattern.as_str().to_string(),
                confidence: Confidence::RegistryScan,
            };
        }

        Resolution {
            route: normalize(path),
            confidence: Confidence::Fallback,
        }
    }

    /// Most specific registered route for `method` and `path`, if any.
    pub fn scan(&self, method: &str, path: &str) -> Option<Arc<RouteEntry>> {
        let snapshot = self.registry.snapshot();
        let mut best: Option<&Arc<RouteEntry>> = None;

        for entry in snapshot.iter() {
            if !entry.methods.contains(method) || !matches(path, &entry.pattern) {
                continue;
            }
            best = match best {
                Some(current)
                    if compare_specificity(&entry.pattern, &current.pattern)
                        != Ordering::Greater =>
                {
                    Some(current)
                }
                _ => Some(entry),
            };
        }

        best.cloned()
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }
}
