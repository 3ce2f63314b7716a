//! Route pattern and method set types.
//!
//! # Design Decisions
//! - Patterns are parsed once at registration; request-time matching only
//!   compares pre-split segments
//! - Both `:name` and `{name}` are parameter placeholders
//! - Methods are uppercased, sorted and de-duplicated so that `"GET|POST"`
//!   and `["POST", "GET"]` produce the same registry key

use std::fmt;

use crate::error::{TelemetryError, TelemetryResult};

/// Wildcard method accepted by every request.
pub const ANY_METHOD: &str = "*";

/// A single segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the concrete segment exactly (case-sensitive).
    Literal(String),
    /// Matches any concrete segment.
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            return Segment::Param(name.to_string());
        }
        if raw.len() >= 2 && raw.starts_with('{') && raw.ends_with('}') {
            return Segment::Param(raw[1..raw.len() - 1].to_string());
        }
        Segment::Literal(raw.to_string())
    }

    /// Returns true for parameter placeholders.
    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param(_))
    }
}

/// A parsed route pattern such as `/users/:id`.
///
/// The raw text is kept verbatim: it is the label that ends up on spans and
/// metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern. Rejects empty patterns and patterns that are not
    /// absolute paths.
    pub fn parse(raw: &str) -> TelemetryResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TelemetryError::InvalidRegistration(
                "empty url pattern".to_string(),
            ));
        }
        if !raw.starts_with('/') {
            return Err(TelemetryError::InvalidRegistration(format!(
                "url pattern {raw:?} is not an absolute path"
            )));
        }

        let segments = raw.split('/').map(Segment::parse).collect();
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern exactly as registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Segments split on `/`, including the empty leading segment.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Canonical set of HTTP verbs a route answers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSet {
    methods: Vec<String>,
}

impl MethodSet {
    /// Build a method set, normalizing case and order.
    pub fn new<I, S>(methods: I) -> TelemetryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut methods: Vec<String> = methods
            .into_iter()
            .flat_map(|m| {
                m.as_ref()
                    .split('|')
                    .map(|part| part.trim().to_ascii_uppercase())
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect();
        methods.sort();
        methods.dedup();

        if methods.is_empty() {
            return Err(TelemetryError::InvalidRegistration(
                "route registered without a method".to_string(),
            ));
        }
        Ok(Self { methods })
    }

    /// Parse a pipe-joined method string such as `"GET|HEAD"`.
    pub fn parse(joined: &str) -> TelemetryResult<Self> {
        Self::new([joined])
    }

    /// Whether a request with `method` is served by this set.
    ///
    /// `HEAD` is answered by `GET` routes and `*` accepts everything.
    pub fn contains(&self, method: &str) -> bool {
        let has = |m: &str| self.methods.iter().any(|own| own == m);
        if has(ANY_METHOD) {
            return true;
        }
        if self.methods.iter().any(|own| own.eq_ignore_ascii_case(method)) {
            return true;
        }
        method.eq_ignore_ascii_case("HEAD") && has("GET")
    }

    /// Normalized verbs.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Pipe-joined canonical form, used as part of the registry key.
    pub fn joined(&self) -> String {
        self.methods.join("|")
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}
