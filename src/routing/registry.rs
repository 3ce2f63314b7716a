//! Registry of known route patterns.
//!
//! # Responsibilities
//! - Store every (methods, pattern) pair the host framework registers
//! - Serve lock-free snapshots to request-time resolution
//!
//! # Design Decisions
//! - Copy-on-write: each registration builds a new route list and swaps it
//!   in atomically, so readers never observe a half-built entry
//! - Re-registering a key replaces the entry in place; the original
//!   registration position is kept as the tie-break order
//! - Routes are never removed

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::TelemetryResult;
use crate::routing::pattern::{MethodSet, RoutePattern};

/// One registered endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub methods: MethodSet,
    pub pattern: RoutePattern,
}

impl RouteEntry {
    /// Build an entry from raw registration input.
    pub fn new(methods: MethodSet, pattern: &str) -> TelemetryResult<Self> {
        Ok(Self {
            methods,
            pattern: RoutePattern::parse(pattern)?,
        })
    }

    fn same_key(&self, other: &RouteEntry) -> bool {
        self.methods == other.methods && self.pattern.as_str() == other.pattern.as_str()
    }
}

/// Immutable view of the registry at one point in time.
pub type RouteSnapshot = Arc<Vec<Arc<RouteEntry>>>;

/// Process-wide route registry, owned by the application and shared via `Arc`.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: ArcSwap<Vec<Arc<RouteEntry>>>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a route.
    ///
    /// Safe to call while requests are being resolved; the new route is
    /// visible to every snapshot taken afterwards.
    pub fn register(&self, methods: MethodSet, pattern: &str) -> TelemetryResult<()> {
        let entry = Arc::new(RouteEntry::new(methods, pattern)?);

        self.routes.rcu(|current| {
            let mut next: Vec<Arc<RouteEntry>> = current.as_ref().clone();
            match next.iter().position(|existing| existing.same_key(&entry)) {
                Some(idx) => next[idx] = entry.clone(),
                None => next.push(entry.clone()),
            }
            next
        });

        tracing::debug!(
            methods = %entry.methods,
            pattern = %entry.pattern,
            "Route registered"
        );
        Ok(())
    }

    /// All routes in registration order.
    pub fn snapshot(&self) -> RouteSnapshot {
        self.routes.load_full()
    }

    /// Routes whose method set serves `method`, in registration order.
    pub fn lookup(&self, method: &str) -> Vec<Arc<RouteEntry>> {
        self.routes
            .load()
            .iter()
            .filter(|entry| entry.methods.contains(method))
            .cloned()
            .collect()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
