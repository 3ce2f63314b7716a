//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved request
//!     → request_info.rs (request ID, client IP, user agent, host)
//!     → span.rs (route and response attributes on the active span)
//!     → metrics.rs (duration, count and size instruments)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Every emission point is best-effort; telemetry failures never reach
//!   the request path
//! - Metric labels are bounded to method, route, status and service

pub mod logging;
pub mod metrics;
pub mod request_info;
pub mod span;
