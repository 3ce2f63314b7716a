//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! Route added to the app
//!     → hooks.rs on_route (registry)
//!
//! Request arrives
//!     → middleware.rs (span created, MatchedPath read if present)
//!     → hooks.rs on_request (resolve route, enrich span)
//!     → context.rs RequestContext (into request extensions)
//!     → handler
//!     → hooks.rs on_response (enrich span, record metrics)
//! ```

pub mod context;
pub mod hooks;
pub mod middleware;

pub use context::RequestContext;
pub use hooks::{RequestHead, ResponseEvent, RouteTelemetry};
pub use middleware::{
    instrument, instrument_matched, make_request_span, route_telemetry_middleware, RouterExt,
};
