//! Route attribution subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (framework, at startup or later):
//!     (methods, pattern)
//!     → pattern.rs (parse segments, canonical method set)
//!     → registry.rs (copy-on-write insert)
//!
//! Incoming Request (method, path, optional framework hint):
//!     → resolver.rs (strategy chain)
//!     → matcher.rs (segment comparison against registry snapshot)
//!     → normalize.rs (fallback template)
//!     → Return: Resolution { route label, confidence }
//! ```
//!
//! # Design Decisions
//! - Registry reads are lock-free snapshots
//! - No regex in the matching hot path
//! - Deterministic: same registry and input always yield the same label
//! - Labels are drawn from registered patterns or fallback templates only

pub mod matcher;
pub mod normalize;
pub mod pattern;
pub mod registry;
pub mod resolver;

pub use pattern::{MethodSet, RoutePattern, Segment};
pub use registry::{RouteEntry, RouteRegistry};
pub use resolver::{Confidence, Resolution, RouteResolver};
