//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (prefix table lookup, wildcard fallback)
//!     → matcher.rs (evaluate prefix, rank by segment count)
//!     → Return: logical function name or NoMatch
//!
//! Logical function name
//!     → endpoints.rs (name → invocation URL)
//!     → Return: URL or FunctionNotFound
//!
//! Route Compilation (at startup):
//!     PathMapping[]
//!     → Sort by segment count, descending
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - First match wins (ordered by specificity)

pub mod endpoints;
pub mod matcher;
pub mod router;

pub use endpoints::{EndpointMap, INVOCATION_PATH};
pub use router::RouteTable;

/// Path binding that catches every otherwise unmatched request.
pub const WILDCARD_PATH: &str = "/*";
