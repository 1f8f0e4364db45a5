//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (static mounts first for GET/HEAD)
//!     → tree.rs (segment-by-segment lookup, literal before parameter)
//!     → Return: static file, matched Route, or RoutingError
//!
//! Route registration (at startup):
//!     path.rs (clean) → tree.rs (insert per segment)
//! ```
//!
//! # Design Decisions
//! - Routes registered before serving, read-only while serving
//! - No regex in hot path (segment comparison only)
//! - Deterministic: literal children win over `:param`, longest static prefix wins

pub mod path;
pub mod router;
pub mod tree;

pub use router::{handler, Handler, Route, RouteMatch, Router};
pub use tree::{PrefixTree, TreeMatch};
