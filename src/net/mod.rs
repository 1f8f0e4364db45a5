//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → connection.rs (watcher count, per-connection request loop)
//!     → keepalive.rs (idle timeout from load)
//!     → Hand off to HTTP layer per request
//! ```
//!
//! # Design Decisions
//! - One task per connection; requests on a connection are strictly sequential
//! - Each connection tracked for graceful shutdown and the keep-alive heuristic

pub mod connection;
pub mod keepalive;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionWatcher};
pub use listener::Listener;
