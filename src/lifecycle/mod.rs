//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Server states:
//!     Created → Listening → ShuttingDown → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Server::terminate
//!
//! Shutdown (shutdown.rs):
//!     trigger → accept loop exits → connection loops stop before their next read
//!     → drain bounded by timeouts.shutdown_secs
//! ```
//!
//! # Design Decisions
//! - In-flight handlers are never preempted; only the next iteration is skipped
//! - Shutdown has timeout: stragglers are abandoned after the deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::Termination;
