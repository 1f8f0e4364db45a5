//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the server and every connection
//!
//! protocol.rs
//!     → version/method table, built once, read-only
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no package-level mutable state
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod protocol;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use protocol::Protocol;
pub use schema::{
    KeepAliveConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig, StaticConfig,
    TimeoutConfig,
};
