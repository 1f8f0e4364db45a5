//! Minimal HTTP/1.x server engine.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::listener ──▶ net::connection (one task per socket)
//!                                       │
//!                                       ▼
//!                              http::request (parse)
//!                                       │
//!                                       ▼
//!                     server (version check, keep-alive, middleware)
//!                                       │
//!                                       ▼
//!                     routing (static mounts, prefix tree, route middleware)
//!                                       │
//!                                       ▼
//!     Client ◀── http::response (write once, flush)
//! ```
//!
//! Cross-cutting: `config`, `lifecycle` (signals, shutdown), `observability`.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;
pub mod server;

// Support
pub mod error;
pub mod fs;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use http::{middleware, Flow, Middleware, Request, Response};
pub use routing::{handler, Handler, Router};
pub use server::Server;
