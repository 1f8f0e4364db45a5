//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! buffered socket reader
//!     → request.rs (request line, headers, body, query)
//!     → middleware/ (server-level pipeline)
//!     → [routing layer picks a handler]
//!     → middleware/ (route-level pipeline) → handler
//!     → response.rs (status line, headers, body)
//!     → buffered socket writer
//! ```

pub mod date;
pub mod headers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod status;

pub use headers::{Headers, Params};
pub use middleware::{middleware, Flow, Middleware, Pipeline};
pub use request::{ReadOptions, Request};
pub use response::Response;
