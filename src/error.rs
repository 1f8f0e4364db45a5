//! Error taxonomy for the protocol engine.
//!
//! # Kinds
//! - `RequestParseError`: request line, header and body failures, oversized heads
//! - `RoutingError`: no match, method mismatch, invalid static target
//! - `ResponseError`: serialization and flush failures
//! - `ReadTimeoutError`: socket read deadline exceeded
//! - `FileSystemError`: missing or unreadable paths
//!
//! # Design Decisions
//! - Structured fields instead of pre-formatted strings, so callers branch on kind
//! - Timeouts and clean EOF are distinct from generic I/O failure
//! - A failed request never escapes its own connection task

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Part of the request a parse failure was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseSection {
    RequestLine,
    Header,
    ContentLength,
    Body,
    Stream,
}

impl fmt::Display for ParseSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseSection::RequestLine => "request line",
            ParseSection::Header => "header",
            ParseSection::ContentLength => "content length",
            ParseSection::Body => "body",
            ParseSection::Stream => "stream",
        };
        f.write_str(name)
    }
}

/// A request could not be parsed from the byte stream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {section} `{value}`: {message}")]
pub struct RequestParseError {
    pub section: ParseSection,
    pub value: String,
    pub message: String,
}

impl RequestParseError {
    pub fn new(section: ParseSection, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Whether the failure was caused by a body larger than the configured limit.
    pub fn is_too_large(&self) -> bool {
        self.section == ParseSection::ContentLength && self.message == BODY_TOO_LARGE
    }

    /// Whether the request line or header block broke the size or count limit.
    pub fn is_head_too_large(&self) -> bool {
        self.message == HEAD_TOO_LARGE || self.message == TOO_MANY_HEADERS
    }
}

pub(crate) const BODY_TOO_LARGE: &str = "body exceeds configured limit";
pub(crate) const HEAD_TOO_LARGE: &str = "request head exceeds configured limit";
pub(crate) const TOO_MANY_HEADERS: &str = "too many header fields";

/// The socket read deadline elapsed before a full request arrived.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("read timed out after {0:?}")]
pub struct ReadTimeoutError(pub Duration);

/// Outcome of a failed attempt to read one request off a connection.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Peer closed the stream cleanly; not an error to report.
    #[error("connection closed by peer")]
    Closed,

    #[error(transparent)]
    Timeout(#[from] ReadTimeoutError),

    #[error(transparent)]
    Parse(#[from] RequestParseError),
}

/// Why a route lookup or registration failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingErrorKind {
    /// No node in the tree matches the path.
    NotFound,
    /// The path matched but no route is registered for the method.
    MethodNotAllowed { allowed: Vec<String> },
    /// A static mapping points at something that is not an absolute directory.
    InvalidStatic,
    /// The method is already registered at this path.
    Duplicate,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("route `{route_path}`: {message}")]
pub struct RoutingError {
    pub kind: RoutingErrorKind,
    pub route_path: String,
    pub message: String,
}

impl RoutingError {
    pub fn not_found(route_path: impl Into<String>) -> Self {
        Self {
            kind: RoutingErrorKind::NotFound,
            route_path: route_path.into(),
            message: "no route matches path".to_string(),
        }
    }

    pub fn method_not_allowed(route_path: impl Into<String>, method: &str, allowed: Vec<String>) -> Self {
        Self {
            kind: RoutingErrorKind::MethodNotAllowed { allowed },
            route_path: route_path.into(),
            message: format!("no route registered for method {}", method),
        }
    }

    pub fn invalid_static(route_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: RoutingErrorKind::InvalidStatic,
            route_path: route_path.into(),
            message: message.into(),
        }
    }

    pub fn duplicate(route_path: impl Into<String>, method: &str) -> Self {
        Self {
            kind: RoutingErrorKind::Duplicate,
            route_path: route_path.into(),
            message: format!("method {} already registered", method),
        }
    }

    /// Status code used when this error is shown to a client.
    pub fn status(&self) -> u16 {
        match self.kind {
            RoutingErrorKind::NotFound => 404,
            RoutingErrorKind::MethodNotAllowed { .. } => 405,
            RoutingErrorKind::InvalidStatic | RoutingErrorKind::Duplicate => 500,
        }
    }
}

/// Part of the response a write failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSection {
    StatusLine,
    Headers,
    Body,
    Flush,
}

impl fmt::Display for WriteSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteSection::StatusLine => "status line",
            WriteSection::Headers => "headers",
            WriteSection::Body => "body",
            WriteSection::Flush => "flush",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to write {section} `{value}`: {message}")]
pub struct ResponseError {
    pub section: WriteSection,
    pub value: String,
    pub message: String,
}

impl ResponseError {
    pub fn new(section: WriteSection, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            section,
            value: value.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{target_path:?}: {message}")]
pub struct FileSystemError {
    pub target_path: PathBuf,
    pub message: String,
}

impl FileSystemError {
    pub fn new(target_path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while bringing the server up or down.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Any error the engine can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] RequestParseError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    ReadTimeout(#[from] ReadTimeoutError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_keeps_fields() {
        let err = RequestParseError::new(ParseSection::Header, "Host example.com", "missing colon");
        assert_eq!(err.section, ParseSection::Header);
        assert_eq!(err.to_string(), "invalid header `Host example.com`: missing colon");
    }

    #[test]
    fn head_limit_errors_are_recognised() {
        let err = RequestParseError::new(ParseSection::Header, "X-Big", HEAD_TOO_LARGE);
        assert!(err.is_head_too_large());
        assert!(!err.is_too_large());
        let err = RequestParseError::new(ParseSection::Header, "129", TOO_MANY_HEADERS);
        assert!(err.is_head_too_large());
        let err = RequestParseError::new(ParseSection::ContentLength, "100", BODY_TOO_LARGE);
        assert!(!err.is_head_too_large());
    }

    #[test]
    fn routing_error_status() {
        assert_eq!(RoutingError::not_found("/x").status(), 404);
        let err = RoutingError::method_not_allowed("/link/:id", "PUT", vec!["GET".into()]);
        assert_eq!(err.status(), 405);
        assert!(matches!(err.kind, RoutingErrorKind::MethodNotAllowed { ref allowed } if allowed == &["GET"]));
    }

    #[test]
    fn errors_convert_into_crate_error() {
        let err: Error = ReadTimeoutError(Duration::from_secs(1)).into();
        assert!(matches!(err, Error::ReadTimeout(_)));
    }
}
