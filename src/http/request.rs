//! Request model and the request reader.
//!
//! # Responsibilities
//! - Read the request line, headers and body off a buffered stream
//! - Validate date headers, dropping unparseable ones
//! - Split the query string into parameters
//!
//! # Design Decisions
//! - A two-token request line means HTTP/0.9: no headers are read
//! - Clean EOF before a request line is a graceful close, not an error
//! - The read deadline covers the whole request, like a socket deadline
//! - Bodies are sized by `Content-Length` only (no chunked encoding)
//! - The request line and headers share one byte budget; header count is capped

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::config::protocol::HTTP_09;
use crate::error::{
    ParseSection, ReadError, ReadTimeoutError, RequestParseError, BODY_TOO_LARGE, HEAD_TOO_LARGE,
    TOO_MANY_HEADERS,
};
use crate::http::date::{is_date_header, parse_http_date};
use crate::http::headers::{canonical_key, Headers, Params};
use crate::routing::path::clean_route;

/// Limits applied while reading one request.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Deadline for the whole request; `None` waits forever.
    pub timeout: Option<Duration>,
    pub max_body_bytes: usize,
    /// Byte budget for the request line and all header lines together.
    pub max_header_bytes: usize,
    pub max_headers: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            max_body_bytes: 8 * 1024 * 1024,
            max_header_bytes: 8 * 1024,
            max_headers: 128,
        }
    }
}

/// One HTTP request, as read off a connection.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    /// Resource path; the query string is removed once parameters are found.
    pub path: String,
    /// `major.minor`, "0.9" until a request line says otherwise.
    pub version: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub content_length: usize,
    pub query: Params,
    /// Path parameters captured by the router.
    pub segments: Params,
    /// Scratch storage shared by middleware and handlers for this exchange.
    pub locals: Map<String, Value>,
    pub peer_addr: Option<SocketAddr>,
    started: Instant,
}

impl Request {
    pub fn new(peer_addr: Option<SocketAddr>) -> Self {
        Self {
            method: String::new(),
            path: String::new(),
            version: HTTP_09.to_string(),
            headers: Headers::new(),
            body: Vec::new(),
            content_length: 0,
            query: Params::new(),
            segments: Params::new(),
            locals: Map::new(),
            peer_addr,
            started: Instant::now(),
        }
    }

    /// Read and parse one request from `reader`.
    pub async fn read_from<R>(&mut self, reader: &mut R, options: ReadOptions) -> Result<(), ReadError>
    where
        R: AsyncBufRead + Unpin,
    {
        let result = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.parse(reader, options)).await {
                Ok(result) => result,
                Err(_) => Err(ReadTimeoutError(limit).into()),
            },
            None => self.parse(reader, options).await,
        };
        self.started = Instant::now();
        result
    }

    async fn parse<R>(&mut self, reader: &mut R, options: ReadOptions) -> Result<(), ReadError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line = Vec::new();
        let mut seen_request_line = false;
        let mut head_bytes = 0usize;
        let mut header_count = 0usize;

        loop {
            line.clear();
            // One byte past the budget is enough to detect the overflow.
            let remaining = options.max_header_bytes.saturating_sub(head_bytes);
            let n = (&mut *reader)
                .take(remaining as u64 + 1)
                .read_until(b'\n', &mut line)
                .await
                .map_err(stream_error)?;
            head_bytes += n;
            if head_bytes > options.max_header_bytes {
                let section = if seen_request_line {
                    ParseSection::Header
                } else {
                    ParseSection::RequestLine
                };
                return Err(RequestParseError::new(section, format!("{head_bytes} bytes"), HEAD_TOO_LARGE).into());
            }
            if n == 0 {
                if seen_request_line {
                    break;
                }
                return Err(ReadError::Closed);
            }

            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\r', '\n']);

            if !seen_request_line {
                if text.trim().is_empty() {
                    continue;
                }
                self.parse_request_line(text)?;
                seen_request_line = true;
                if self.version == HTTP_09 {
                    break;
                }
                continue;
            }

            if text.is_empty() {
                break;
            }
            header_count += 1;
            if header_count > options.max_headers {
                return Err(
                    RequestParseError::new(ParseSection::Header, header_count.to_string(), TOO_MANY_HEADERS).into(),
                );
            }
            self.parse_header_line(text)?;
        }

        if let Some(raw) = self.headers.get("Content-Length") {
            let length: usize = raw.trim().parse().map_err(|_| {
                RequestParseError::new(ParseSection::ContentLength, raw, "not a non-negative integer")
            })?;
            if length > options.max_body_bytes {
                return Err(RequestParseError::new(ParseSection::ContentLength, raw, BODY_TOO_LARGE).into());
            }
            self.content_length = length;
            self.read_body(reader, length).await?;
        }

        self.parse_query();
        Ok(())
    }

    fn parse_request_line(&mut self, line: &str) -> Result<(), RequestParseError> {
        let tokens: Vec<&str> = line.split(' ').map(str::trim).collect();
        match tokens.as_slice() {
            [method, path] => {
                self.method = method.to_string();
                self.path = path.to_string();
                self.version = HTTP_09.to_string();
            }
            [method, path, version] => {
                let version = version.strip_prefix("HTTP/").ok_or_else(|| {
                    RequestParseError::new(ParseSection::RequestLine, *version, "version must start with HTTP/")
                })?;
                self.method = method.to_string();
                self.path = path.to_string();
                self.version = version.to_string();
            }
            _ => {
                return Err(RequestParseError::new(
                    ParseSection::RequestLine,
                    line,
                    format!("expected 2 or 3 tokens, found {}", tokens.len()),
                ))
            }
        }
        if self.method.is_empty() || self.path.is_empty() {
            return Err(RequestParseError::new(ParseSection::RequestLine, line, "empty method or path"));
        }
        Ok(())
    }

    fn parse_header_line(&mut self, line: &str) -> Result<(), RequestParseError> {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| RequestParseError::new(ParseSection::Header, line, "missing ':'"))?;
        let key = canonical_key(key);
        let value = value.trim();

        if is_date_header(&key) && parse_http_date(value).is_none() {
            tracing::warn!(header = %key, value = %value, "Dropping header with unparseable date");
            return Ok(());
        }

        self.headers.add(&key, value);
        Ok(())
    }

    async fn read_body<R>(&mut self, reader: &mut R, length: usize) -> Result<(), ReadError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.body = vec![0; length];
        reader.read_exact(&mut self.body).await.map_err(|e| {
            RequestParseError::new(ParseSection::Body, length.to_string(), e.to_string())
        })?;
        Ok(())
    }

    /// Split `?query` off the path. The path is only rewritten when at least
    /// one parameter was found.
    fn parse_query(&mut self) {
        let Some((path, query)) = self.path.split_once('?') else {
            return;
        };
        let params: Params = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if !params.is_empty() {
            self.path = clean_route(path);
            self.query = params;
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// First captured value of a path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.segments.get(name)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    /// Whether the client asked for the connection to stay open.
    pub fn wants_keep_alive(&self) -> bool {
        self.headers.has_token("Connection", "keep-alive")
    }

    /// Time since the request finished reading.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new(None)
    }
}

fn stream_error(err: std::io::Error) -> ReadError {
    RequestParseError::new(ParseSection::Stream, err.kind().to_string(), err.to_string()).into()
}
