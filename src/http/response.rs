//! Response model and the response writer.
//!
//! # Responsibilities
//! - Hold status, headers and body while handlers run
//! - Attach default headers (Date, Server) for HTTP/1.x
//! - Serialize the status line, headers and body onto a buffered writer
//!
//! # Design Decisions
//! - Handlers only mutate the response; the connection loop writes it once
//! - HTTP/0.9 responses are the raw body, no status line or headers
//! - Multi-value headers are written comma-joined on one line

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::protocol::HTTP_09;
use crate::error::{ResponseError, WriteSection};
use crate::fs::FileInfo;
use crate::http::date::{format_http_date, now};
use crate::http::headers::Headers;
use crate::http::status::{error_page, reason};

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub message: String,
    pub version: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    /// Scratch storage for middleware and handlers.
    pub locals: Map<String, Value>,
    sent: bool,
}

impl Response {
    /// A `200 OK` response for `version`, with `Date` and `Server` attached
    /// unless the version is 0.9.
    pub fn new(version: &str, server_name: &str) -> Self {
        let mut headers = Headers::new();
        if version != HTTP_09 {
            headers.set("Date", now());
            headers.set("Server", server_name);
        }
        Self {
            status: 200,
            message: reason(200).to_string(),
            version: version.to_string(),
            headers,
            body: Vec::new(),
            locals: Map::new(),
            sent: false,
        }
    }

    /// Set the status code and its standard reason phrase.
    pub fn status(&mut self, code: u16) -> &mut Self {
        self.status = code;
        self.message = reason(code).to_string();
        self
    }

    pub fn header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    /// Whether a handler or middleware has produced the final response.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Finish the response with a status, content type and body.
    pub fn send(&mut self, code: u16, content_type: &str, body: impl Into<Vec<u8>>) {
        let body = body.into();
        self.status(code);
        self.headers.set("Content-Type", content_type);
        self.headers.set("Content-Length", body.len().to_string());
        self.body = body;
        self.sent = true;
    }

    pub fn send_text(&mut self, code: u16, body: impl Into<String>) {
        self.send(code, "text/plain; charset=utf-8", body.into());
    }

    pub fn send_json<T: Serialize>(&mut self, code: u16, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => self.send(code, "application/json", body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response");
                self.send_error(500);
            }
        }
    }

    /// Finish with the default HTML error page for `code`.
    pub fn send_error(&mut self, code: u16) {
        let page = error_page(code).unwrap_or_default();
        self.send(code, "text/html; charset=utf-8", page);
    }

    /// Finish with a file. Metadata headers are only set when absent; a
    /// `None` body answers with metadata only (HEAD, 304).
    pub fn send_file(&mut self, code: u16, info: &FileInfo, body: Option<Vec<u8>>) {
        self.status(code);
        if !self.headers.contains("Content-Length") {
            self.headers.set("Content-Length", info.len.to_string());
        }
        if let Some(modified) = info.modified {
            if !self.headers.contains("Last-Modified") {
                self.headers.set("Last-Modified", format_http_date(modified));
            }
        }
        if !self.headers.contains("Content-Type") {
            self.headers.set("Content-Type", info.content_type.clone());
        }
        self.body = body.unwrap_or_default();
        self.sent = true;
    }

    /// Serialize onto `writer` and flush it.
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<(), ResponseError>
    where
        W: AsyncWrite + Unpin,
    {
        if self.version != HTTP_09 {
            let head = self.head()?;
            writer
                .write_all(head.as_bytes())
                .await
                .map_err(|e| ResponseError::new(WriteSection::Headers, head.clone(), e.to_string()))?;
        }

        // Text and binary bodies alike go out verbatim.
        writer
            .write_all(&self.body)
            .await
            .map_err(|e| ResponseError::new(WriteSection::Body, self.body.len().to_string(), e.to_string()))?;

        writer
            .flush()
            .await
            .map_err(|e| ResponseError::new(WriteSection::Flush, "", e.to_string()))
    }

    /// Status line, headers and the blank separator line.
    fn head(&self) -> Result<String, ResponseError> {
        if self.status == 0 {
            return Err(ResponseError::new(WriteSection::StatusLine, "0", "status code not set"));
        }
        if self.version.is_empty() {
            return Err(ResponseError::new(WriteSection::StatusLine, "", "protocol version not set"));
        }

        let mut head = format!("HTTP/{} {} {}\r\n", self.version, self.status, self.message);
        for (name, values) in self.headers.iter() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(&values.join(","));
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    async fn written(res: &Response) -> String {
        let mut out: Vec<u8> = Vec::new();
        res.write_to(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn http09_is_body_only() {
        let mut res = Response::new("0.9", "test");
        res.send_text(200, "Hello");
        assert_eq!(written(&res).await, "Hello");
    }

    #[tokio::test]
    async fn http11_status_line_and_headers() {
        let mut res = Response::new("1.1", "test-server");
        res.headers.add("Vary", "Accept");
        res.headers.add("Vary", "Origin");
        res.send_text(201, "made");
        let out = written(&res).await;

        assert!(out.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(out.contains("Server: test-server\r\n"));
        assert!(out.contains("Date: "));
        assert!(out.contains("Vary: Accept,Origin\r\n"));
        assert!(out.contains("Content-Length: 4\r\n"));
        assert!(out.ends_with("\r\n\r\nmade"));
    }

    #[test]
    fn default_headers_skip_http09() {
        assert!(Response::new("0.9", "s").headers.is_empty());
        let res = Response::new("1.0", "s");
        assert!(res.headers.contains("Date"));
        assert_eq!(res.headers.get("Server"), Some("s"));
        assert!(!res.is_sent());
    }

    #[tokio::test]
    async fn zero_status_is_a_write_error() {
        let mut res = Response::new("1.1", "s");
        res.status = 0;
        let mut out: Vec<u8> = Vec::new();
        let err = res.write_to(&mut out).await.unwrap_err();
        assert_eq!(err.section, WriteSection::StatusLine);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn empty_version_is_a_write_error() {
        let mut res = Response::new("1.1", "s");
        res.version.clear();
        let mut out: Vec<u8> = Vec::new();
        assert!(res.write_to(&mut out).await.is_err());
    }

    #[test]
    fn error_page_response() {
        let mut res = Response::new("1.1", "s");
        res.send_error(404);
        assert_eq!(res.status, 404);
        assert_eq!(res.message, "Not Found");
        assert!(String::from_utf8_lossy(&res.body).contains("404 - Response"));
        assert!(res.is_sent());
    }

    #[test]
    fn send_file_keeps_existing_headers() {
        let info = FileInfo {
            len: 11,
            modified: Some(Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()),
            content_type: "text/plain; charset=utf-8".into(),
        };
        let mut res = Response::new("1.1", "s");
        res.header("Content-Type", "text/x-custom");
        res.send_file(200, &info, None);

        assert_eq!(res.headers.get("Content-Type"), Some("text/x-custom"));
        assert_eq!(res.headers.get("Content-Length"), Some("11"));
        assert_eq!(res.headers.get("Last-Modified"), Some("Thu, 02 Jan 2020 03:04:05 GMT"));
        assert!(res.body.is_empty());
    }

    #[test]
    fn json_body() {
        let mut res = Response::new("1.1", "s");
        res.send_json(200, &serde_json::json!({"id": 42}));
        assert_eq!(res.body, br#"{"id":42}"#);
        assert_eq!(res.headers.get("Content-Type"), Some("application/json"));
    }
}
