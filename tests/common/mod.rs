//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use http_engine::config::ServerConfig;
use http_engine::net::Listener;
use http_engine::Server;

/// Upper bound on any single socket operation in tests.
pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<http_engine::Result<()>>,
}

impl TestServer {
    /// Signal shutdown and wait for `serve` to return.
    pub async fn stop(mut self) -> http_engine::Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        tokio::time::timeout(IO_TIMEOUT, self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Config suited to tests: short deadlines.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.port = 0;
    config.timeouts.read_secs = 2;
    config.timeouts.shutdown_secs = 2;
    config
}

/// Serve `server` on 127.0.0.1 with a random port.
pub async fn start(server: Server) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(server.serve(Listener::from_tcp(listener), async move {
        let _ = stopped.await;
    }));

    TestServer {
        addr,
        stop: Some(stop),
        handle,
    }
}

/// Send `raw` on a fresh connection and read until the server closes it.
pub async fn send_raw(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    // A reset after the response (unread request bytes) still counts as closed.
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    tokio::time::timeout(IO_TIMEOUT, async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
            }
        }
    })
    .await
    .expect("server did not close the connection");
    String::from_utf8_lossy(&out).into_owned()
}

/// One parsed HTTP response.
#[derive(Debug)]
pub struct RawResponse {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn status(&self) -> u16 {
        self.status_line
            .split(' ')
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap_or(0)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Read exactly one response, framed by Content-Length.
pub async fn read_response(reader: &mut BufReader<TcpStream>) -> RawResponse {
    tokio::time::timeout(IO_TIMEOUT, async {
        let mut status_line = String::new();
        reader.read_line(&mut status_line).await.unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (k, v) = line.split_once(':').unwrap();
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }

        let length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
            .map(|(_, v)| v.parse::<usize>().unwrap())
            .unwrap_or(0);
        let mut body = vec![0; length];
        reader.read_exact(&mut body).await.unwrap();

        RawResponse {
            status_line: status_line.trim_end().to_string(),
            headers,
            body,
        }
    })
    .await
    .expect("timed out reading response")
}
