//! Connection tracking and the per-connection request loop.
//!
//! # Responsibilities
//! - Count active connections for the keep-alive heuristic
//! - Generate unique connection IDs for tracing
//! - Read, handle and write requests sequentially on one socket
//! - Stop at EOF, read timeout, protocol error or shutdown
//!
//! # Connection Loop
//! ```text
//! read request (deadline, raced against shutdown)
//!     → Closed / Timeout → close quietly
//!     → Parse error      → 400/413, close
//!     → respond (keep-alive negotiation, middleware, routing)
//!     → write + flush
//!     → keep-alive? next read with the negotiated deadline : close
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;

use crate::config::protocol::HTTP_11;
use crate::error::ReadError;
use crate::http::request::{ReadOptions, Request};
use crate::http::response::Response;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::server::ServerState;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Shared count of open connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionWatcher {
    active: Arc<AtomicU64>,
}

impl ConnectionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection. The returned guard decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let count = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(count);
        ConnectionGuard {
            active: Arc::clone(&self.active),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Tracks one connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let count = self.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::set_active_connections(count);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Serve requests on `stream` until the peer leaves, a deadline passes or
/// shutdown is signalled.
pub async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
    mut shutdown: ShutdownSignal,
    guard: ConnectionGuard,
) {
    let id = guard.id();
    tracing::debug!(connection_id = %id, peer_addr = %peer, "Connection opened");

    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);
    let mut read_timeout = Duration::from_secs(state.config.timeouts.read_secs);
    let mut served: u32 = 0;

    loop {
        let mut req = Request::new(Some(peer));
        let options = ReadOptions {
            timeout: Some(read_timeout),
            max_body_bytes: state.config.limits.max_body_bytes,
            max_header_bytes: state.config.limits.max_header_bytes,
            max_headers: state.config.limits.max_headers,
        };

        let read = tokio::select! {
            _ = shutdown.recv() => {
                tracing::trace!(connection_id = %id, "Shutdown observed, closing connection");
                break;
            }
            read = req.read_from(&mut reader, options) => read,
        };

        match read {
            Ok(()) => {}
            Err(ReadError::Closed) => {
                tracing::trace!(connection_id = %id, "Peer closed connection");
                break;
            }
            Err(ReadError::Timeout(e)) => {
                tracing::trace!(connection_id = %id, timeout = ?e.0, "Connection idle, closing");
                break;
            }
            Err(ReadError::Parse(e)) => {
                tracing::warn!(connection_id = %id, peer_addr = %peer, error = %e, "Malformed request");
                let mut res = Response::new(HTTP_11, &state.config.server_name);
                res.header("Connection", "close");
                let status = if e.is_too_large() {
                    413
                } else if e.is_head_too_large() {
                    431
                } else {
                    400
                };
                res.send_error(status);
                if let Err(e) = res.write_to(&mut writer).await {
                    tracing::debug!(connection_id = %id, error = %e, "Failed to send error response");
                }
                break;
            }
        }

        served += 1;
        let (res, keep_alive) = state.respond(&mut req, served);

        tracing::info!(
            connection_id = %id,
            peer_addr = %peer,
            method = %req.method,
            path = %req.path,
            version = %req.version,
            status = res.status,
            elapsed_ms = req.elapsed().as_millis() as u64,
            "Request completed"
        );
        metrics::record_request(&req.method, res.status, req.elapsed());

        if let Err(e) = res.write_to(&mut writer).await {
            tracing::warn!(
                connection_id = %id,
                method = %req.method,
                path = %req.path,
                error = %e,
                "Failed to write response"
            );
            break;
        }

        match keep_alive {
            Some(timeout) => read_timeout = timeout,
            None => break,
        }
    }

    if let Err(e) = writer.shutdown().await {
        tracing::trace!(connection_id = %id, error = %e, "Socket shutdown failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn watcher_counts() {
        let watcher = ConnectionWatcher::new();
        assert_eq!(watcher.active_count(), 0);

        let guard1 = watcher.track();
        let guard2 = watcher.clone().track();
        assert_eq!(watcher.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(watcher.active_count(), 1);

        drop(guard2);
        assert_eq!(watcher.active_count(), 0);
    }
}
