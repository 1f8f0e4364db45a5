//! Server setup and lifecycle.
//!
//! # Responsibilities
//! - Own the router, server middleware and configuration until `listen`
//! - Run the accept loop, one task per connection
//! - Negotiate keep-alive and dispatch each request
//! - Terminate: close the listener, broadcast shutdown, drain with a deadline
//!
//! # Design Decisions
//! - Routes are registered before serving and read-only afterwards
//! - A failed request or connection never stops the accept loop
//! - Draining is best effort: stragglers are abandoned after the deadline

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};

use crate::config::protocol::{Protocol, HTTP_09, HTTP_11};
use crate::config::ServerConfig;
use crate::error::{Error, ServerError};
use crate::http::middleware::{Middleware, Pipeline};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::lifecycle::{Shutdown, ShutdownSignal, Termination};
use crate::net::connection::{serve_connection, ConnectionWatcher};
use crate::net::keepalive::{available_cpus, keep_alive_timeout};
use crate::net::Listener;
use crate::routing::Router;

/// HTTP server, configured and populated with routes before `listen`.
pub struct Server {
    config: Arc<ServerConfig>,
    protocol: Arc<Protocol>,
    router: Router,
    middleware: Vec<Middleware>,
}

impl Server {
    /// Create a server and mount the static directories named in `config`.
    pub fn new(config: ServerConfig) -> Result<Self, Error> {
        Self::with_router(config, Router::new())
    }

    pub fn with_router(config: ServerConfig, mut router: Router) -> Result<Self, Error> {
        for mount in &config.statics {
            router.static_dir(&mount.prefix, &mount.directory)?;
        }
        Ok(Self {
            config: Arc::new(config),
            protocol: Arc::new(Protocol::new()),
            router,
            middleware: Vec::new(),
        })
    }

    /// Route table, for registering handlers.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Add server-level middleware, run before routing on every request.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until SIGINT/SIGTERM.
    pub async fn listen(self) -> Result<(), Error> {
        let mut termination = Termination::install().map_err(ServerError::Signal)?;
        let listener = Listener::bind(&self.config.listener).await?;
        self.serve(listener, async move { termination.recv().await }).await
    }

    /// Serve on `listener` until `signal` resolves, then terminate.
    pub async fn serve<F>(self, listener: Listener, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let state = Arc::new(ServerState {
            config: self.config,
            protocol: self.protocol,
            router: self.router,
            middleware: self.middleware,
            watcher: ConnectionWatcher::new(),
            cpus: available_cpus(),
            closed: Mutex::new(false),
        });

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, routes = state.router.len(), "HTTP server listening");
        }

        let shutdown = Shutdown::new();
        let accept = tokio::spawn(accept_loop(listener, Arc::clone(&state), shutdown.subscribe()));

        signal.await;
        tracing::info!("Shutdown signal received");
        terminate(&state, &shutdown, accept).await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// State shared read-only by the accept loop and every connection.
pub struct ServerState {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) protocol: Arc<Protocol>,
    pub(crate) router: Router,
    pub(crate) middleware: Vec<Middleware>,
    pub(crate) watcher: ConnectionWatcher,
    pub(crate) cpus: usize,
    closed: Mutex<bool>,
}

impl ServerState {
    fn mark_closed(&self) {
        let mut closed = self.closed.lock().unwrap_or_else(|e| e.into_inner());
        *closed = true;
    }

    fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build the response for one parsed request. The second value is the
    /// idle timeout to use before the next request, or `None` to close.
    pub(crate) fn respond(&self, req: &mut Request, served: u32) -> (Response, Option<Duration>) {
        if !self.protocol.supports(&req.version) {
            let mut res = Response::new(HTTP_11, &self.config.server_name);
            res.header("Connection", "close");
            res.send_error(505);
            return (res, None);
        }

        let mut res = Response::new(&req.version, &self.config.server_name);
        let keep_alive = self.negotiate_keep_alive(req, &mut res, served);
        self.dispatch(req, &mut res);
        (res, keep_alive)
    }

    fn negotiate_keep_alive(&self, req: &Request, res: &mut Response, served: u32) -> Option<Duration> {
        if req.version == HTTP_09 {
            return None;
        }

        let max_requests = self.config.keep_alive.max_requests;
        let eligible = self.config.keep_alive.enabled
            && req.version == HTTP_11
            && req.wants_keep_alive()
            && served < max_requests;

        if !eligible {
            res.header("Connection", "close");
            return None;
        }

        let active = self.watcher.active_count() as usize;
        let timeout = keep_alive_timeout(active, self.cpus, self.config.keep_alive.max_timeout_secs);
        res.header("Connection", "keep-alive");
        res.header(
            "Keep-Alive",
            format!("timeout={}, max={}", timeout.as_secs(), max_requests - served),
        );
        Some(timeout)
    }

    /// Method check, server middleware, then routing.
    fn dispatch(&self, req: &mut Request, res: &mut Response) {
        if !self.protocol.allows(&req.version, &req.method) {
            tracing::debug!(method = %req.method, version = %req.version, "Method not allowed for version");
            res.header("Allow", self.protocol.methods(&req.version).join(", "));
            res.send_error(405);
            return;
        }

        if !Pipeline::new(&self.middleware).run(req, res) || res.is_sent() {
            return;
        }

        self.router.handle(req, res);
    }
}

async fn accept_loop(listener: Listener, state: Arc<ServerState>, mut shutdown: ShutdownSignal) -> JoinSet<()> {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let guard = state.watcher.track();
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        Arc::clone(&state),
                        shutdown.clone(),
                        guard,
                    ));
                }
                Err(e) => {
                    if state.is_closed() {
                        tracing::debug!(error = %e, "Accept failed on closed listener");
                    } else {
                        tracing::error!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                }
            },
            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "Connection task failed");
                }
            }
        }
    }

    drop(listener);
    connections
}

async fn terminate(state: &ServerState, shutdown: &Shutdown, accept: JoinHandle<JoinSet<()>>) {
    state.mark_closed();
    shutdown.trigger();

    let limit = Duration::from_secs(state.config.timeouts.shutdown_secs);
    let drained = tokio::time::timeout(limit, async {
        let mut connections = match accept.await {
            Ok(connections) => connections,
            Err(e) => {
                tracing::error!(error = %e, "Accept loop failed");
                return;
            }
        };
        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                tracing::error!(error = %e, "Connection task failed");
            }
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            remaining = state.watcher.active_count(),
            timeout = ?limit,
            "Shutdown deadline passed before all connections drained"
        );
    }
}
