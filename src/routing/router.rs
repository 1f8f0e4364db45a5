//! Route registration, lookup and dispatch.
//!
//! # Responsibilities
//! - Register handlers per method into the prefix tree
//! - Map route prefixes onto static directories
//! - Resolve a request to a static file or a tree route
//! - Run route middleware and the handler, or answer with an error page
//!
//! # Design Decisions
//! - Immutable after registration (shared via Arc without locks)
//! - Static mounts are checked longest prefix first, on segment boundaries
//! - Static lookups go straight to the filesystem, bypassing the tree
//! - Explicit errors for no-match and method mismatch rather than a silent default

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::RoutingError;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::http::date::parse_http_date;
use crate::http::middleware::{Middleware, Pipeline};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::path::{clean_route, file_segments, strip_route_prefix};
use crate::routing::tree::{PrefixTree, TreeMatch};

pub type Handler = Arc<dyn Fn(&mut Request, &mut Response) + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A handler registered for one method at one path.
#[derive(Clone)]
pub struct Route {
    pub method: String,
    /// Normalized pattern, e.g. `/users/:id`.
    pub path: String,
    pub handler: Handler,
    pub middleware: Vec<Middleware>,
}

impl Route {
    pub fn new(method: &str, path: &str, handler: Handler, middleware: Vec<Middleware>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: clean_route(path),
            handler,
            middleware,
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// What a request resolved to.
#[derive(Debug, Clone)]
pub enum RouteMatch {
    /// A file under a static mount.
    Static(PathBuf),
    Dynamic(TreeMatch),
}

#[derive(Debug, Clone)]
struct StaticMount {
    prefix: String,
    directory: PathBuf,
}

pub struct Router {
    tree: PrefixTree,
    statics: Vec<StaticMount>,
    fs: Arc<dyn FileSystem>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_file_system(Arc::new(LocalFileSystem))
    }

    pub fn with_file_system(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            tree: PrefixTree::new(),
            statics: Vec::new(),
            fs,
        }
    }

    /// Register `handler` for `method` at `path`.
    pub fn route<F, M>(&mut self, method: &str, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        let route = Route::new(method, path, Arc::new(handler), middleware.into_iter().collect());
        tracing::debug!(method = %route.method, path = %route.path, "Route registered");
        self.tree.insert(route)
    }

    /// Serve files under `directory` for requests below `route_prefix`.
    pub fn static_dir(&mut self, route_prefix: &str, directory: impl AsRef<Path>) -> Result<(), RoutingError> {
        let directory = directory.as_ref();
        let prefix = clean_route(route_prefix);

        if !self.fs.is_absolute(directory) {
            return Err(RoutingError::invalid_static(prefix, format!("{:?} is not absolute", directory)));
        }
        if !self.fs.exists(directory) || !self.fs.is_directory(directory) {
            return Err(RoutingError::invalid_static(prefix, format!("{:?} is not a directory", directory)));
        }

        tracing::debug!(prefix = %prefix, directory = ?directory, "Static route registered");
        self.statics.retain(|m| m.prefix != prefix);
        self.statics.push(StaticMount {
            prefix,
            directory: directory.to_path_buf(),
        });
        self.statics.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Ok(())
    }

    /// Resolve `method path` to a static file or a registered route.
    pub fn match_request(&self, method: &str, path: &str) -> Result<RouteMatch, RoutingError> {
        if method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") {
            if let Some(file) = self.find_static(path) {
                return Ok(RouteMatch::Static(file));
            }
        }
        self.tree.lookup(method, path).map(RouteMatch::Dynamic)
    }

    fn find_static(&self, path: &str) -> Option<PathBuf> {
        let path = clean_route(path);
        for mount in &self.statics {
            let Some(rest) = strip_route_prefix(&path, &mount.prefix) else {
                continue;
            };
            let Some(parts) = file_segments(rest) else {
                tracing::debug!(path = %path, "Rejecting encoded path escape");
                continue;
            };
            let mut target = mount.directory.clone();
            target.extend(parts);

            if self.fs.is_directory(&target) {
                let index = target.join("index.html");
                if self.fs.exists(&index) && !self.fs.is_directory(&index) {
                    return Some(index);
                }
            } else if self.fs.exists(&target) {
                return Some(target);
            }
        }
        None
    }

    /// Route the request and produce its response.
    pub fn handle(&self, req: &mut Request, res: &mut Response) {
        match self.match_request(&req.method, &req.path) {
            Ok(RouteMatch::Static(file)) => self.serve_static(req, res, &file),
            Ok(RouteMatch::Dynamic(found)) => {
                req.segments = found.segments;
                if !Pipeline::new(&found.route.middleware).run(req, res) || res.is_sent() {
                    return;
                }
                (found.route.handler)(req, res);
            }
            Err(e) => {
                tracing::debug!(method = %req.method, path = %req.path, error = %e, "Routing failed");
                if let crate::error::RoutingErrorKind::MethodNotAllowed { allowed } = &e.kind {
                    res.header("Allow", allowed.join(", "));
                }
                res.send_error(e.status());
            }
        }
    }

    /// Answer with a file, honouring HEAD and conditional GET.
    pub fn serve_static(&self, req: &Request, res: &mut Response, file: &Path) {
        let info = match self.fs.info(file) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "Static file vanished");
                res.send_error(404);
                return;
            }
        };

        let not_modified = match (req.header("If-Modified-Since").and_then(parse_http_date), info.modified) {
            (Some(since), Some(modified)) => modified.timestamp() <= since.timestamp(),
            _ => false,
        };
        if not_modified {
            res.send_file(304, &info, None);
            return;
        }

        if req.method.eq_ignore_ascii_case("HEAD") {
            res.send_file(200, &info, None);
            return;
        }

        match self.fs.read(file) {
            Ok(body) => res.send_file(200, &info, Some(body)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read static file");
                res.send_error(500);
            }
        }
    }

    pub fn get<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("GET", path, handler, middleware)
    }

    pub fn post<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("POST", path, handler, middleware)
    }

    pub fn put<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("PUT", path, handler, middleware)
    }

    pub fn delete<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("DELETE", path, handler, middleware)
    }

    pub fn head<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("HEAD", path, handler, middleware)
    }

    pub fn options<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("OPTIONS", path, handler, middleware)
    }

    pub fn trace<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("TRACE", path, handler, middleware)
    }

    pub fn connect<F, M>(&mut self, path: &str, handler: F, middleware: M) -> Result<(), RoutingError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
        M: IntoIterator<Item = Middleware>,
    {
        self.route("CONNECT", path, handler, middleware)
    }

    /// Number of registered routes, static mounts included.
    pub fn len(&self) -> usize {
        self.tree.len() + self.statics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty() && self.statics.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.tree.len())
            .field("statics", &self.statics)
            .finish()
    }
}
