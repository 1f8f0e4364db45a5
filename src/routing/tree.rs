//! Prefix tree keyed by path segments.
//!
//! # Matching
//! - Literal children are tried first at every level
//! - A `:name` child is the fallback and captures the segment under `name`
//! - No backtracking: a literal match that dead-ends does not retry the parameter branch
//!
//! Built during registration, read-only while serving.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RoutingError;
use crate::http::headers::Params;
use crate::routing::path::{clean_route, segments};
use crate::routing::router::Route;

#[derive(Debug, Default)]
pub struct Node {
    children: BTreeMap<String, Node>,
    routes: Vec<Arc<Route>>,
}

impl Node {
    /// Exact literal child, then the first parameter child.
    fn child<'a>(&'a self, segment: &str, captures: &mut Params) -> Option<&'a Node> {
        if let Some(node) = self.children.get(segment) {
            return Some(node);
        }
        self.children
            .iter()
            .find(|(key, _)| key.starts_with(':'))
            .map(|(key, node)| {
                captures.add(&key[1..], segment);
                node
            })
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }
}

/// A route found for a request, with the captured path parameters.
#[derive(Debug, Clone)]
pub struct TreeMatch {
    pub route: Arc<Route>,
    pub segments: Params,
}

#[derive(Debug, Default)]
pub struct PrefixTree {
    root: Node,
    len: usize,
}

impl PrefixTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `route` at the node for `route.path`, creating nodes as needed.
    /// A second route for the same method at the same path is rejected.
    pub fn insert(&mut self, route: Route) -> Result<(), RoutingError> {
        let mut node = &mut self.root;
        for segment in segments(&route.path) {
            node = node.children.entry(segment).or_default();
        }
        if node.routes.iter().any(|r| r.method.eq_ignore_ascii_case(&route.method)) {
            return Err(RoutingError::duplicate(route.path, &route.method));
        }
        node.routes.push(Arc::new(route));
        self.len += 1;
        Ok(())
    }

    /// Find the route registered for `method` at `path`.
    pub fn lookup(&self, method: &str, path: &str) -> Result<TreeMatch, RoutingError> {
        let path = clean_route(path);
        let mut captures = Params::new();
        let mut node = &self.root;

        for segment in segments(&path) {
            node = node
                .child(&segment, &mut captures)
                .ok_or_else(|| RoutingError::not_found(path.clone()))?;
        }

        if node.routes.is_empty() {
            return Err(RoutingError::not_found(path));
        }

        match node.routes.iter().find(|r| r.method.eq_ignore_ascii_case(method)) {
            Some(route) => Ok(TreeMatch {
                route: Arc::clone(route),
                segments: captures,
            }),
            None => {
                let allowed = node.routes.iter().map(|r| r.method.clone()).collect();
                Err(RoutingError::method_not_allowed(path, method, allowed))
            }
        }
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutingErrorKind;
    use crate::routing::router::handler;

    fn route(method: &str, path: &str) -> Route {
        Route::new(method, path, handler(|_, _| {}), Vec::new())
    }

    fn tree() -> PrefixTree {
        let mut tree = PrefixTree::new();
        tree.insert(route("GET", "/users/:id")).unwrap();
        tree.insert(route("GET", "/users/me")).unwrap();
        tree.insert(route("POST", "/users/:id")).unwrap();
        tree.insert(route("GET", "/link/:id")).unwrap();
        tree.insert(route("GET", "/")).unwrap();
        tree
    }

    #[test]
    fn captures_parameters() {
        let found = tree().lookup("GET", "/users/42").unwrap();
        assert_eq!(found.route.path, "/users/:id");
        assert_eq!(found.segments.get_all("id"), ["42"]);
    }

    #[test]
    fn literal_beats_parameter() {
        let found = tree().lookup("GET", "/users/me").unwrap();
        assert_eq!(found.route.path, "/users/me");
        assert!(found.segments.is_empty());
    }

    #[test]
    fn methods_share_a_node() {
        let found = tree().lookup("post", "/users/7").unwrap();
        assert_eq!(found.route.method, "POST");
    }

    #[test]
    fn method_mismatch_is_an_error() {
        let err = tree().lookup("PUT", "/link/9").unwrap_err();
        assert_eq!(
            err.kind,
            RoutingErrorKind::MethodNotAllowed { allowed: vec!["GET".to_string()] }
        );
    }

    #[test]
    fn unknown_path_is_not_found() {
        let t = tree();
        assert_eq!(t.lookup("GET", "/nope").unwrap_err().kind, RoutingErrorKind::NotFound);
        // intermediate node without routes
        assert_eq!(t.lookup("GET", "/users").unwrap_err().kind, RoutingErrorKind::NotFound);
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn duplicate_method_rejected() {
        let mut t = tree();
        let err = t.insert(route("get", "/link/:id")).unwrap_err();
        assert_eq!(err.kind, RoutingErrorKind::Duplicate);
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn root_and_messy_paths() {
        let t = tree();
        assert_eq!(t.lookup("GET", "/").unwrap().route.path, "/");
        assert_eq!(t.lookup("GET", "//users//42/").unwrap().segments.get("id"), Some("42"));
    }
}
