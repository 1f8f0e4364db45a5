//! Middleware pipeline.
//!
//! # Data Flow
//! ```text
//! server middleware (Server::use_middleware, registration order)
//!     → route middleware (per route, registration order)
//!     → handler
//! ```
//!
//! A middleware that calls [`Flow::stop`] halts the chain and is expected to
//! have sent a response already.

pub mod body;

use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::Response;

/// Stop signal handed to each middleware.
#[derive(Debug)]
pub struct Flow {
    proceed: bool,
}

impl Flow {
    fn new() -> Self {
        Self { proceed: true }
    }

    /// Halt the pipeline after the current middleware returns.
    pub fn stop(&mut self) {
        self.proceed = false;
    }

    pub fn is_stopped(&self) -> bool {
        !self.proceed
    }
}

pub type Middleware = Arc<dyn Fn(&mut Request, &mut Response, &mut Flow) + Send + Sync>;

/// Wrap a closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(&mut Request, &mut Response, &mut Flow) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One run over an ordered middleware stack.
pub struct Pipeline<'a> {
    stack: &'a [Middleware],
    flow: Flow,
}

impl<'a> Pipeline<'a> {
    pub fn new(stack: &'a [Middleware]) -> Self {
        Self {
            stack,
            flow: Flow::new(),
        }
    }

    /// Run every middleware in order. Returns `false` if one stopped the chain.
    pub fn run(mut self, req: &mut Request, res: &mut Response) -> bool {
        for mw in self.stack {
            mw(req, res, &mut self.flow);
            if self.flow.is_stopped() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn tagger(tag: &'static str) -> Middleware {
        middleware(move |req: &mut Request, _res: &mut Response, _flow: &mut Flow| {
            let seen = req.locals.entry("seen").or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = seen {
                items.push(Value::from(tag));
            }
        })
    }

    fn seen(req: &Request) -> Vec<String> {
        req.locals["seen"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn runs_in_registration_order() {
        let stack = vec![tagger("a"), tagger("b"), tagger("c")];
        let mut req = Request::default();
        let mut res = Response::new("1.1", "t");
        assert!(Pipeline::new(&stack).run(&mut req, &mut res));
        assert_eq!(seen(&req), ["a", "b", "c"]);
    }

    #[test]
    fn stop_halts_immediately() {
        let stopper = middleware(|_req: &mut Request, res: &mut Response, flow: &mut Flow| {
            res.send_error(401);
            flow.stop();
        });
        let stack = vec![tagger("a"), stopper, tagger("never")];
        let mut req = Request::default();
        let mut res = Response::new("1.1", "t");

        assert!(!Pipeline::new(&stack).run(&mut req, &mut res));
        assert_eq!(seen(&req), ["a"]);
        assert_eq!(res.status, 401);
    }

    #[test]
    fn empty_stack_continues() {
        let mut req = Request::default();
        let mut res = Response::new("1.1", "t");
        assert!(Pipeline::new(&[]).run(&mut req, &mut res));
    }
}
