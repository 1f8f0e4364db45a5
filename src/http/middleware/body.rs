//! Body-decoding middleware.
//!
//! Decoded bodies land in `req.locals["body"]`. Requests with another content
//! type pass through untouched.

use serde_json::{Map, Value};

use crate::http::middleware::{middleware, Flow, Middleware};
use crate::http::request::Request;
use crate::http::response::Response;

pub const BODY_LOCAL: &str = "body";

fn content_type_is(req: &Request, expected: &str) -> bool {
    req.header("Content-Type")
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// Decode `application/json` bodies. Malformed JSON is answered with 400.
pub fn json_body() -> Middleware {
    middleware(|req: &mut Request, res: &mut Response, flow: &mut Flow| {
        if !content_type_is(req, "application/json") || req.body.is_empty() {
            return;
        }
        match serde_json::from_slice::<Value>(&req.body) {
            Ok(value) => {
                req.locals.insert(BODY_LOCAL.to_string(), value);
            }
            Err(e) => {
                tracing::debug!(path = %req.path, error = %e, "Rejecting malformed JSON body");
                res.send_error(400);
                flow.stop();
            }
        }
    })
}

/// Decode `application/x-www-form-urlencoded` bodies into an object of string arrays.
pub fn form_body() -> Middleware {
    middleware(|req: &mut Request, _res: &mut Response, _flow: &mut Flow| {
        if !content_type_is(req, "application/x-www-form-urlencoded") {
            return;
        }
        let mut fields: Map<String, Value> = Map::new();
        for (key, value) in url::form_urlencoded::parse(&req.body) {
            let entry = fields
                .entry(key.into_owned())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(values) = entry {
                values.push(Value::String(value.into_owned()));
            }
        }
        req.locals.insert(BODY_LOCAL.to_string(), Value::Object(fields));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::middleware::Pipeline;
    use serde_json::json;

    fn request(content_type: &str, body: &str) -> Request {
        let mut req = Request::default();
        req.headers.add("Content-Type", content_type);
        req.body = body.as_bytes().to_vec();
        req
    }

    #[test]
    fn decodes_json() {
        let stack = vec![json_body()];
        let mut req = request("application/json; charset=utf-8", r#"{"name":"ada"}"#);
        let mut res = Response::new("1.1", "t");
        assert!(Pipeline::new(&stack).run(&mut req, &mut res));
        assert_eq!(req.locals[BODY_LOCAL], json!({"name": "ada"}));
    }

    #[test]
    fn malformed_json_stops_with_400() {
        let stack = vec![json_body()];
        let mut req = request("application/json", "{oops");
        let mut res = Response::new("1.1", "t");
        assert!(!Pipeline::new(&stack).run(&mut req, &mut res));
        assert_eq!(res.status, 400);
        assert!(res.is_sent());
    }

    #[test]
    fn decodes_forms() {
        let stack = vec![form_body()];
        let mut req = request("application/x-www-form-urlencoded", "a=1&b=two+words&a=3");
        let mut res = Response::new("1.1", "t");
        assert!(Pipeline::new(&stack).run(&mut req, &mut res));
        assert_eq!(req.locals[BODY_LOCAL], json!({"a": ["1", "3"], "b": ["two words"]}));
    }

    #[test]
    fn other_types_pass_through() {
        let stack = vec![json_body(), form_body()];
        let mut req = request("text/plain", "hello");
        let mut res = Response::new("1.1", "t");
        assert!(Pipeline::new(&stack).run(&mut req, &mut res));
        assert!(req.locals.is_empty());
    }
}
