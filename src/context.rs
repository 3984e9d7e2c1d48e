//! Request values at the dispatch boundary.
//!
//! [`Request`] is what the server collaborator (or the test client) hands to
//! the dispatcher. [`RequestContext`] is built from it once a route matched and
//! lives for exactly one request: the captured params, the query/form data and
//! a scratch map that before-hooks use to pass values to the handler.

use http::Method;
use serde_json::Value;
use std::collections::HashMap;

use crate::ids::RequestId;
use crate::router::ParamVec;

/// Inbound request as supplied by the server collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Query string arguments.
    pub query: HashMap<String, String>,
    /// Form fields from the request body.
    pub form: HashMap<String, String>,
    /// Lower-cased header names.
    pub headers: HashMap<String, String>,
    /// Raw JSON body, when the body parsed as JSON.
    pub json: Option<Value>,
}

impl Request {
    /// Build a request from a method and a URL that may carry a `?query`.
    ///
    /// The live server and the test client both go through here, so query
    /// parsing is identical for both.
    #[must_use]
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, parse_urlencoded(query)),
            None => (url, HashMap::new()),
        };
        Self {
            method,
            path: if path.is_empty() { "/" } else { path }.to_string(),
            query,
            form: HashMap::new(),
            headers: HashMap::new(),
            json: None,
        }
    }

    #[must_use]
    pub fn with_form<I, K, V>(mut self, form: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.form
            .extend(form.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }
}

/// Decode an `a=1&b=2` string; the last occurrence of a repeated key wins.
pub(crate) fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Per-request state shared by the before-hooks and the handler.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    params: ParamVec,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    headers: HashMap<String, String>,
    json: Option<Value>,
    scratch: HashMap<String, Value>,
}

impl RequestContext {
    #[must_use]
    pub fn new(request: Request, params: ParamVec) -> Self {
        let request_id =
            RequestId::from_header_or_new(request.headers.get("x-request-id").map(String::as_str));
        Self {
            request_id,
            method: request.method,
            path: request.path,
            params,
            query: request.query,
            form: request.form,
            headers: request.headers,
            json: request.json,
            scratch: HashMap::new(),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Captured path parameter; last write wins on repeated names.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// All captures, in pattern order.
    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn form(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Store a value in the scratch map, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.scratch.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.scratch.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.scratch.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_request_splits_query() {
        let req = Request::new(Method::GET, "/admin?user=ada&x=1&x=2");
        assert_eq!(req.path, "/admin");
        assert_eq!(req.query.get("user").map(String::as_str), Some("ada"));
        assert_eq!(req.query.get("x").map(String::as_str), Some("2"));

        let req = Request::new(Method::GET, "?q=1");
        assert_eq!(req.path, "/");
    }

    #[test]
    fn test_context_accessors() {
        let req = Request::new(Method::POST, "/login?next=%2Fhome")
            .with_form([("user", "admin"), ("pwd", "admin")])
            .with_header("X-Trace", "abc");
        let mut params = ParamVec::new();
        params.push((Arc::from("id"), "1".to_string()));
        params.push((Arc::from("id"), "2".to_string()));
        let ctx = RequestContext::new(req, params);

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.path(), "/login");
        assert_eq!(ctx.param("id"), Some("2"));
        assert_eq!(ctx.query("next"), Some("/home"));
        assert_eq!(ctx.form("pwd"), Some("admin"));
        assert_eq!(ctx.header("x-trace"), Some("abc"));
        assert_eq!(ctx.header("X-TRACE"), Some("abc"));
        assert!(ctx.json().is_none());
    }

    #[test]
    fn test_scratch_map() {
        let mut ctx = RequestContext::new(Request::new(Method::GET, "/"), ParamVec::new());
        assert!(ctx.set("user", "ada").is_none());
        assert_eq!(ctx.get("user"), Some(&json!("ada")));
        assert_eq!(ctx.set("user", Value::Null), Some(json!("ada")));
        assert_eq!(ctx.remove("user"), Some(Value::Null));
        assert!(ctx.get("user").is_none());
    }

    #[test]
    fn test_request_id_from_header() {
        let id = RequestId::new();
        let req = Request::new(Method::GET, "/").with_header("X-Request-Id", id.to_string());
        let ctx = RequestContext::new(req, ParamVec::new());
        assert_eq!(ctx.request_id(), id);
    }
}
