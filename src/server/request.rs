use http::Method;
use may_minihttp::Request as RawRequest;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, warn};

use crate::context::{parse_urlencoded, Request};

/// Build a dispatcher [`Request`] from a raw `may_minihttp` request.
///
/// Headers are lower-cased. The body fills the form map when it is
/// `application/x-www-form-urlencoded` or a JSON object; a body that parses as
/// JSON is also kept as the raw JSON value. Returns `None` for a method token
/// `http` cannot represent.
pub fn parse_request(req: RawRequest) -> Option<Request> {
    let method = match Method::from_bytes(req.method().as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            warn!(method = %req.method(), "Unsupported HTTP method");
            return None;
        }
    };
    let mut request = Request::new(method, req.path());

    request.headers = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    debug!(
        header_count = request.headers.len(),
        query_count = request.query.len(),
        "Headers extracted"
    );

    let mut body = String::new();
    match req.body().read_to_string(&mut body) {
        Ok(0) => {}
        Ok(size) => {
            let content_type = request
                .headers
                .get("content-type")
                .map_or("", String::as_str);
            debug!(
                body_size_bytes = size,
                content_type = %content_type,
                "Request body read"
            );
            let (form, json) = parse_body(content_type, &body);
            request.form = form;
            request.json = json;
        }
        Err(err) => warn!(error = %err, "Failed to read request body"),
    }

    Some(request)
}

/// Split a request body into form fields and an optional JSON value.
pub(crate) fn parse_body(content_type: &str, body: &str) -> (HashMap<String, String>, Option<Value>) {
    if content_type.starts_with("application/x-www-form-urlencoded") {
        return (parse_urlencoded(body), None);
    }
    match serde_json::from_str::<Value>(body) {
        Ok(json) => (json_form(&json), Some(json)),
        Err(_) => (HashMap::new(), None),
    }
}

/// Flatten the top level of a JSON object into form fields. Strings are kept
/// as-is, other values are stringified.
fn json_form(json: &Value) -> HashMap<String, String> {
    let Some(object) = json.as_object() else {
        return HashMap::new();
    };
    object
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}
