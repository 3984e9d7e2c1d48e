use http::StatusCode;
use may_minihttp::Response;
use tracing::{error, warn};

use crate::dispatcher::{HandlerResponse, ResponseBody};

/// Status code and reason phrase put on the wire. Codes outside 100-599
/// cannot form a valid status line and go out as 500.
pub(crate) fn wire_status(status: u16) -> (u16, &'static str) {
    match StatusCode::from_u16(status) {
        Ok(code) if (100..600).contains(&status) => {
            (status, code.canonical_reason().unwrap_or("Unknown"))
        }
        _ => {
            warn!(status, "Invalid HTTP status code; sending 500");
            (500, "Internal Server Error")
        }
    }
}

/// `Content-Type` header line for a body content type.
///
/// `may_minihttp` only takes `'static` header lines, so the known types map
/// onto fixed strings.
pub(crate) fn content_type_header(content_type: &str) -> &'static str {
    match content_type {
        "text/plain" => "Content-Type: text/plain; charset=utf-8",
        "text/html" => "Content-Type: text/html; charset=utf-8",
        "text/css" => "Content-Type: text/css",
        "text/yaml" => "Content-Type: text/yaml",
        "application/javascript" => "Content-Type: application/javascript",
        "application/json" => "Content-Type: application/json",
        "image/png" => "Content-Type: image/png",
        "image/jpeg" => "Content-Type: image/jpeg",
        "image/gif" => "Content-Type: image/gif",
        "image/svg+xml" => "Content-Type: image/svg+xml",
        "image/x-icon" => "Content-Type: image/x-icon",
        "font/woff" => "Content-Type: font/woff",
        "font/woff2" => "Content-Type: font/woff2",
        _ => "Content-Type: application/octet-stream",
    }
}

/// Serialize a handler response onto `res`.
pub fn write_handler_response(res: &mut Response, response: HandlerResponse) {
    let (status, reason) = wire_status(response.status);
    res.status_code(usize::from(status), reason);
    match response.body {
        ResponseBody::Empty => {}
        ResponseBody::Text(text) => {
            res.header(content_type_header("text/plain"));
            res.body_vec(text.into_bytes());
        }
        ResponseBody::Json(value) => match serde_json::to_vec(&value) {
            Ok(bytes) => {
                res.header(content_type_header("application/json"));
                res.body_vec(bytes);
            }
            Err(err) => {
                error!(error = %err, "Failed to serialize JSON response body");
                let (status, reason) = wire_status(500);
                res.status_code(usize::from(status), reason);
            }
        },
        ResponseBody::Bytes { content_type, data } => {
            res.header(content_type_header(content_type));
            res.body_vec(data);
        }
    }
}
