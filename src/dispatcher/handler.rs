//! Handler-side types: what a route runs and what it returns.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::{abort, HandlerError};

/// What every handler returns.
pub type HandlerResult = Result<HandlerResponse, HandlerError>;

/// Body of a [`HandlerResponse`]. Serialization onto the wire belongs to the
/// server collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Empty,
    Text(String),
    Json(Value),
    Bytes {
        #[serde(skip)]
        content_type: &'static str,
        data: Vec<u8>,
    },
}

/// Response produced by a handler or an error handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    pub body: ResponseBody,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self { status, body }
    }

    /// The minimal response: a status code and nothing else.
    #[must_use]
    pub fn status_only(status: u16) -> Self {
        Self::new(status, ResponseBody::Empty)
    }

    #[must_use]
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self::new(status, ResponseBody::Text(text.into()))
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    #[must_use]
    pub fn bytes(status: u16, content_type: &'static str, data: Vec<u8>) -> Self {
        Self::new(status, ResponseBody::Bytes { content_type, data })
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Text body, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// JSON body, if any.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for HandlerResponse {
    fn from(text: &str) -> Self {
        Self::text(200, text)
    }
}

impl From<String> for HandlerResponse {
    fn from(text: String) -> Self {
        Self::text(200, text)
    }
}

impl From<Value> for HandlerResponse {
    fn from(body: Value) -> Self {
        Self::json(200, body)
    }
}

/// A routed request handler.
///
/// Implemented for every `Fn(&mut RequestContext) -> HandlerResult`, so plain
/// functions can be registered directly:
///
/// ```
/// use bframe::{HandlerResult, RequestContext};
///
/// fn index(_ctx: &mut RequestContext) -> HandlerResult {
///     Ok("hello world".into())
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// # Errors
    ///
    /// `Err(HandlerError::Abort(code))` routes to the error handler for `code`;
    /// any other error becomes a 500.
    fn call(&self, ctx: &mut RequestContext) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, ctx: &mut RequestContext) -> HandlerResult {
        self(ctx)
    }
}

/// A handler object serving several HTTP methods on one path.
///
/// `methods` is the declared capability list, read once at registration:
/// one route is registered per listed method.
pub trait Resource: Send + Sync + 'static {
    fn methods(&self) -> Vec<Method>;

    /// # Errors
    ///
    /// Same contract as [`Handler::call`].
    fn handle(&self, method: &Method, ctx: &mut RequestContext) -> HandlerResult;
}

/// One declared method of a [`Resource`], bound to the shared object.
pub(crate) struct ResourceMethod {
    pub(crate) resource: Arc<dyn Resource>,
    pub(crate) method: Method,
}

impl Handler for ResourceMethod {
    fn call(&self, ctx: &mut RequestContext) -> HandlerResult {
        self.resource.handle(&self.method, ctx)
    }
}

/// Serves the path captured by the static catch-all route.
pub trait StaticServe: Send + Sync + 'static {
    /// # Errors
    ///
    /// Typically `Abort(404)` for a missing file.
    fn serve(&self, path: &str, ctx: &RequestContext) -> HandlerResult;
}

/// Name of the wildcard capture used by the static route.
pub const STATIC_CAPTURE: &str = "path";

/// Handler behind the static catch-all route.
pub(crate) struct StaticHandler {
    pub(crate) server: Option<Arc<dyn StaticServe>>,
}

impl Handler for StaticHandler {
    fn call(&self, ctx: &mut RequestContext) -> HandlerResult {
        let (Some(server), Some(path)) = (&self.server, ctx.param(STATIC_CAPTURE)) else {
            return abort(404);
        };
        server.serve(path, ctx)
    }
}
