//! # Dispatcher Module
//!
//! The dispatcher owns the route table and the hook registry and runs every
//! request through the same pipeline:
//!
//! 1. **Match** the method and path against the route trie. No match goes
//!    straight to error handling with status 404.
//! 2. **Before-hooks** run in registration order. A hook returning
//!    [`abort`](crate::abort) skips the rest of the pipeline.
//! 3. **Handler** runs with the captured params and the request context.
//! 4. **Error handling** looks up the handler registered for the status code,
//!    at most once per request. Without one the response carries just the
//!    status.
//!
//! Panics in hooks, handlers and error handlers are caught at this boundary
//! and become 500s; a request always ends with a response.
//!
//! ## Registration
//!
//! ```rust
//! use bframe::{abort, Dispatcher, HandlerResponse, Request};
//! use http::Method;
//!
//! let app = Dispatcher::new();
//! app.get("/", |_ctx| Ok("hello world".into())).unwrap();
//! app.get("/users/<int:id>", |ctx| {
//!     Ok(format!("user {}", ctx.param("id").unwrap_or_default()).into())
//! })
//! .unwrap();
//! app.get("/admin", |_ctx| abort(401)).unwrap();
//! app.add_error_handle(401, |_ctx| HandlerResponse::from("please log in"));
//!
//! let resp = app.dispatch(Request::new(Method::GET, "/users/7"));
//! assert_eq!(resp.as_text(), Some("user 7"));
//!
//! let resp = app.dispatch(Request::new(Method::GET, "/admin"));
//! assert_eq!(resp.status, 401);
//! ```
//!
//! ## Static files
//!
//! On first dispatch a `GET <prefix>/<*:path>` route is installed, exactly
//! once, forwarding the captured path to the configured [`StaticServe`]
//! collaborator.

mod core;
mod handler;

pub use core::Dispatcher;
pub use handler::{
    Handler, HandlerResponse, HandlerResult, Resource, ResponseBody, StaticServe, STATIC_CAPTURE,
};
