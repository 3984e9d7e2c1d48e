//! may_minihttp collaborator: turns raw HTTP requests into [`Request`](crate::Request)
//! values for the dispatcher and writes [`HandlerResponse`](crate::HandlerResponse)s
//! back onto the wire.

pub mod listener;
pub mod request;
pub mod response;
pub mod service;

pub use listener::Listener;
pub use request::parse_request;
pub use service::AppService;
