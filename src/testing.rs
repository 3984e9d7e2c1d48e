//! In-process test harness.
//!
//! [`TestClient`] builds [`Request`] values the same way the live server does
//! and runs them through [`Dispatcher::dispatch`] synchronously, with no
//! sockets involved.
//!
//! ```
//! use bframe::testing::TestClient;
//! use bframe::Dispatcher;
//!
//! let app = Dispatcher::new();
//! app.get("/", |_ctx| Ok("hello world".into())).unwrap();
//!
//! let client = TestClient::new(&app);
//! assert_eq!(client.get("/").as_text(), Some("hello world"));
//! assert_eq!(client.get("/nope").status, 404);
//! ```

use http::Method;

use crate::context::Request;
use crate::dispatcher::{Dispatcher, HandlerResponse};

pub struct TestClient<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> TestClient<'a> {
    #[must_use]
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Dispatch `method url` with `data` as form fields. `url` may carry a
    /// query string.
    pub fn handle<I, K, V>(&self, method: Method, url: &str, data: I) -> HandlerResponse
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.send(Request::new(method, url).with_form(data))
    }

    /// Dispatch a fully built request, e.g. one carrying headers.
    pub fn send(&self, request: Request) -> HandlerResponse {
        self.dispatcher.dispatch(request)
    }

    pub fn get(&self, url: &str) -> HandlerResponse {
        self.send(Request::new(Method::GET, url))
    }

    pub fn post<I, K, V>(&self, url: &str, data: I) -> HandlerResponse
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.handle(Method::POST, url, data)
    }

    pub fn put<I, K, V>(&self, url: &str, data: I) -> HandlerResponse
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.handle(Method::PUT, url, data)
    }

    pub fn delete(&self, url: &str) -> HandlerResponse {
        self.send(Request::new(Method::DELETE, url))
    }
}
