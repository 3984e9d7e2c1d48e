//! # bframe
//!
//! **bframe** is a small web framework core: it maps an HTTP method and URL
//! path to a registered handler, extracts typed path parameters, runs ordered
//! before-hooks and routes failures to per-status error handlers. Serving is
//! done on the `may` coroutine runtime through `may_minihttp`.
//!
//! ## Architecture
//!
//! - **[`router`]** - route patterns and the method-keyed route trie
//! - **[`dispatcher`]** - registration and the per-request pipeline
//! - **[`hooks`]** - before-hooks and error handlers
//! - **[`context`]** - the request value and the per-request context
//! - **[`server`]** - the `may_minihttp` collaborator
//! - **[`static_files`]** - filesystem collaborator for the static route
//! - **[`config`]** / **[`logging`]** - YAML/env configuration and `tracing` setup
//! - **[`testing`]** - in-process test client
//!
//! ## Route patterns
//!
//! | Piece | Matches |
//! |---|---|
//! | `users` | exactly `users` |
//! | `<int:id>` | one segment of decimal digits |
//! | `<str:name>` | any one non-empty segment |
//! | `<*:path>` | every remaining segment (at least one), joined with `/`; last piece only |
//!
//! At each position literals are tried before `int`, `int` before `str` and
//! `str` before the wildcard. A failed alternative backtracks to the next one.
//!
//! ## Example
//!
//! ```rust
//! use bframe::testing::TestClient;
//! use bframe::{abort, Dispatcher, HandlerResponse};
//!
//! let app = Dispatcher::new();
//! app.add_before_handle(|ctx| {
//!     if let Some(user) = ctx.query("user").map(str::to_owned) {
//!         ctx.set("user", user);
//!     }
//!     Ok(())
//! });
//! app.get("/admin", |ctx| match ctx.get("user") {
//!     Some(user) => Ok(format!("welcome {}", user.as_str().unwrap_or_default()).into()),
//!     None => abort(401),
//! })
//! .unwrap();
//! app.add_error_handle(401, |_ctx| HandlerResponse::from("who are you?"));
//!
//! let client = TestClient::new(&app);
//! assert_eq!(client.get("/admin?user=ada").as_text(), Some("welcome ada"));
//! let resp = client.get("/admin");
//! assert_eq!((resp.status, resp.as_text()), (401, Some("who are you?")));
//! ```
//!
//! Serving the same dispatcher over HTTP:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! let app = Arc::new(bframe::Dispatcher::new());
//! app.get("/", |_ctx| Ok("hello world".into())).unwrap();
//! app.run("127.0.0.1", 7256).unwrap();
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod ids;
pub mod logging;
pub mod router;
pub mod server;
pub mod static_files;
pub mod testing;

pub use config::AppConfig;
pub use context::{Request, RequestContext};
pub use dispatcher::{
    Dispatcher, Handler, HandlerResponse, HandlerResult, Resource, ResponseBody, StaticServe,
};
pub use error::{abort, HandlerError, MatchError, RouteError};
pub use hooks::{BeforeHook, ErrorHandler, HookRegistry};
pub use ids::RequestId;
pub use router::{ParamKind, RouteMatch, RoutePattern, Router};
pub use static_files::StaticFiles;
