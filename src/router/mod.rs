//! # Router Module
//!
//! The router maps an `(HTTP method, path)` pair to a registered value and
//! extracts the path captures declared by the route pattern.
//!
//! ## Pattern syntax
//!
//! - literal segments are plain path components: `/users/list`
//! - `<int:name>` captures one all-digit segment
//! - `<str:name>` captures any one non-empty segment
//! - `<*:name>` captures every remaining segment (rejoined with `/`) and is
//!   only legal as the last segment
//!
//! ## Matching
//!
//! Patterns are stored in a segment trie whose first level is the HTTP method.
//! At each node the router prefers the most specific edge: literal, then
//! `int`, then `str`, then wildcard. A typed edge whose predicate rejects the
//! segment, or a branch that dead-ends deeper down, falls back to the next
//! alternative.
//!
//! ```rust
//! use bframe::router::Router;
//! use http::Method;
//!
//! let router = Router::new();
//! router.add(&Method::GET, "/users/<int:id>", "get_user").unwrap();
//! router.add(&Method::GET, "/users/<str:name>", "by_name").unwrap();
//!
//! let m = router.route(&Method::GET, "/users/42").unwrap();
//! assert_eq!(m.value, "get_user");
//! assert_eq!(m.get_param("id"), Some("42"));
//!
//! let m = router.route(&Method::GET, "/users/ada").unwrap();
//! assert_eq!(m.value, "by_name");
//! ```
//!
//! ## Concurrency
//!
//! `add` and `route` both take `&self`. Mutation is serialized by an exclusive
//! lock; registration is expected to finish before serving starts.

mod core;
mod pattern;
mod trie;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use pattern::{ParamKind, RoutePattern, Segment};
