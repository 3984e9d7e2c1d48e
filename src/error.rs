//! Error types for route registration, route matching and the dispatch pipeline.
//!
//! Registration problems ([`RouteError`]) are fatal at start-up and surface to the
//! caller of `add`/`register`. A failed lookup ([`MatchError`]) is routine and is
//! routed to the 404 error path. [`HandlerError`] is what hooks and handlers return:
//! either an explicit [`abort`] carrying a status code, or any other fault, which
//! the dispatcher turns into a 500.

use http::Method;
use std::fmt;
use thiserror::Error;

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The pattern string could not be classified into segments, or a wildcard
    /// segment is followed by further segments.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The exact method + pattern already has a terminal handler.
    #[error("route `{method} {pattern}` is already registered")]
    DuplicateRoute { method: Method, pattern: String },
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// A failed lookup in the route trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    /// No path through the trie reaches a terminal handler for every input segment.
    #[error("no route matches the request")]
    NotFound,
}

/// Outcome of a hook or handler that did not produce a response.
///
/// Any error convertible into [`anyhow::Error`] converts into
/// [`HandlerError::Fault`], so handlers can use `?` freely.
#[derive(Debug)]
pub enum HandlerError {
    /// Explicit short-circuit to the error handler registered for this status.
    Abort(u16),
    /// Any other failure. Reported to the client as a 500.
    Fault(anyhow::Error),
}

impl HandlerError {
    /// Status code the dispatcher routes this error to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            HandlerError::Abort(code) => *code,
            HandlerError::Fault(_) => 500,
        }
    }

    #[must_use]
    pub fn is_abort(&self) -> bool {
        matches!(self, HandlerError::Abort(_))
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Abort(code) => write!(f, "aborted with status {code}"),
            HandlerError::Fault(err) => write!(f, "handler fault: {err:#}"),
        }
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        HandlerError::Fault(err.into())
    }
}

/// Short-circuit the current request to the error handler for `status`.
///
/// ```
/// use bframe::{abort, HandlerResult, RequestContext};
///
/// fn admin(ctx: &mut RequestContext) -> HandlerResult {
///     if ctx.get("user").map_or(true, |u| u.is_null()) {
///         return abort(401);
///     }
///     Ok("welcome".into())
/// }
/// ```
pub fn abort<T>(status: u16) -> Result<T, HandlerError> {
    Err(HandlerError::Abort(status))
}
