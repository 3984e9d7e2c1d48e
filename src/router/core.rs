//! Router core - the locked route trie and match results.

use http::Method;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::pattern::{RoutePattern, Segment};
use super::trie::{Occupied, TrieNode};
use crate::error::{MatchError, RouteError};

/// Maximum number of captures kept inline before spilling to the heap.
/// Most routes have ≤4 captures (e.g. `/users/<int:id>/posts/<int:post>`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered captured parameters, `(name, value)`.
///
/// Param names use `Arc<str>` because they come from the route table (known at
/// registration) and are shared by every match of that route.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch<T> {
    /// Value registered for the route.
    pub value: T,
    /// Captures in pattern order (`<int:id>` → `("id", "42")`).
    pub params: ParamVec,
}

impl<T> RouteMatch<T> {
    /// Get a captured parameter by name.
    ///
    /// Uses "last write wins" semantics when a pattern reuses a capture name.
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert params to a `HashMap`.
    /// Note: This allocates - use `get_param()` in hot paths instead
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

struct RouteTable<T> {
    root: TrieNode<T>,
    /// Registered `(method, canonical pattern)` pairs in registration order.
    registered: Vec<(Method, String)>,
}

/// Route trie keyed by HTTP method and path segments.
///
/// The method is stored as a synthetic leading literal segment, so a single
/// trie serves every method. Structural mutation goes through an exclusive
/// lock; lookups take the shared side of the same lock, so `add` can never
/// corrupt a node under an in-flight `route`. Nothing guarantees that a lookup
/// observes a route added concurrently with it: register everything before
/// serving.
pub struct Router<T> {
    table: RwLock<RouteTable<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(RouteTable {
                root: TrieNode::new(),
                registered: Vec::new(),
            }),
        }
    }

    /// Register `value` for `method` + `pattern`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidPattern`] if the pattern is malformed or a wildcard
    ///   is not its last segment.
    /// - [`RouteError::DuplicateRoute`] if the same method + pattern shape is
    ///   already registered. Nothing is overwritten.
    pub fn add(&self, method: &Method, pattern: &str, value: T) -> Result<(), RouteError> {
        self.add_pattern(method, &RoutePattern::parse(pattern)?, value)
    }

    /// [`Router::add`] for a pattern that is already parsed.
    ///
    /// # Errors
    ///
    /// [`RouteError::DuplicateRoute`] if the same method + pattern shape is
    /// already registered.
    pub fn add_pattern(
        &self,
        method: &Method,
        parsed: &RoutePattern,
        value: T,
    ) -> Result<(), RouteError> {
        let mut segments = Vec::with_capacity(parsed.segments().len() + 1);
        segments.push(Segment::Literal(method.as_str().into()));
        segments.extend_from_slice(parsed.segments());
        let names = parsed.capture_names().into_boxed_slice();
        let canonical = parsed.to_string();

        let mut table = self.table.write();
        match table.root.insert(&segments, names, value) {
            Ok(()) => {
                debug!(method = %method, pattern = %canonical, "Route added");
                table.registered.push((method.clone(), canonical));
                Ok(())
            }
            Err(Occupied) => Err(RouteError::DuplicateRoute {
                method: method.clone(),
                pattern: canonical,
            }),
        }
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().registered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered `(method, pattern)` pairs in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.table.read().registered.clone()
    }

    /// Log the routing table, ten routes at most in the summary.
    pub fn log_routes(&self) {
        let table = self.table.read();
        let routes_summary: Vec<String> = table
            .registered
            .iter()
            .take(10)
            .map(|(method, pattern)| format!("{method} {pattern}"))
            .collect();
        info!(
            routes_count = table.registered.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );
    }
}

impl<T: Clone> Router<T> {
    /// Resolve `method` + `path` to a registered value and its captures.
    ///
    /// At every node literal edges are tried first, then `int`, then `str`,
    /// then the wildcard; dead ends backtrack to the next alternative.
    ///
    /// # Errors
    ///
    /// [`MatchError::NotFound`] when no registered pattern matches every segment.
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch<T>, MatchError> {
        let mut segments: SmallVec<[&str; 16]> = SmallVec::new();
        segments.push(method.as_str());
        segments.extend(path.split('/').filter(|s| !s.is_empty()));

        let mut captures = Vec::new();
        let table = self.table.read();
        let leaf = table
            .root
            .search(&segments, &mut captures)
            .ok_or(MatchError::NotFound)?;

        let params = leaf
            .names
            .iter()
            .cloned()
            .zip(captures)
            .collect::<ParamVec>();

        Ok(RouteMatch {
            value: leaf.value.clone(),
            params,
        })
    }
}
