//! Segment trie used by [`Router`](super::Router).
//!
//! Every edge is one path segment. A node owns:
//! - literal children keyed by their exact text,
//! - at most one typed child per [`ParamKind`],
//! - at most one wildcard leaf (terminal, no children),
//! - an optional terminal leaf for patterns ending at this node.
//!
//! Capture names are stored on the leaves rather than on the edges, so two
//! patterns that put differently named captures of the same kind at the same
//! depth (`/users/<int:id>` and `/users/<int:uid>/posts`) share one edge and
//! still report their own names.
//!
//! Lookup tries literal, then `int`, then `str`, then wildcard at every node and
//! backtracks when a branch dead-ends, so a failed typed match falls through to
//! its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use super::pattern::{ParamKind, Segment};

/// Terminal payload of a registered pattern.
pub(crate) struct Leaf<T> {
    pub(crate) value: T,
    /// Capture names, one per typed/wildcard segment, in pattern order.
    pub(crate) names: Box<[Arc<str>]>,
}

/// The slot a pattern wanted to claim is already taken.
#[derive(Debug)]
pub(crate) struct Occupied;

pub(crate) struct TrieNode<T> {
    literals: HashMap<Box<str>, TrieNode<T>>,
    int_child: Option<Box<TrieNode<T>>>,
    str_child: Option<Box<TrieNode<T>>>,
    wildcard: Option<Leaf<T>>,
    leaf: Option<Leaf<T>>,
}

impl<T> TrieNode<T> {
    pub(crate) fn new() -> Self {
        Self {
            literals: HashMap::new(),
            int_child: None,
            str_child: None,
            wildcard: None,
            leaf: None,
        }
    }

    /// Walk/create nodes for `segments` and store `value` at the end.
    ///
    /// The caller guarantees that a wildcard, if present, is the last segment.
    pub(crate) fn insert(
        &mut self,
        segments: &[Segment],
        names: Box<[Arc<str>]>,
        value: T,
    ) -> Result<(), Occupied> {
        let mut node = self;
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node
                    .literals
                    .entry(text.clone())
                    .or_insert_with(TrieNode::new),
                Segment::Typed {
                    kind: ParamKind::Int,
                    ..
                } => &mut **node
                    .int_child
                    .get_or_insert_with(|| Box::new(TrieNode::new())),
                Segment::Typed {
                    kind: ParamKind::Str,
                    ..
                } => &mut **node
                    .str_child
                    .get_or_insert_with(|| Box::new(TrieNode::new())),
                Segment::Wildcard { .. } => {
                    if node.wildcard.is_some() {
                        return Err(Occupied);
                    }
                    node.wildcard = Some(Leaf { value, names });
                    return Ok(());
                }
            };
        }

        if node.leaf.is_some() {
            return Err(Occupied);
        }
        node.leaf = Some(Leaf { value, names });
        Ok(())
    }

    /// Find the leaf matching all of `segments`, pushing one capture per
    /// typed/wildcard edge taken. On `None`, `captures` is left as it was.
    pub(crate) fn search(
        &self,
        segments: &[&str],
        captures: &mut Vec<String>,
    ) -> Option<&Leaf<T>> {
        let Some((&head, rest)) = segments.split_first() else {
            return self.leaf.as_ref();
        };

        if let Some(child) = self.literals.get(head) {
            if let Some(leaf) = child.search(rest, captures) {
                return Some(leaf);
            }
        }

        let typed = [
            (ParamKind::Int, self.int_child.as_deref()),
            (ParamKind::Str, self.str_child.as_deref()),
        ];
        for (kind, child) in typed {
            let Some(child) = child else { continue };
            if !kind.accepts(head) {
                continue;
            }
            captures.push(head.to_string());
            if let Some(leaf) = child.search(rest, captures) {
                return Some(leaf);
            }
            captures.pop();
        }

        if let Some(leaf) = &self.wildcard {
            captures.push(segments.join("/"));
            return Some(leaf);
        }

        None
    }
}
