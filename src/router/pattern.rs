//! Route pattern parsing.
//!
//! A pattern such as `/users/<int:id>/files/<*:rest>` is split on `/` (empty
//! pieces are ignored) and every piece is classified:
//!
//! | Piece          | Segment                          |
//! |----------------|----------------------------------|
//! | `users`        | [`Segment::Literal`]             |
//! | `<int:id>`     | [`Segment::Typed`] (`int`)       |
//! | `<str:name>`   | [`Segment::Typed`] (`str`)       |
//! | `<*:rest>`     | [`Segment::Wildcard`]            |
//!
//! Only the last segment may be a wildcard.

use std::fmt;
use std::sync::Arc;

use crate::error::RouteError;

/// Kind of a typed capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// One segment made only of ASCII decimal digits.
    Int,
    /// Any single non-empty segment.
    Str,
}

impl ParamKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "int" => Some(ParamKind::Int),
            "str" => Some(ParamKind::Str),
            _ => None,
        }
    }

    /// Whether `segment` satisfies this kind.
    #[inline]
    #[must_use]
    pub fn accepts(self, segment: &str) -> bool {
        match self {
            ParamKind::Int => !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()),
            ParamKind::Str => !segment.is_empty(),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamKind::Int => "int",
            ParamKind::Str => "str",
        })
    }
}

/// One piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(Box<str>),
    Typed { name: Arc<str>, kind: ParamKind },
    /// Consumes every remaining path segment; terminal.
    Wildcard { name: Arc<str> },
}

impl Segment {
    fn parse(pattern: &str, piece: &str) -> Result<Self, RouteError> {
        let Some(inner) = piece.strip_prefix('<') else {
            if piece.contains(['<', '>']) {
                return Err(RouteError::invalid(
                    pattern,
                    format!("segment `{piece}` mixes literal text and a capture"),
                ));
            }
            return Ok(Segment::Literal(piece.into()));
        };
        let inner = inner.strip_suffix('>').ok_or_else(|| {
            RouteError::invalid(pattern, format!("unterminated capture `{piece}`"))
        })?;
        let (kind, name) = inner.split_once(':').ok_or_else(|| {
            RouteError::invalid(
                pattern,
                format!("capture `{piece}` must be written as <kind:name>"),
            )
        })?;
        if name.is_empty() {
            return Err(RouteError::invalid(
                pattern,
                format!("capture `{piece}` has no name"),
            ));
        }
        if kind == "*" {
            return Ok(Segment::Wildcard { name: name.into() });
        }
        let kind = ParamKind::parse(kind).ok_or_else(|| {
            RouteError::invalid(pattern, format!("unknown capture kind `{kind}`"))
        })?;
        Ok(Segment::Typed {
            name: name.into(),
            kind,
        })
    }

    /// Capture name for typed and wildcard segments.
    #[must_use]
    pub fn capture_name(&self) -> Option<&Arc<str>> {
        match self {
            Segment::Literal(_) => None,
            Segment::Typed { name, .. } | Segment::Wildcard { name } => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Typed { name, kind } => write!(f, "<{kind}:{name}>"),
            Segment::Wildcard { name } => write!(f, "<*:{name}>"),
        }
    }
}

/// A parsed, validated route pattern (without the method).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse and validate a pattern string.
    ///
    /// # Errors
    ///
    /// [`RouteError::InvalidPattern`] when a piece is malformed, uses an
    /// unknown kind, or when a wildcard is not the last segment.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let segments = pattern
            .split('/')
            .filter(|piece| !piece.is_empty())
            .map(|piece| Segment::parse(pattern, piece))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(pos) = segments
            .iter()
            .position(|s| matches!(s, Segment::Wildcard { .. }))
        {
            if pos + 1 != segments.len() {
                return Err(RouteError::invalid(
                    pattern,
                    format!("wildcard `{}` must be the last segment", segments[pos]),
                ));
            }
        }

        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Capture names in pattern order.
    #[must_use]
    pub fn capture_names(&self) -> Vec<Arc<str>> {
        self.segments
            .iter()
            .filter_map(Segment::capture_name)
            .cloned()
            .collect()
    }
}

/// Canonical `/a/<int:b>` form; the empty pattern renders as `/`.
impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
