//! Basic AST building blocks shared by declarations, statements and expressions.

use atypical_core::Span;
use std::fmt;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    #[inline]
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A dotted path such as `geo.shapes.Circle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Path<'ast> {
    pub segments: &'ast [Ident<'ast>],
    pub span: Span,
}

impl<'ast> Path<'ast> {
    /// The last segment (`Circle` in `geo.shapes.Circle`).
    ///
    /// Paths always have at least one segment.
    pub fn last(&self) -> Ident<'ast> {
        self.segments[self.segments.len() - 1]
    }

    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1
    }

    /// Segments joined with `.`, as written.
    pub fn dotted(&self) -> String {
        let parts: Vec<&str> = self.segments.iter().map(|s| s.name).collect();
        parts.join(".")
    }

    /// Segments joined with `/`, the internal-name form.
    pub fn qualified(&self) -> String {
        let parts: Vec<&str> = self.segments.iter().map(|s| s.name).collect();
        parts.join("/")
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}
