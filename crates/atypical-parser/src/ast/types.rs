//! Type expressions as written in source.

use crate::ast::Path;
use atypical_core::Span;
use std::fmt;

/// A type annotation: a path followed by zero or more `[]`.
///
/// Examples: `int`, `geo.Point`, `string[][]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeExpr<'ast> {
    pub path: Path<'ast>,
    pub array_dims: u32,
    pub span: Span,
}

impl TypeExpr<'_> {
    pub fn is_array(&self) -> bool {
        self.array_dims > 0
    }
}

impl fmt::Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}
