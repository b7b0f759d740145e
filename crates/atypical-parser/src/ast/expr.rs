//! Expression AST nodes.
//!
//! # Expression Precedence
//!
//! Parsed with a Pratt parser, loosest first:
//! 1. Assignment (`=`), right associative
//! 2. Logical OR (`||`)
//! 3. Logical AND (`&&`)
//! 4. Equality (`==`, `!=`)
//! 5. Relational (`<`, `<=`, `>`, `>=`)
//! 6. Additive (`+`, `-`)
//! 7. Multiplicative (`*`, `/`, `%`)
//! 8. Prefix unary (`-`, `!`)
//! 9. Postfix (`.field`, `.method(..)`, `[index]`, call)

use crate::ast::types::TypeExpr;
use crate::ast::{BinaryOp, Ident, UnaryOp};
use atypical_core::Span;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr<'ast>),
    /// Bare name, including `this` and type names
    Ident(Ident<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Assign(&'ast AssignExpr<'ast>),
    /// Unqualified call `f(args)`
    Call(&'ast CallExpr<'ast>),
    /// `.field` or `.method(args)`
    Member(&'ast MemberExpr<'ast>),
    /// `a[i]`
    Index(&'ast IndexExpr<'ast>),
    /// `cast<T>(e)`
    Cast(&'ast CastExpr<'ast>),
    /// `new T(args)`
    New(&'ast NewExpr<'ast>),
    /// `[T][e0, e1, ...]`
    ArrayInit(&'ast ArrayInitExpr<'ast>),
    Paren(&'ast ParenExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Call(e) => e.span,
            Self::Member(e) => e.span,
            Self::Index(e) => e.span,
            Self::Cast(e) => e.span,
            Self::New(e) => e.span,
            Self::ArrayInit(e) => e.span,
            Self::Paren(e) => e.span,
        }
    }

    /// Strip any number of surrounding parentheses.
    pub fn unparenthesized(&self) -> &Expr<'ast> {
        match self {
            Self::Paren(p) => p.expr.unparenthesized(),
            other => other,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    /// Escapes already decoded.
    String(&'ast str),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    pub target: &'ast Expr<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: Ident<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub member: MemberAccess<'ast>,
    pub span: Span,
}

/// What follows the `.` of a member expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberAccess<'ast> {
    Field(Ident<'ast>),
    Method {
        name: Ident<'ast>,
        args: &'ast [&'ast Expr<'ast>],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub index: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub target: TypeExpr<'ast>,
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewExpr<'ast> {
    pub ty: TypeExpr<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayInitExpr<'ast> {
    pub element_ty: TypeExpr<'ast>,
    pub elements: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}
