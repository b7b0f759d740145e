//! Statement AST nodes.

use crate::ast::Ident;
use crate::ast::expr::Expr;
use crate::ast::types::TypeExpr;
use atypical_core::Span;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// `expr;` (assignments included)
    Expr(ExprStmt<'ast>),
    /// `let name[: T] = init;`
    Let(LetStmt<'ast>),
    Return(ReturnStmt<'ast>),
    Block(Block<'ast>),
    If(&'ast IfStmt<'ast>),
    While(&'ast WhileStmt<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Expr(s) => s.span,
            Self::Let(s) => s.span,
            Self::Return(s) => s.span,
            Self::Block(s) => s.span,
            Self::If(s) => s.span,
            Self::While(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// A local variable declaration. The initializer is mandatory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetStmt<'ast> {
    pub name: Ident<'ast>,
    pub ty: Option<TypeExpr<'ast>>,
    pub init: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// `{ stmt* }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

/// `if (c) { .. } else ..`
///
/// An `else if` chain is an `else_branch` holding another [`Stmt::If`];
/// a final `else` holds a [`Stmt::Block`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_block: Block<'ast>,
    pub else_branch: Option<&'ast Stmt<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub body: Block<'ast>,
    pub span: Span,
}
