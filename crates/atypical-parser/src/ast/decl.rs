//! Declaration AST nodes: imports, modules, structs, traits, impls and
//! global functions.

use crate::ast::stmt::Block;
use crate::ast::types::TypeExpr;
use crate::ast::{Ident, Path};
use atypical_core::Span;

/// A top-level item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'ast> {
    /// `import a.b.C [as X];`
    Import(ImportDecl<'ast>),
    /// `module p.M { struct {..} impl {..} }`
    Module(&'ast ModuleDecl<'ast>),
    /// `struct p.S { .. }`
    Struct(&'ast StructDecl<'ast>),
    /// `trait p.T { fn ..; }`
    Trait(&'ast TraitDecl<'ast>),
    /// `impl T for S { .. }`
    Impl(&'ast ImplDecl<'ast>),
    /// Global function
    Function(&'ast FunctionDecl<'ast>),
}

impl<'ast> Item<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Import(d) => d.span,
            Self::Module(d) => d.span,
            Self::Struct(d) => d.span,
            Self::Trait(d) => d.span,
            Self::Impl(d) => d.span,
            Self::Function(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportDecl<'ast> {
    pub path: Path<'ast>,
    pub alias: Option<Ident<'ast>>,
    pub span: Span,
}

impl<'ast> ImportDecl<'ast> {
    /// The name the import binds: the alias, or the last path segment.
    pub fn local_name(&self) -> Ident<'ast> {
        self.alias.unwrap_or_else(|| self.path.last())
    }
}

/// A module: a struct-like type with its own fields and instance methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleDecl<'ast> {
    pub name: Path<'ast>,
    pub fields: &'ast [Field<'ast>],
    pub methods: &'ast [FunctionDecl<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructDecl<'ast> {
    pub name: Path<'ast>,
    pub fields: &'ast [Field<'ast>],
    pub span: Span,
}

/// `name: T;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field<'ast> {
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitDecl<'ast> {
    pub name: Path<'ast>,
    pub methods: &'ast [FunctionSig<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplDecl<'ast> {
    pub trait_ty: TypeExpr<'ast>,
    pub target: TypeExpr<'ast>,
    pub methods: &'ast [FunctionDecl<'ast>],
    pub span: Span,
}

/// `fn name(a: T, ..): R`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionSig<'ast> {
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    /// `None` means void.
    pub return_ty: Option<TypeExpr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

/// A function with a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub sig: FunctionSig<'ast>,
    pub body: Block<'ast>,
    pub span: Span,
}
