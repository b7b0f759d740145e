//! Expression compiler.
//!
//! The [`ExprCompiler`] compiles AST expressions to instructions and reports
//! the static type and provenance of each result. Every form lives in its own
//! submodule as a free function taking the compiler.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = ExprCompiler::new(&mut ctx, &mut emitter);
//!
//! // Compile and get the type of the value left on the stack
//! let info = compiler.compile_value(&expr)?;
//! ```

mod assignment;
mod binary;
mod calls;
pub mod cast;
mod identifiers;
mod init_list;
mod literals;
mod member;
mod unary;

use atypical_core::{CompilationError, Span, Type};
use atypical_parser::ast::{Expr, Ident};

use crate::context::MethodContext;
use crate::emit::CodeEmitter;
use crate::expr_info::ExprInfo;

type Result<T> = std::result::Result<T, CompilationError>;

/// Compiles expressions of one method.
pub struct ExprCompiler<'a, 'ctx> {
    /// Method context with the structural index and local scope
    ctx: &'a mut MethodContext<'ctx>,
    /// Instruction output
    emitter: &'a mut CodeEmitter,
}

impl<'a, 'ctx> ExprCompiler<'a, 'ctx> {
    pub fn new(ctx: &'a mut MethodContext<'ctx>, emitter: &'a mut CodeEmitter) -> Self {
        Self { ctx, emitter }
    }

    /// Compile an expression.
    ///
    /// The result may be void (a void call or an assignment) or a static
    /// type reference, neither of which leaves anything on the stack.
    pub fn compile(&mut self, expr: &Expr<'_>) -> Result<ExprInfo> {
        match expr {
            Expr::Literal(lit) => literals::compile_literal(self, &lit.kind),
            Expr::Ident(ident) => identifiers::compile_ident(self, ident),
            Expr::Binary(bin) => binary::compile_binary(self, bin),
            Expr::Unary(un) => unary::compile_unary(self, un),
            Expr::Assign(assign) => assignment::compile_assign(self, assign),
            Expr::Call(call) => calls::compile_call(self, call),
            Expr::Member(member) => member::compile_member(self, member),
            Expr::Index(index) => member::compile_index(self, index),
            Expr::Cast(cast) => cast::compile_cast(self, cast),
            Expr::New(new) => init_list::compile_new(self, new),
            Expr::ArrayInit(init) => init_list::compile_array_init(self, init),
            Expr::Paren(p) => self.compile(p.expr),
        }
    }

    /// Compile an expression that must leave a value on the stack.
    pub fn compile_value(&mut self, expr: &Expr<'_>) -> Result<ExprInfo> {
        let info = self.compile(expr)?;
        if let Some(target) = info.ty.static_target() {
            return Err(CompilationError::mismatch(
                expr.span(),
                format!("type '{target}' used as a value"),
            ));
        }
        if info.ty.is_void() {
            return Err(CompilationError::mismatch(
                expr.span(),
                "expression has no value",
            ));
        }
        Ok(info)
    }

    /// Compile call arguments left to right, returning their types.
    pub fn compile_args(&mut self, args: &[&Expr<'_>]) -> Result<Vec<Type>> {
        args.iter()
            .map(|arg| self.compile_value(arg).map(|info| info.ty))
            .collect()
    }

    /// Whether a bare name refers to a value (local, `this` or field)
    /// rather than possibly a type.
    pub(crate) fn is_value_name(&self, ident: &Ident<'_>) -> bool {
        self.ctx.scope.lookup(ident.name).is_some()
            || ident.name == "this"
            || self
                .ctx
                .index
                .find_field(&self.ctx.field_scope().name, ident.name)
                .is_some()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn ctx(&self) -> &MethodContext<'ctx> {
        self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut MethodContext<'ctx> {
        self.ctx
    }

    pub fn emitter(&mut self) -> &mut CodeEmitter {
        self.emitter
    }
}

/// Require `actual` to be a boolean.
pub(crate) fn expect_bool(actual: &Type, what: &str, span: Span) -> Result<()> {
    if *actual == Type::Boolean {
        Ok(())
    } else {
        Err(CompilationError::mismatch(
            span,
            format!("{what} must be bool, found '{actual}'"),
        ))
    }
}

/// Int, short, byte or char: valid as an array index or length.
pub(crate) fn is_int_like(ty: &Type) -> bool {
    matches!(ty, Type::Int | Type::Short | Type::Byte | Type::Char)
}
