//! Statement compiler.
//!
//! The [`StmtCompiler`] compiles AST statements to instructions:
//! - Block statements with their own scope
//! - `let` declarations, typed or inferred from the initializer
//! - Return statements checked against the method's return type
//! - If/else and while control flow
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = StmtCompiler::new(&mut ctx, &mut emitter, return_type);
//!
//! // Compile a statement
//! compiler.compile(&stmt)?;
//! ```

mod block;
mod if_stmt;
mod return_stmt;
mod var_decl;
mod while_stmt;

use atypical_core::{CompilationError, Type};
use atypical_parser::ast::{ExprStmt, Stmt};

use crate::context::MethodContext;
use crate::emit::CodeEmitter;
use crate::expr::ExprCompiler;

type Result<T> = std::result::Result<T, CompilationError>;

/// Compiles statements of one method body.
pub struct StmtCompiler<'a, 'ctx> {
    /// Method context with the structural index and local scope
    ctx: &'a mut MethodContext<'ctx>,
    /// Instruction output
    emitter: &'a mut CodeEmitter,
    /// Declared return type of the method being compiled
    return_type: Type,
}

impl<'a, 'ctx> StmtCompiler<'a, 'ctx> {
    pub fn new(ctx: &'a mut MethodContext<'ctx>, emitter: &'a mut CodeEmitter, return_type: Type) -> Self {
        Self {
            ctx,
            emitter,
            return_type,
        }
    }

    /// Compile a statement.
    pub fn compile(&mut self, stmt: &Stmt<'_>) -> Result<()> {
        self.emitter.set_line(stmt.span().line);

        match stmt {
            Stmt::Expr(expr_stmt) => self.compile_expr_stmt(expr_stmt),
            Stmt::Let(let_stmt) => self.compile_let(let_stmt),
            Stmt::Return(ret) => self.compile_return(ret),
            Stmt::Block(block) => self.compile_block(block),
            Stmt::If(if_stmt) => self.compile_if(if_stmt),
            Stmt::While(while_stmt) => self.compile_while(while_stmt),
        }
    }

    /// Compile the statements of a method body in the method's own scope.
    pub fn compile_body(&mut self, stmts: &[Stmt<'_>]) -> Result<()> {
        for stmt in stmts {
            self.compile(stmt)?;
        }
        Ok(())
    }

    /// Evaluate an expression for its side effects and drop its value.
    fn compile_expr_stmt(&mut self, expr_stmt: &ExprStmt<'_>) -> Result<()> {
        let info = self.expr_compiler().compile(expr_stmt.expr)?;
        if !info.is_static_type() {
            self.emitter.emit_pop(&info.ty);
        }
        Ok(())
    }

    fn expr_compiler(&mut self) -> ExprCompiler<'_, 'ctx> {
        ExprCompiler::new(self.ctx, self.emitter)
    }
}
