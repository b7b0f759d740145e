//! Return statement compilation.

use atypical_core::CompilationError;
use atypical_parser::ast::ReturnStmt;

use super::{Result, StmtCompiler};
use crate::bytecode::Opcode;

impl<'a, 'ctx> StmtCompiler<'a, 'ctx> {
    /// Compile a return statement.
    ///
    /// Void methods return without a value; every other method returns a
    /// value its return type accepts, with the kind-specific return opcode.
    pub fn compile_return(&mut self, ret: &ReturnStmt<'_>) -> Result<()> {
        match (ret.value, self.return_type.is_void()) {
            (Some(expr), false) => {
                let value = self.expr_compiler().compile_value(expr)?;
                if !self.return_type.accepts(&value.ty) {
                    return Err(CompilationError::mismatch(
                        expr.span(),
                        format!("cannot return '{}' from a method returning '{}'", value.ty, self.return_type),
                    ));
                }
                self.emitter.emit_return(&self.return_type);
                Ok(())
            }
            (None, true) => {
                self.emitter.emit(Opcode::Return);
                Ok(())
            }
            (Some(expr), true) => Err(CompilationError::mismatch(
                expr.span(),
                "cannot return a value from a void method",
            )),
            (None, false) => Err(CompilationError::mismatch(
                ret.span,
                format!("missing return value of type '{}'", self.return_type),
            )),
        }
    }
}
