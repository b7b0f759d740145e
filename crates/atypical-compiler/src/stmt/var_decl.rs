//! `let` declarations.

use atypical_core::CompilationError;
use atypical_parser::ast::LetStmt;

use super::{Result, StmtCompiler};

impl<'a, 'ctx> StmtCompiler<'a, 'ctx> {
    /// Compile `let name[: T] = init;`.
    ///
    /// Without an annotation the variable takes the initializer's type, so
    /// a bare `null` needs one. The variable is declared after its
    /// initializer is compiled and cannot refer to itself.
    pub fn compile_let(&mut self, decl: &LetStmt<'_>) -> Result<()> {
        let declared = decl
            .ty
            .as_ref()
            .map(|ty| self.ctx.resolve_known(ty))
            .transpose()?;
        let init = self.expr_compiler().compile_value(decl.init)?;

        let ty = match declared {
            Some(ty) => {
                if !ty.accepts(&init.ty) {
                    return Err(CompilationError::mismatch(
                        decl.init.span(),
                        format!("cannot initialize '{}: {ty}' with '{}'", decl.name.name, init.ty),
                    ));
                }
                ty
            }
            None if init.ty.is_unknown() => {
                return Err(CompilationError::mismatch(
                    decl.span,
                    format!("cannot infer the type of '{}' from null", decl.name.name),
                ));
            }
            None => init.ty,
        };

        let slot = self.ctx.scope.declare(decl.name.name, ty.clone(), decl.name.span)?;
        self.emitter.store(&ty, slot);
        Ok(())
    }
}
