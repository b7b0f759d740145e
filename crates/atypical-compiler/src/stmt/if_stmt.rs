//! If/else statement compilation.

use atypical_parser::ast::IfStmt;

use super::{Result, StmtCompiler};
use crate::bytecode::Opcode;
use crate::expr::expect_bool;
use crate::return_checker::always_returns;

impl<'a, 'ctx> StmtCompiler<'a, 'ctx> {
    /// Compile an if statement.
    ///
    /// ```text
    ///     [condition]
    ///     IFEQ else
    ///     [then]
    ///     GOTO end      ; only with an else branch the then block can leave
    /// else:
    ///     [else]
    /// end:
    /// ```
    pub fn compile_if(&mut self, if_stmt: &IfStmt<'_>) -> Result<()> {
        let cond = self.expr_compiler().compile_value(if_stmt.condition)?;
        expect_bool(&cond.ty, "if condition", if_stmt.condition.span())?;

        let else_label = self.emitter.new_label();
        self.emitter.jump(Opcode::Ifeq, else_label);
        self.compile_block(&if_stmt.then_block)?;

        match if_stmt.else_branch {
            Some(else_branch) => {
                let end = (!always_returns(&if_stmt.then_block)).then(|| {
                    let end = self.emitter.new_label();
                    self.emitter.jump(Opcode::Goto, end);
                    end
                });
                self.emitter.place_label(else_label);
                self.compile(else_branch)?;
                if let Some(end) = end {
                    self.emitter.place_label(end);
                }
            }
            None => self.emitter.place_label(else_label),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use atypical_core::CompilationError;

    use crate::bytecode::Opcode;
    use crate::test_support::{compile_err, compile_ok, ops};

    #[test]
    fn if_without_else() {
        let classes = compile_ok("fn f(x: bool): int { if (x) { return 1; } return 0; }");
        assert_eq!(
            ops(&classes, "main", "f"),
            vec![
                Opcode::Iload,
                Opcode::Ifeq,
                Opcode::Iconst1,
                Opcode::Ireturn,
                Opcode::Iconst0,
                Opcode::Ireturn
            ]
        );
    }

    #[test]
    fn returning_then_branch_skips_goto() {
        let classes = compile_ok(
            "fn f(x: bool): int { if (x) { return 1; } else { return 2; } }",
        );
        assert!(!ops(&classes, "main", "f").contains(&Opcode::Goto));
    }

    #[test]
    fn else_if_chains() {
        let classes = compile_ok(
            "fn f(x: int): int {\n\
               let r = 0;\n\
               if (x == 1) { r = 10; } else if (x == 2) { r = 20; } else { r = 30; }\n\
               return r;\n\
             }",
        );
        let ops = ops(&classes, "main", "f");
        assert_eq!(ops.iter().filter(|op| **op == Opcode::Ifeq).count(), 2);
        assert_eq!(ops.last(), Some(&Opcode::Ireturn));
    }

    #[test]
    fn condition_must_be_bool() {
        let err = compile_err("fn f(x: int): void { if (x) { } }");
        assert!(matches!(err.as_compilation(), Some(CompilationError::TypeMismatch { .. })));
    }
}
