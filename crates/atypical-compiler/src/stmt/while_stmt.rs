//! While loop compilation.

use atypical_parser::ast::WhileStmt;

use super::{Result, StmtCompiler};
use crate::bytecode::Opcode;
use crate::expr::expect_bool;

impl<'a, 'ctx> StmtCompiler<'a, 'ctx> {
    /// Compile a while loop.
    ///
    /// ```text
    /// head:
    ///     [condition]
    ///     IFEQ exit
    ///     [body]
    ///     GOTO head
    /// exit:
    /// ```
    pub fn compile_while(&mut self, while_stmt: &WhileStmt<'_>) -> Result<()> {
        let head = self.emitter.new_label();
        let exit = self.emitter.new_label();

        self.emitter.place_label(head);
        let cond = self.expr_compiler().compile_value(while_stmt.condition)?;
        expect_bool(&cond.ty, "while condition", while_stmt.condition.span())?;
        self.emitter.jump(Opcode::Ifeq, exit);

        self.compile_block(&while_stmt.body)?;
        self.emitter.jump(Opcode::Goto, head);
        self.emitter.place_label(exit);
        Ok(())
    }
}
