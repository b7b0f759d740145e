//! Block statement compilation.

use atypical_parser::ast::Block;

use super::{Result, StmtCompiler};

impl<'a, 'ctx> StmtCompiler<'a, 'ctx> {
    /// Compile a block statement.
    ///
    /// Variables declared in the block are only visible within it. Their
    /// slots stay reserved after the block ends.
    pub fn compile_block(&mut self, block: &Block<'_>) -> Result<()> {
        self.ctx.scope.push_scope();
        let result = self.compile_body(block.stmts);
        self.ctx.scope.pop_scope();
        result
    }
}
