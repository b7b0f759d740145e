//! Return path verification for non-void methods.
//!
//! A statement list always returns when its last effective statement is a
//! `return`, an `if` with an `else` whose branches both always return, or a
//! nested block that always returns. Loops are never assumed to return, so
//! `while (true) { return 1; }` still needs a trailing `return`.
//!
//! # Example
//!
//! ```ignore
//! if !return_type.is_void() && !always_returns(&decl.body) {
//!     // Error: not every path returns a value
//! }
//! ```

use atypical_parser::ast::{Block, Stmt};

/// Whether every path through `block` ends in a `return`.
pub fn always_returns(block: &Block<'_>) -> bool {
    block.stmts.iter().any(stmt_always_returns)
}

/// Whether every path through `stmt` ends in a `return`.
pub fn stmt_always_returns(stmt: &Stmt<'_>) -> bool {
    match stmt {
        Stmt::Return(_) => true,
        Stmt::Block(block) => always_returns(block),
        Stmt::If(if_stmt) => match if_stmt.else_branch {
            Some(else_branch) => {
                always_returns(&if_stmt.then_block) && stmt_always_returns(else_branch)
            }
            None => false,
        },
        Stmt::While(_) | Stmt::Let(_) | Stmt::Expr(_) => false,
    }
}
