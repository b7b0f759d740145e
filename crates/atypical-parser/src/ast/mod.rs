//! Abstract syntax tree for Atypical source files.
//!
//! Nodes borrow from a `bumpalo` arena and are `Copy`; the tree stays valid
//! for the lifetime of the arena.
//!
//! # Example
//!
//! ```
//! use atypical_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     import java.io.PrintStream;
//!
//!     struct geo.Point { x: int; y: int; }
//!
//!     fn sum(p: geo.Point): int {
//!         return p.x + p.y;
//!     }
//! "#;
//!
//! let file = Parser::parse(source, &arena).unwrap();
//! assert_eq!(file.items().len(), 3);
//! assert_eq!(file.aliases().resolve("PrintStream"), "java/io/PrintStream");
//! ```

pub mod node;
pub mod ops;

mod parser;
mod type_parser;
pub mod types;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub mod decl;
mod decl_parser;

pub use atypical_core::{ParseError, ParseErrorKind, ParseErrors};

pub use decl::*;
pub use expr::*;
pub use node::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;
pub use types::*;

use atypical_core::{AliasMap, Span};

/// A parsed source file: its items in declaration order plus the alias map
/// built from its imports.
#[derive(Debug)]
pub struct SourceFile<'ast> {
    items: &'ast [Item<'ast>],
    aliases: AliasMap,
    span: Span,
}

impl<'ast> SourceFile<'ast> {
    pub(crate) fn new(items: &'ast [Item<'ast>], aliases: AliasMap, span: Span) -> Self {
        Self {
            items,
            aliases,
            span,
        }
    }

    pub fn items(&self) -> &'ast [Item<'ast>] {
        self.items
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
