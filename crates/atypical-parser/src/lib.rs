//! Lexer and parser for the Atypical language.
//!
//! - [`lexer`]: tokenization with arena-backed lexemes
//! - [`ast`]: syntax tree nodes and the [`Parser`]
//!
//! Parsing a file also builds its import [`AliasMap`](atypical_core::AliasMap).

pub mod ast;
pub mod lexer;

pub use ast::{Parser, SourceFile};
pub use lexer::{Lexer, Token, TokenKind};
