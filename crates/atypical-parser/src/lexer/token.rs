//! Token types for the Atypical lexer.

use atypical_core::Span;
use std::fmt;

/// A token from the source code.
///
/// The lexeme is copied into the arena so the source string can be dropped
/// once lexing is complete.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// `42`
    IntLiteral,
    /// `42L`
    LongLiteral,
    /// `1.5f`
    FloatLiteral,
    /// `1.5`, `2e3`
    DoubleLiteral,
    /// `"text"`
    StringLiteral,

    Identifier,

    // Keywords
    Import,
    As,
    Module,
    Struct,
    Trait,
    Impl,
    For,
    Fn,
    Let,
    Return,
    If,
    Else,
    While,
    New,
    Cast,
    True,
    False,
    Null,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    Bang,
    Equal,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Colon,
    Dot,

    Eof,
    /// Produced after a lexical error; the error itself is recorded by the lexer.
    Error,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Import
                | As
                | Module
                | Struct
                | Trait
                | Impl
                | For
                | Fn
                | Let
                | Return
                | If
                | Else
                | While
                | New
                | Cast
                | True
                | False
                | Null
        )
    }

    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntLiteral | LongLiteral | FloatLiteral | DoubleLiteral | StringLiteral | True | False | Null
        )
    }

    /// Human-readable description used in error messages.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            LongLiteral => "long literal",
            FloatLiteral => "float literal",
            DoubleLiteral => "double literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Import => "'import'",
            As => "'as'",
            Module => "'module'",
            Struct => "'struct'",
            Trait => "'trait'",
            Impl => "'impl'",
            For => "'for'",
            Fn => "'fn'",
            Let => "'let'",
            Return => "'return'",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            New => "'new'",
            Cast => "'cast'",
            True => "'true'",
            False => "'false'",
            Null => "'null'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            Bang => "'!'",
            Equal => "'='",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Semicolon => "';'",
            Comma => "','",
            Colon => "':'",
            Dot => "'.'",
            Eof => "end of file",
            Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Map an identifier to its keyword, if it is one.
///
/// Built-in type names (`int`, `bool`, ...) and `this` are ordinary
/// identifiers; later phases give them meaning.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "import" => Import,
        "as" => As,
        "module" => Module,
        "struct" => Struct,
        "trait" => Trait,
        "impl" => Impl,
        "for" => For,
        "fn" => Fn,
        "let" => Let,
        "return" => Return,
        "if" => If,
        "else" => Else,
        "while" => While,
        "new" => New,
        "cast" => Cast,
        "true" => True,
        "false" => False,
        "null" => Null,
        _ => return None,
    })
}
