//! Parser state and token-level helpers.
//!
//! The grammar itself lives in `decl_parser`, `stmt_parser`, `expr_parser`
//! and `type_parser`, each adding methods to [`Parser`].

use bumpalo::Bump;

use crate::ast::{Ident, ParseError, ParseErrorKind, ParseErrors, SourceFile};
use crate::lexer::{Lexer, Token, TokenKind};
use atypical_core::{AliasMap, Span};

/// Recursive-descent parser with a Pratt expression core.
///
/// Nodes are allocated in the arena passed to [`Parser::new`]. Import items
/// are recorded into the file's [`AliasMap`] as they are parsed.
pub struct Parser<'src, 'ast> {
    lexer: Lexer<'src, 'ast>,
    pub(crate) arena: &'ast Bump,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) aliases: AliasMap,
    prev_span: Span,
}

impl<'src, 'ast> Parser<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            lexer: Lexer::new(source, arena),
            arena,
            errors: Vec::new(),
            aliases: AliasMap::new(),
            prev_span: Span::point(1, 1),
        }
    }

    /// Parse a complete source file.
    ///
    /// Parsing recovers at item and statement boundaries, so the error
    /// collection holds every problem found, ordered by position.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &'src str, arena: &'ast Bump) -> Result<SourceFile<'ast>, ParseErrors> {
        let mut parser = Parser::new(source, arena);
        let file = parser.parse_source_file();
        let errors = parser.take_errors();
        if errors.is_empty() {
            Ok(file)
        } else {
            Err(errors)
        }
    }

    /// Drain parse and lexer errors, sorted by position.
    pub fn take_errors(&mut self) -> ParseErrors {
        let mut all: Vec<ParseError> = self
            .lexer
            .take_errors()
            .into_iter()
            .map(ParseError::from)
            .collect();
        all.append(&mut self.errors);
        all.sort_by_key(|e| (e.span.line, e.span.col));

        let mut errors = ParseErrors::new();
        for err in all {
            errors.push(err);
        }
        errors
    }

    // =========================================
    // Token access
    // =========================================

    /// Next significant token. Error tokens are skipped; their errors are
    /// already recorded by the lexer.
    pub fn peek(&mut self) -> Token<'ast> {
        self.peek_nth(0)
    }

    pub fn peek_nth(&mut self, n: usize) -> Token<'ast> {
        let mut seen = 0;
        let mut i = 0;
        loop {
            let token = self.lexer.peek_nth(i);
            match token.kind {
                TokenKind::Eof => return token,
                TokenKind::Error => {}
                _ if seen == n => return token,
                _ => seen += 1,
            }
            i += 1;
        }
    }

    pub fn advance(&mut self) -> Token<'ast> {
        loop {
            let token = self.lexer.next_token();
            if token.kind != TokenKind::Error {
                if token.kind != TokenKind::Eof {
                    self.prev_span = token.span;
                }
                return token;
            }
        }
    }

    #[inline]
    pub fn check(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn is_eof(&mut self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume the next token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or fail.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        if token.kind == TokenKind::Eof {
            return Err(ParseError::unexpected_eof(token.span));
        }
        Err(ParseError::expected_token(
            token.span,
            kind.description(),
            &describe(&token),
        ))
    }

    /// Like [`expect`](Self::expect) for `;`, reporting at the end of the
    /// previous token.
    pub fn expect_semicolon(&mut self) -> Result<Token<'ast>, ParseError> {
        if let Some(token) = self.eat(TokenKind::Semicolon) {
            return Ok(token);
        }
        let at = Span::point(self.prev_span.line, self.prev_span.col + self.prev_span.len);
        let found = describe(&self.peek());
        Err(ParseError::new(
            ParseErrorKind::MissingSemicolon,
            at,
            format!("expected ';', found {found}"),
        ))
    }

    pub fn expect_ident(&mut self) -> Result<Ident<'ast>, ParseError> {
        let token = self.peek();
        if token.kind == TokenKind::Identifier {
            self.advance();
            return Ok(Ident::new(token.lexeme, token.span));
        }
        if token.kind == TokenKind::Eof {
            return Err(ParseError::unexpected_eof(token.span));
        }
        Err(ParseError::expected_identifier(token.span, &describe(&token)))
    }

    /// Span of the most recently consumed token.
    pub fn prev_span(&self) -> Span {
        self.prev_span
    }

    // =========================================
    // Error recovery
    // =========================================

    /// Skip to a likely statement boundary.
    ///
    /// Stops after a `;`, or before a `}` or a token that starts a statement.
    pub fn synchronize(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof | TokenKind::RightBrace => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::Let | TokenKind::Return | TokenKind::If | TokenKind::While => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip to the next top-level item keyword.
    pub fn synchronize_item(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof
                | TokenKind::Import
                | TokenKind::Module
                | TokenKind::Struct
                | TokenKind::Trait
                | TokenKind::Impl
                | TokenKind::Fn => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// How a token is shown in "found ..." messages.
pub(crate) fn describe(token: &Token<'_>) -> String {
    match token.kind {
        TokenKind::Identifier => format!("identifier '{}'", token.lexeme),
        TokenKind::Eof => "end of file".to_string(),
        kind if kind.is_literal() && !token.lexeme.is_empty() => {
            format!("{} {}", kind.description(), token.lexeme)
        }
        kind => kind.description().to_string(),
    }
}
