//! Lexer for Atypical source text.
//!
//! The [`Lexer`] turns source text into [`Token`]s, dispatching on the first
//! character of each token. Lexemes are copied into the arena.
//!
//! Errors do not stop lexing: they are recorded, an [`TokenKind::Error`]
//! token is produced, and scanning continues.

use std::collections::VecDeque;

use bumpalo::Bump;

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};
use atypical_core::{LexError, Span};

/// Lexer with arbitrary lookahead.
///
/// The `'src` lifetime is the source string; `'ast` is the arena that owns
/// the token lexemes.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    lookahead: VecDeque<Token<'ast>>,
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            lookahead: VecDeque::with_capacity(4),
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        if let Some(token) = self.lookahead.pop_front() {
            return token;
        }
        self.scan_token()
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Token<'ast> {
        self.peek_nth(0)
    }

    /// Look `n` tokens ahead (0 = next).
    pub fn peek_nth(&mut self, n: usize) -> Token<'ast> {
        while self.lookahead.len() <= n {
            let token = self.scan_token();
            self.lookahead.push_back(token);
        }
        self.lookahead[n]
    }

    fn scan_token(&mut self) -> Token<'ast> {
        self.skip_whitespace();

        let Some(c) = self.cursor.peek() else {
            return self.make_eof();
        };

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        match c {
            '/' => self.scan_slash(start_line, start_col, start_offset),
            '"' => self.scan_string(start_line, start_col, start_offset),
            c if c.is_ascii_digit() => self.scan_number(start_line, start_col, start_offset),
            c if is_ident_start(c) => self.scan_identifier(start_line, start_col, start_offset),
            _ => self.scan_operator(start_line, start_col, start_offset),
        }
    }

    fn skip_whitespace(&mut self) {
        self.cursor.eat('\u{FEFF}');
        self.cursor.eat_while(|c| c.is_ascii_whitespace());
    }

    fn make_eof(&self) -> Token<'ast> {
        let span = Span::point(self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    /// Token from the start position to the cursor, lexeme copied into the arena.
    fn make_token(
        &self,
        kind: TokenKind,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'ast> {
        let len = self.cursor.offset() - start_offset;
        let span = Span::new(start_line, start_col, len);
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start_offset));
        Token::new(kind, lexeme, span)
    }

    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    fn span_from(&self, start_line: u32, start_col: u32, start_offset: u32) -> Span {
        Span::new(start_line, start_col, self.cursor.offset() - start_offset)
    }

    /// `/`, `// ...` or `/* ... */`.
    fn scan_slash(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();

        match self.cursor.peek() {
            Some('/') => {
                self.cursor.eat_while(|c| c != '\n');
                self.scan_token()
            }
            Some('*') => {
                self.cursor.advance();
                loop {
                    match self.cursor.advance() {
                        None => {
                            let span = self.span_from(start_line, start_col, start_offset);
                            return self.make_error(LexError::UnterminatedComment { span });
                        }
                        Some('*') if self.cursor.eat('/') => return self.scan_token(),
                        Some(_) => {}
                    }
                }
            }
            _ => self.make_token(TokenKind::Slash, start_line, start_col, start_offset),
        }
    }

    /// A double-quoted string. Escapes are validated here and decoded by the parser.
    fn scan_string(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();

        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col, start_offset);
                    return self.make_error(LexError::UnterminatedString { span });
                }
                Some('\\') => {
                    let esc_line = self.cursor.line();
                    let esc_col = self.cursor.column();
                    self.cursor.advance();
                    match self.cursor.peek() {
                        Some('n' | 't' | 'r' | '0' | '\\' | '"') => {
                            self.cursor.advance();
                        }
                        Some(ch) if ch != '\n' => {
                            self.cursor.advance();
                            self.errors.push(LexError::InvalidEscape {
                                ch,
                                span: Span::new(esc_line, esc_col, 1 + ch.len_utf8() as u32),
                            });
                        }
                        _ => {}
                    }
                }
                Some('"') => {
                    self.cursor.advance();
                    return self.make_token(
                        TokenKind::StringLiteral,
                        start_line,
                        start_col,
                        start_offset,
                    );
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Integer, long (`L`), float (`f`) or double literal.
    fn scan_number(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        let mut is_double = false;

        if self.cursor.peek() == Some('.') && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_double = true;
        }

        if let Some('e' | 'E') = self.cursor.peek() {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if self.cursor.eat_while(|c| c.is_ascii_digit()).is_empty() {
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::InvalidNumber {
                    span,
                    detail: "missing exponent digits".to_string(),
                });
            }
            is_double = true;
        }

        let kind = match self.cursor.peek() {
            Some('f' | 'F') => {
                self.cursor.advance();
                TokenKind::FloatLiteral
            }
            Some('L' | 'l') if !is_double => {
                self.cursor.advance();
                TokenKind::LongLiteral
            }
            _ if is_double => TokenKind::DoubleLiteral,
            _ => TokenKind::IntLiteral,
        };

        if self.cursor.check(is_ident_continue) {
            self.cursor.eat_while(is_ident_continue);
            let span = self.span_from(start_line, start_col, start_offset);
            return self.make_error(LexError::InvalidNumber {
                span,
                detail: "invalid suffix".to_string(),
            });
        }

        self.make_token(kind, start_line, start_col, start_offset)
    }

    fn scan_identifier(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let lexeme = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(lexeme).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start_line, start_col, start_offset)
    }

    /// Operators and punctuation, matching on `(current, next)`.
    fn scan_operator(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            (';', _) => TokenKind::Semicolon,
            (',', _) => TokenKind::Comma,
            (':', _) => TokenKind::Colon,
            ('.', _) => TokenKind::Dot,
            ('+', _) => TokenKind::Plus,
            ('-', _) => TokenKind::Minus,
            ('*', _) => TokenKind::Star,
            ('%', _) => TokenKind::Percent,

            ('=', Some('=')) => {
                self.cursor.advance();
                TokenKind::EqualEqual
            }
            ('=', _) => TokenKind::Equal,

            ('!', Some('=')) => {
                self.cursor.advance();
                TokenKind::BangEqual
            }
            ('!', _) => TokenKind::Bang,

            ('<', Some('=')) => {
                self.cursor.advance();
                TokenKind::LessEqual
            }
            ('<', _) => TokenKind::Less,

            ('>', Some('=')) => {
                self.cursor.advance();
                TokenKind::GreaterEqual
            }
            ('>', _) => TokenKind::Greater,

            ('&', Some('&')) => {
                self.cursor.advance();
                TokenKind::AmpAmp
            }
            ('|', Some('|')) => {
                self.cursor.advance();
                TokenKind::PipePipe
            }

            _ => {
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::UnexpectedChar { ch: c, span });
            }
        };

        self.make_token(kind, start_line, start_col, start_offset)
    }
}

impl<'src, 'ast> Iterator for Lexer<'src, 'ast> {
    type Item = Token<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
