//! Type and path parsing.

use super::parser::{Parser, describe};
use crate::ast::{Ident, ParseError, Path, TypeExpr};
use crate::lexer::TokenKind;
use bumpalo::collections::Vec as BVec;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse a dotted path.
    ///
    /// Grammar: `IDENT ('.' IDENT)*`
    pub fn parse_path(&mut self) -> Result<Path<'ast>, ParseError> {
        let first = self.expect_ident()?;
        let mut segments: BVec<'ast, Ident<'ast>> = BVec::new_in(self.arena);
        segments.push(first);
        let mut span = first.span;

        while self.check(TokenKind::Dot) && self.peek_nth(1).kind == TokenKind::Identifier {
            self.advance();
            let seg = self.expect_ident()?;
            span = span.merge(seg.span);
            segments.push(seg);
        }

        Ok(Path {
            segments: segments.into_bump_slice(),
            span,
        })
    }

    /// Parse a type.
    ///
    /// Grammar: `PATH ('[' ']')*`
    pub fn parse_type(&mut self) -> Result<TypeExpr<'ast>, ParseError> {
        let token = self.peek();
        if token.kind != TokenKind::Identifier {
            return Err(ParseError::expected_type(token.span, &describe(&token)));
        }

        let path = self.parse_path()?;
        let mut span = path.span;
        let mut array_dims = 0;

        while self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
            self.advance();
            let close = self.advance();
            span = span.merge(close.span);
            array_dims += 1;
        }

        Ok(TypeExpr {
            path,
            array_dims,
            span,
        })
    }
}
