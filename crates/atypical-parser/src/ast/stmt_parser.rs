//! Statement parsing.

use super::parser::{Parser, describe};
use crate::ast::stmt::*;
use crate::ast::{ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use bumpalo::collections::Vec as BVec;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse a statement.
    pub fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let token = self.peek();

        match token.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Else
            | TokenKind::Fn
            | TokenKind::Struct
            | TokenKind::Trait
            | TokenKind::Impl
            | TokenKind::Module
            | TokenKind::Import => Err(ParseError::new(
                ParseErrorKind::ExpectedStatement,
                token.span,
                format!("expected statement, found {}", describe(&token)),
            )),
            _ => self.parse_expr_stmt(),
        }
    }

    /// Grammar: `EXPR ';'`
    pub fn parse_expr_stmt(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let expr = self.parse_expr(0)?;
        let end = self.expect_semicolon()?.span;
        Ok(Stmt::Expr(ExprStmt {
            expr,
            span: expr.span().merge(end),
        }))
    }

    /// Grammar: `'let' IDENT (':' TYPE)? '=' EXPR ';'`
    pub fn parse_let(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Let)?.span;
        let name = self.expect_ident()?;
        let ty = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Equal)?;
        let init = self.parse_expr(0)?;
        let end = self.expect_semicolon()?.span;

        Ok(Stmt::Let(LetStmt {
            name,
            ty,
            init,
            span: start.merge(end),
        }))
    }

    /// Grammar: `'return' EXPR? ';'`
    pub fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Return)?.span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        let end = self.expect_semicolon()?.span;

        Ok(Stmt::Return(ReturnStmt {
            value,
            span: start.merge(end),
        }))
    }

    /// Parse `{ stmt* }`, recovering from errors inside the block.
    pub fn parse_block(&mut self) -> Result<Block<'ast>, ParseError> {
        let open = self.peek();
        if open.kind != TokenKind::LeftBrace {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedBlock,
                open.span,
                format!("expected '{{', found {}", describe(&open)),
            ));
        }
        let start = self.advance().span;

        let mut stmts = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            let before = self.peek().span;
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                    if self.peek().span == before && !self.check(TokenKind::RightBrace) {
                        self.advance();
                    }
                }
            }
        }

        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(Block {
            stmts: stmts.into_bump_slice(),
            span: start.merge(end),
        })
    }

    /// Grammar: `'if' '(' EXPR ')' BLOCK ('else' (IF | BLOCK))?`
    pub fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let then_block = self.parse_block()?;

        let else_branch: Option<&'ast Stmt<'ast>> = if self.eat(TokenKind::Else).is_some() {
            let branch = if self.check(TokenKind::If) {
                self.parse_if()?
            } else {
                Stmt::Block(self.parse_block()?)
            };
            Some(self.arena.alloc(branch))
        } else {
            None
        };

        let end = else_branch.map_or(then_block.span, |s| s.span());
        Ok(Stmt::If(self.arena.alloc(IfStmt {
            condition,
            then_block,
            else_branch,
            span: start.merge(end),
        })))
    }

    /// Grammar: `'while' '(' EXPR ')' BLOCK`
    pub fn parse_while(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::While)?.span;
        self.expect(TokenKind::LeftParen)?;
        let condition = self.parse_expr(0)?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_block()?;

        Ok(Stmt::While(self.arena.alloc(WhileStmt {
            condition,
            body,
            span: start.merge(body.span),
        })))
    }
}
