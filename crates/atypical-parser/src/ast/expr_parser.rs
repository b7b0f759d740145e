//! Expression parsing using Pratt parsing (precedence climbing).

use super::parser::{Parser, describe};
use crate::ast::expr::*;
use crate::ast::ops::{ASSIGN_BINDING_POWER, POSTFIX_BINDING_POWER};
use crate::ast::{BinaryOp, Ident, ParseError, ParseErrorKind, UnaryOp};
use crate::lexer::{Token, TokenKind};
use atypical_core::Span;
use bumpalo::collections::Vec as BVec;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse an expression with a minimum binding power.
    ///
    /// Operators binding looser than `min_bp` are left for the caller.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.peek().kind;

            if matches!(kind, TokenKind::Dot | TokenKind::LeftBracket | TokenKind::LeftParen) {
                if POSTFIX_BINDING_POWER < min_bp {
                    break;
                }
                lhs = match kind {
                    TokenKind::Dot => self.parse_member_access(lhs)?,
                    TokenKind::LeftBracket => self.parse_index(lhs)?,
                    _ => self.parse_call(lhs)?,
                };
                continue;
            }

            if kind == TokenKind::Equal {
                let (l_bp, r_bp) = ASSIGN_BINDING_POWER;
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let value = self.parse_expr(r_bp)?;
                let span = lhs.span().merge(value.span());
                lhs = self.arena.alloc(Expr::Assign(self.arena.alloc(AssignExpr {
                    target: lhs,
                    value,
                    span,
                })));
                continue;
            }

            if let Some(op) = BinaryOp::from_token(kind) {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let right = self.parse_expr(r_bp)?;
                let span = lhs.span().merge(right.span());
                lhs = self.arena.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
                    left: lhs,
                    op,
                    right,
                    span,
                })));
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// The start of an expression: literals, names, grouping, allocation,
    /// casts and prefix operators.
    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = self.peek();

        match token.kind {
            TokenKind::IntLiteral
            | TokenKind::LongLiteral
            | TokenKind::FloatLiteral
            | TokenKind::DoubleLiteral => {
                self.advance();
                let kind = self.number_literal(token, false)?;
                Ok(self.alloc_literal(kind, token.span))
            }

            TokenKind::StringLiteral => {
                self.advance();
                let text = decode_string(token.lexeme);
                let kind = LiteralKind::String(self.arena.alloc_str(&text));
                Ok(self.alloc_literal(kind, token.span))
            }

            TokenKind::True | TokenKind::False => {
                self.advance();
                let kind = LiteralKind::Bool(token.kind == TokenKind::True);
                Ok(self.alloc_literal(kind, token.span))
            }

            TokenKind::Null => {
                self.advance();
                Ok(self.alloc_literal(LiteralKind::Null, token.span))
            }

            TokenKind::Identifier => {
                self.advance();
                Ok(self.arena.alloc(Expr::Ident(Ident::new(token.lexeme, token.span))))
            }

            TokenKind::LeftParen => {
                let open = self.advance();
                let expr = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RightParen)?;
                Ok(self.arena.alloc(Expr::Paren(self.arena.alloc(ParenExpr {
                    expr,
                    span: open.span.merge(close.span),
                }))))
            }

            TokenKind::New => self.parse_new(),
            TokenKind::LeftBracket => self.parse_array_init(),
            TokenKind::Cast => self.parse_cast(),

            // A minus directly before a number literal folds into the literal
            // so the most negative int and long values are expressible.
            TokenKind::Minus
                if matches!(
                    self.peek_nth(1).kind,
                    TokenKind::IntLiteral
                        | TokenKind::LongLiteral
                        | TokenKind::FloatLiteral
                        | TokenKind::DoubleLiteral
                ) =>
            {
                let minus = self.advance();
                let number = self.advance();
                let kind = self.number_literal(number, true)?;
                Ok(self.alloc_literal(kind, minus.span.merge(number.span)))
            }

            kind => {
                if let Some(op) = UnaryOp::from_token(kind) {
                    let op_token = self.advance();
                    let operand = self.parse_expr(UnaryOp::binding_power())?;
                    let span = op_token.span.merge(operand.span());
                    return Ok(self.arena.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
                        op,
                        operand,
                        span,
                    }))));
                }
                if kind == TokenKind::Eof {
                    return Err(ParseError::unexpected_eof(token.span));
                }
                Err(ParseError::expected_expression(token.span, &describe(&token)))
            }
        }
    }

    fn alloc_literal(&self, kind: LiteralKind<'ast>, span: Span) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::Literal(LiteralExpr { kind, span }))
    }

    /// Convert a numeric token into a literal value.
    fn number_literal(
        &self,
        token: Token<'ast>,
        negate: bool,
    ) -> Result<LiteralKind<'ast>, ParseError> {
        let invalid = |what: &str| {
            ParseError::new(
                ParseErrorKind::InvalidLiteral,
                token.span,
                format!("{what} literal '{}' out of range", token.lexeme),
            )
        };
        let sign = if negate { "-" } else { "" };

        Ok(match token.kind {
            TokenKind::IntLiteral => {
                let text = format!("{sign}{}", token.lexeme);
                LiteralKind::Int(text.parse::<i32>().map_err(|_| invalid("int"))?)
            }
            TokenKind::LongLiteral => {
                let digits = token.lexeme.trim_end_matches(['L', 'l']);
                let text = format!("{sign}{digits}");
                LiteralKind::Long(text.parse::<i64>().map_err(|_| invalid("long"))?)
            }
            TokenKind::FloatLiteral => {
                let digits = token.lexeme.trim_end_matches(['f', 'F']);
                let value = digits.parse::<f32>().map_err(|_| invalid("float"))?;
                if value.is_infinite() {
                    return Err(invalid("float"));
                }
                LiteralKind::Float(if negate { -value } else { value })
            }
            _ => {
                let value = token.lexeme.parse::<f64>().map_err(|_| invalid("double"))?;
                if value.is_infinite() {
                    return Err(invalid("double"));
                }
                LiteralKind::Double(if negate { -value } else { value })
            }
        })
    }

    /// `'.' IDENT` or `'.' IDENT '(' ARGS ')'`
    fn parse_member_access(
        &mut self,
        object: &'ast Expr<'ast>,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::Dot)?;
        let name = self.expect_ident()?;

        let (member, end) = if self.check(TokenKind::LeftParen) {
            let (args, close) = self.parse_arguments(TokenKind::LeftParen, TokenKind::RightParen)?;
            (MemberAccess::Method { name, args }, close)
        } else {
            (MemberAccess::Field(name), name.span)
        };

        Ok(self.arena.alloc(Expr::Member(self.arena.alloc(MemberExpr {
            object,
            member,
            span: object.span().merge(end),
        }))))
    }

    /// `'[' EXPR ']'`
    fn parse_index(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftBracket)?;
        let index = self.parse_expr(0)?;
        let close = self.expect(TokenKind::RightBracket)?;
        Ok(self.arena.alloc(Expr::Index(self.arena.alloc(IndexExpr {
            object,
            index,
            span: object.span().merge(close.span),
        }))))
    }

    /// `IDENT '(' ARGS ')'`. Only bare names can be called directly.
    fn parse_call(&mut self, callee: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        let Expr::Ident(name) = *callee else {
            let token = self.peek();
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                token.span,
                "only named functions and methods can be called",
            ));
        };
        let (args, close) = self.parse_arguments(TokenKind::LeftParen, TokenKind::RightParen)?;
        Ok(self.arena.alloc(Expr::Call(self.arena.alloc(CallExpr {
            callee: name,
            args,
            span: name.span.merge(close),
        }))))
    }

    /// `'new' TYPE '(' ARGS ')'`
    fn parse_new(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.expect(TokenKind::New)?.span;
        let ty = self.parse_type()?;
        let (args, close) = self.parse_arguments(TokenKind::LeftParen, TokenKind::RightParen)?;
        Ok(self.arena.alloc(Expr::New(self.arena.alloc(NewExpr {
            ty,
            args,
            span: start.merge(close),
        }))))
    }

    /// `'[' TYPE ']' '[' ARGS ']'`
    fn parse_array_init(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.expect(TokenKind::LeftBracket)?.span;
        let element_ty = self.parse_type()?;
        self.expect(TokenKind::RightBracket)?;
        let (elements, close) =
            self.parse_arguments(TokenKind::LeftBracket, TokenKind::RightBracket)?;
        Ok(self.arena.alloc(Expr::ArrayInit(self.arena.alloc(ArrayInitExpr {
            element_ty,
            elements,
            span: start.merge(close),
        }))))
    }

    /// `'cast' '<' TYPE '>' '(' EXPR ')'`
    fn parse_cast(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let start = self.expect(TokenKind::Cast)?.span;
        self.expect(TokenKind::Less)?;
        let target = self.parse_type()?;
        self.expect(TokenKind::Greater)?;
        self.expect(TokenKind::LeftParen)?;
        let expr = self.parse_expr(0)?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok(self.arena.alloc(Expr::Cast(self.arena.alloc(CastExpr {
            target,
            expr,
            span: start.merge(close.span),
        }))))
    }

    /// Comma separated expressions between `open` and `close`.
    ///
    /// Returns the arguments and the span of the closing token.
    pub(crate) fn parse_arguments(
        &mut self,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<(&'ast [&'ast Expr<'ast>], Span), ParseError> {
        self.expect(open)?;
        let mut args: BVec<'ast, &'ast Expr<'ast>> = BVec::new_in(self.arena);

        if !self.check(close) {
            loop {
                args.push(self.parse_expr(0)?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        let end = self.expect(close)?.span;
        Ok((args.into_bump_slice(), end))
    }
}

/// Strip the quotes from a string lexeme and decode its escapes.
///
/// Unknown escapes were already reported by the lexer and are kept verbatim.
fn decode_string(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn parse<'ast>(source: &str, arena: &'ast Bump) -> &'ast Expr<'ast> {
        let mut parser = Parser::new(source, arena);
        let expr = parser.parse_expr(0).unwrap();
        assert!(parser.is_eof(), "trailing input in {source}");
        expr
    }

    #[test]
    fn precedence_mul_over_add() {
        let arena = Bump::new();
        let Expr::Binary(add) = parse("1 + 2 * 3", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(add.op, BinaryOp::Add);
        assert!(matches!(add.right, Expr::Binary(mul) if mul.op == BinaryOp::Mul));
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        let arena = Bump::new();
        let Expr::Binary(cmp) = parse("i + 1 < n && ok", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(cmp.op, BinaryOp::LogicalAnd);
        assert!(matches!(cmp.left, Expr::Binary(lt) if lt.op == BinaryOp::Less));
    }

    #[test]
    fn subtraction_is_left_associative() {
        let arena = Bump::new();
        let Expr::Binary(outer) = parse("a - b - c", &arena) else {
            panic!("expected binary");
        };
        assert!(matches!(outer.left, Expr::Binary(_)));
        assert!(matches!(outer.right, Expr::Ident(id) if id.name == "c"));
    }

    #[test]
    fn assignment_is_right_associative() {
        let arena = Bump::new();
        let Expr::Assign(outer) = parse("a = b = 1", &arena) else {
            panic!("expected assignment");
        };
        assert!(matches!(outer.target, Expr::Ident(id) if id.name == "a"));
        assert!(matches!(outer.value, Expr::Assign(_)));
    }

    #[test]
    fn literals() {
        let arena = Bump::new();
        let lit = |src: &str| match parse(src, &arena) {
            Expr::Literal(l) => l.kind,
            other => panic!("not a literal: {other:?}"),
        };
        assert_eq!(lit("42"), LiteralKind::Int(42));
        assert_eq!(lit("42L"), LiteralKind::Long(42));
        assert_eq!(lit("1.5f"), LiteralKind::Float(1.5));
        assert_eq!(lit("2.25"), LiteralKind::Double(2.25));
        assert_eq!(lit("true"), LiteralKind::Bool(true));
        assert_eq!(lit("null"), LiteralKind::Null);
        assert_eq!(lit(r#""a\tb""#), LiteralKind::String("a\tb"));
        assert_eq!(lit("-2147483648"), LiteralKind::Int(i32::MIN));
    }

    #[test]
    fn int_out_of_range() {
        let arena = Bump::new();
        let mut parser = Parser::new("2147483648", &arena);
        let err = parser.parse_expr(0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidLiteral);
    }

    #[test]
    fn postfix_chain() {
        let arena = Bump::new();
        let Expr::Member(call) = parse("System.out.println(a[1])", &arena) else {
            panic!("expected member");
        };
        let MemberAccess::Method { name, args } = call.member else {
            panic!("expected method");
        };
        assert_eq!(name.name, "println");
        assert!(matches!(args[0], Expr::Index(_)));
        let Expr::Member(out) = call.object else {
            panic!("expected field access");
        };
        assert!(matches!(out.member, MemberAccess::Field(f) if f.name == "out"));
    }

    #[test]
    fn bare_call() {
        let arena = Bump::new();
        let Expr::Call(call) = parse("add(2, 3)", &arena) else {
            panic!("expected call");
        };
        assert_eq!(call.callee.name, "add");
        assert_eq!(call.args.len(), 2);
    }

    #[test]
    fn call_on_expression_is_rejected() {
        let arena = Bump::new();
        let mut parser = Parser::new("(f)(1)", &arena);
        assert!(parser.parse_expr(0).is_err());
    }

    #[test]
    fn new_array_init_and_cast() {
        let arena = Bump::new();
        let Expr::New(new) = parse("new geo.Point(1, 2)", &arena) else {
            panic!("expected new");
        };
        assert_eq!(new.ty.path.qualified(), "geo/Point");
        assert_eq!(new.args.len(), 2);

        let Expr::Index(index) = parse("[int][10, 20, 30][1]", &arena) else {
            panic!("expected index");
        };
        let Expr::ArrayInit(init) = index.object else {
            panic!("expected array init");
        };
        assert_eq!(init.elements.len(), 3);
        assert_eq!(init.element_ty.path.dotted(), "int");

        let Expr::Member(call) = parse("cast<Greeter>(d).greet()", &arena) else {
            panic!("expected member");
        };
        assert!(matches!(call.object, Expr::Cast(c) if c.target.path.dotted() == "Greeter"));
    }

    #[test]
    fn unary_operators() {
        let arena = Bump::new();
        let Expr::Unary(not) = parse("!done", &arena) else {
            panic!("expected unary");
        };
        assert_eq!(not.op, UnaryOp::LogicalNot);
        let Expr::Binary(mul) = parse("-x * 2", &arena) else {
            panic!("unary must bind tighter than '*'");
        };
        assert!(matches!(mul.left, Expr::Unary(u) if u.op == UnaryOp::Neg));
    }

    #[test]
    fn empty_array_init() {
        let arena = Bump::new();
        let Expr::ArrayInit(init) = parse("[string][]", &arena) else {
            panic!("expected array init");
        };
        assert!(init.elements.is_empty());
    }

    #[test]
    fn missing_operand() {
        let arena = Bump::new();
        let mut parser = Parser::new("1 + ;", &arena);
        let err = parser.parse_expr(0).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedExpression);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(decode_string(r#""a\nb""#), "a\nb");
        assert_eq!(decode_string(r#""q\"x\\""#), "q\"x\\");
        assert_eq!(decode_string(r#""\q""#), "\\q");
    }
}
