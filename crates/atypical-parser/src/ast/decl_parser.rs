//! Top-level declaration parsing.

use super::parser::{Parser, describe};
use crate::ast::decl::*;
use crate::ast::{ParseError, ParseErrorKind, SourceFile};
use crate::lexer::TokenKind;
use atypical_core::Span;
use bumpalo::collections::Vec as BVec;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse items until end of file, recovering at item boundaries.
    pub fn parse_source_file(&mut self) -> SourceFile<'ast> {
        let start = self.peek().span;
        let mut items = BVec::new_in(self.arena);

        while !self.is_eof() {
            let before = self.peek().span;
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    self.errors.push(err);
                    if self.peek().span == before {
                        self.advance();
                    }
                    self.synchronize_item();
                }
            }
        }

        let end = self.prev_span();
        SourceFile::new(
            items.into_bump_slice(),
            std::mem::take(&mut self.aliases),
            Span::new(start.line, start.col, 0).merge(end),
        )
    }

    /// Parse a single item.
    pub fn parse_item(&mut self) -> Result<Item<'ast>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Import => Ok(Item::Import(self.parse_import()?)),
            TokenKind::Module => Ok(Item::Module(self.parse_module()?)),
            TokenKind::Struct => Ok(Item::Struct(self.parse_struct()?)),
            TokenKind::Trait => Ok(Item::Trait(self.parse_trait()?)),
            TokenKind::Impl => Ok(Item::Impl(self.parse_impl()?)),
            TokenKind::Fn => Ok(Item::Function(self.arena.alloc(self.parse_function()?))),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedDeclaration,
                token.span,
                format!("expected declaration, found {}", describe(&token)),
            )),
        }
    }

    /// Grammar: `'import' PATH ('as' IDENT)? ';'`
    ///
    /// Records the alias in the file's alias map.
    pub fn parse_import(&mut self) -> Result<ImportDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Import)?.span;
        let path = self.parse_path()?;
        let alias = if self.eat(TokenKind::As).is_some() {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let end = self.expect_semicolon()?.span;

        let decl = ImportDecl {
            path,
            alias,
            span: start.merge(end),
        };
        self.aliases.insert(decl.local_name().name, &path.dotted());
        Ok(decl)
    }

    /// Grammar: `'module' PATH '{' ('struct' '{' FIELD* '}' | 'impl' '{' FN* '}')* '}'`
    pub fn parse_module(&mut self) -> Result<&'ast ModuleDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Module)?.span;
        let name = self.parse_path()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut fields = BVec::new_in(self.arena);
        let mut methods = BVec::new_in(self.arena);

        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            let token = self.peek();
            match token.kind {
                TokenKind::Struct => {
                    self.advance();
                    self.expect(TokenKind::LeftBrace)?;
                    while !self.check(TokenKind::RightBrace) && !self.is_eof() {
                        fields.push(self.parse_field()?);
                    }
                    self.expect(TokenKind::RightBrace)?;
                }
                TokenKind::Impl => {
                    self.advance();
                    self.expect(TokenKind::LeftBrace)?;
                    while !self.check(TokenKind::RightBrace) && !self.is_eof() {
                        methods.push(self.parse_function()?);
                    }
                    self.expect(TokenKind::RightBrace)?;
                }
                _ => {
                    return Err(ParseError::expected_token(
                        token.span,
                        "'struct' or 'impl'",
                        &describe(&token),
                    ));
                }
            }
        }

        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(self.arena.alloc(ModuleDecl {
            name,
            fields: fields.into_bump_slice(),
            methods: methods.into_bump_slice(),
            span: start.merge(end),
        }))
    }

    /// Grammar: `'struct' PATH '{' FIELD* '}'`
    pub fn parse_struct(&mut self) -> Result<&'ast StructDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Struct)?.span;
        let name = self.parse_path()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut fields = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            fields.push(self.parse_field()?);
        }

        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(self.arena.alloc(StructDecl {
            name,
            fields: fields.into_bump_slice(),
            span: start.merge(end),
        }))
    }

    /// Grammar: `IDENT ':' TYPE ';'`
    fn parse_field(&mut self) -> Result<Field<'ast>, ParseError> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let end = self.expect_semicolon()?.span;
        Ok(Field {
            name,
            ty,
            span: name.span.merge(end),
        })
    }

    /// Grammar: `'trait' PATH '{' (FN_SIG ';')* '}'`
    pub fn parse_trait(&mut self) -> Result<&'ast TraitDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Trait)?.span;
        let name = self.parse_path()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut methods = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            let sig = self.parse_fn_sig()?;
            self.expect_semicolon()?;
            methods.push(sig);
        }

        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(self.arena.alloc(TraitDecl {
            name,
            methods: methods.into_bump_slice(),
            span: start.merge(end),
        }))
    }

    /// Grammar: `'impl' TYPE 'for' TYPE '{' FN* '}'`
    pub fn parse_impl(&mut self) -> Result<&'ast ImplDecl<'ast>, ParseError> {
        let start = self.expect(TokenKind::Impl)?.span;
        let trait_ty = self.parse_type()?;
        self.expect(TokenKind::For)?;
        let target = self.parse_type()?;
        self.expect(TokenKind::LeftBrace)?;

        let mut methods = BVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            methods.push(self.parse_function()?);
        }

        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(self.arena.alloc(ImplDecl {
            trait_ty,
            target,
            methods: methods.into_bump_slice(),
            span: start.merge(end),
        }))
    }

    /// Grammar: `FN_SIG BLOCK`
    pub fn parse_function(&mut self) -> Result<FunctionDecl<'ast>, ParseError> {
        let sig = self.parse_fn_sig()?;
        let body = self.parse_block()?;
        Ok(FunctionDecl {
            sig,
            body,
            span: sig.span.merge(body.span),
        })
    }

    /// Grammar: `'fn' IDENT '(' (PARAM (',' PARAM)*)? ')' (':' TYPE)?`
    pub fn parse_fn_sig(&mut self) -> Result<FunctionSig<'ast>, ParseError> {
        let start = self.expect(TokenKind::Fn)?.span;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LeftParen)?;

        let mut params = BVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                let param_name = self.expect_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(Param {
                    name: param_name,
                    ty,
                    span: param_name.span.merge(ty.span),
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let close = self.expect(TokenKind::RightParen)?.span;

        let return_ty = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };

        let end = return_ty.map_or(close, |t| t.span);
        Ok(FunctionSig {
            name,
            params: params.into_bump_slice(),
            return_ty,
            span: start.merge(end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    #[test]
    fn import_records_alias() {
        let arena = Bump::new();
        let file = Parser::parse(
            "import java.io.PrintStream; import geo.shapes.Circle as C;",
            &arena,
        )
        .unwrap();
        assert_eq!(file.items().len(), 2);
        assert_eq!(file.aliases().resolve("PrintStream"), "java/io/PrintStream");
        assert_eq!(file.aliases().resolve("C"), "geo/shapes/Circle");
    }

    #[test]
    fn struct_fields_keep_order() {
        let arena = Bump::new();
        let file = Parser::parse("struct geo.Point { x: int; y: int; label: string; }", &arena)
            .unwrap();
        let Item::Struct(s) = file.items()[0] else {
            panic!("expected struct");
        };
        assert_eq!(s.name.qualified(), "geo/Point");
        let names: Vec<_> = s.fields.iter().map(|f| f.name.name).collect();
        assert_eq!(names, vec!["x", "y", "label"]);
    }

    #[test]
    fn module_with_struct_and_impl_sections() {
        let arena = Bump::new();
        let source = "module app.Counter {
            struct { count: int; }
            impl {
                fn inc(): int { count = count + 1; return count; }
                fn reset() { count = 0; }
            }
        }";
        let file = Parser::parse(source, &arena).unwrap();
        let Item::Module(m) = file.items()[0] else {
            panic!("expected module");
        };
        assert_eq!(m.fields.len(), 1);
        assert_eq!(m.methods.len(), 2);
        assert!(m.methods[1].sig.return_ty.is_none());
    }

    #[test]
    fn trait_and_impl() {
        let arena = Bump::new();
        let source = "trait Greeter { fn greet(): string; fn times(n: int, loud: bool): int; }
                      impl Greeter for Dog { fn greet(): string { return \"woof\"; } }";
        let file = Parser::parse(source, &arena).unwrap();
        let Item::Trait(t) = file.items()[0] else {
            panic!("expected trait");
        };
        assert_eq!(t.methods.len(), 2);
        assert_eq!(t.methods[1].params.len(), 2);
        let Item::Impl(i) = file.items()[1] else {
            panic!("expected impl");
        };
        assert_eq!(i.trait_ty.path.dotted(), "Greeter");
        assert_eq!(i.target.path.dotted(), "Dog");
        assert_eq!(i.methods[0].sig.name.name, "greet");
    }

    #[test]
    fn global_function() {
        let arena = Bump::new();
        let file = Parser::parse("fn add(a: int, b: int): int { return a + b; }", &arena).unwrap();
        let Item::Function(f) = file.items()[0] else {
            panic!("expected function");
        };
        assert_eq!(f.sig.params.len(), 2);
        assert_eq!(f.body.stmts.len(), 1);
    }

    #[test]
    fn errors_from_several_items_are_collected() {
        let arena = Bump::new();
        let source = "struct A { x int; }\nfn ok() {}\nfn bad( { }\nfn g() {}\n42";
        let errors = Parser::parse(source, &arena).unwrap_err();
        assert_eq!(errors.len(), 3);
        let lines: Vec<u32> = errors.iter().map(|e| e.span.line).collect();
        assert_eq!(lines, vec![1, 3, 5]);
    }

    #[test]
    fn lexer_errors_are_reported() {
        let arena = Bump::new();
        let errors = Parser::parse("fn f() { let s = \"open; }", &arena).unwrap_err();
        assert!(errors.iter().any(|e| e.kind == ParseErrorKind::Lexical));
    }
}
