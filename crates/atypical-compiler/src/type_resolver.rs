//! Type resolution for converting AST type expressions to [`Type`]s.
//!
//! This module provides [`TypeResolver`], which turns a [`TypeExpr`] (or a
//! dotted name used as an expression) into a [`Type`] using the file's
//! [`AliasMap`].
//!
//! ## Rules
//!
//! - Built-in names (`int`, `bool`, `obj`, ...) map to their types, and
//!   `string` to `java/lang/String`.
//! - Other names go through the alias map; a name without an alias is taken
//!   as already qualified.
//! - A single-segment name that is not a known type but names a known
//!   `java/lang` type resolves to it, so `System` and `Math` need no import.
//! - Each trailing `[]` adds an array dimension.
//!
//! ## Example
//!
//! ```ignore
//! let resolver = TypeResolver::new(source.aliases(), &index);
//! let ty = resolver.resolve(&type_expr);
//! ```

use rustc_hash::FxHashSet;

use atypical_core::{AliasMap, Type};
use atypical_parser::ast::TypeExpr;
use atypical_registry::StructuralIndex;

/// Package searched for unqualified names.
const IMPLICIT_PACKAGE: &str = "java/lang/";

/// Set of qualified type names a resolver may refer to.
pub trait KnownTypes {
    fn is_known(&self, name: &str) -> bool;
}

impl KnownTypes for StructuralIndex {
    fn is_known(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl KnownTypes for FxHashSet<String> {
    fn is_known(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// Resolves type names against one file's aliases.
pub struct TypeResolver<'a, K: KnownTypes + ?Sized> {
    aliases: &'a AliasMap,
    known: &'a K,
}

impl<'a, K: KnownTypes + ?Sized> TypeResolver<'a, K> {
    pub fn new(aliases: &'a AliasMap, known: &'a K) -> Self {
        Self { aliases, known }
    }

    /// Resolve a type expression. Never fails: unknown names become object
    /// types and are reported where they are used.
    pub fn resolve(&self, expr: &TypeExpr<'_>) -> Type {
        let mut ty = self.resolve_base(&expr.path.dotted());
        for _ in 0..expr.array_dims {
            ty = Type::array_of(ty);
        }
        ty
    }

    fn resolve_base(&self, dotted: &str) -> Type {
        if let Some(primitive) = Type::primitive_from_name(dotted) {
            return primitive;
        }
        if dotted == "string" {
            return Type::string();
        }
        Type::from_qualified_name(self.qualify(dotted))
    }

    /// Qualified internal name for a dotted source name.
    pub fn qualify(&self, dotted: &str) -> String {
        let qualified = self.aliases.resolve(dotted);
        if qualified.contains('/') || self.known.is_known(&qualified) {
            return qualified;
        }
        let implicit = format!("{IMPLICIT_PACKAGE}{qualified}");
        if self.known.is_known(&implicit) {
            implicit
        } else {
            qualified
        }
    }

    /// Resolve a dotted name used as an expression to a known type.
    pub fn lookup_type(&self, dotted: &str) -> Option<String> {
        let qualified = self.qualify(dotted);
        self.known.is_known(&qualified).then_some(qualified)
    }
}
