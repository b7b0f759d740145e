//! Per-method compilation context.
//!
//! A [`MethodContext`] bundles what compiling one method body needs: the
//! frozen [`StructuralIndex`], the declaring file's aliases, the enclosing
//! type and signature, and the method's [`LocalScope`].

use atypical_core::{AliasMap, CompilationError, Span, Type};
use atypical_parser::ast::TypeExpr;
use atypical_registry::{AdapterInfo, MethodSig, StructuralIndex, TypeDecl};

use crate::options::CompilerOptions;
use crate::scope::LocalScope;
use crate::type_resolver::TypeResolver;

/// Everything known while compiling one method.
pub struct MethodContext<'ctx> {
    pub index: &'ctx StructuralIndex,
    pub aliases: &'ctx AliasMap,
    pub options: &'ctx CompilerOptions,
    /// Type declaring the method.
    pub owner: &'ctx TypeDecl,
    pub method: &'ctx MethodSig,
    /// Global function holder of the declaring file, if it has one.
    pub holder: Option<&'ctx TypeDecl>,
    pub scope: LocalScope,
}

impl<'ctx> MethodContext<'ctx> {
    pub fn new(
        index: &'ctx StructuralIndex,
        aliases: &'ctx AliasMap,
        options: &'ctx CompilerOptions,
        owner: &'ctx TypeDecl,
        method: &'ctx MethodSig,
    ) -> Self {
        let scope = if method.is_static {
            LocalScope::new()
        } else {
            LocalScope::for_instance()
        };
        Self {
            index,
            aliases,
            options,
            owner,
            method,
            holder: None,
            scope,
        }
    }

    pub fn with_holder(mut self, holder: Option<&'ctx TypeDecl>) -> Self {
        self.holder = holder;
        self
    }

    /// Whether the method has no receiver.
    pub fn is_static(&self) -> bool {
        self.method.is_static
    }

    /// Trait and struct, when compiling an impl method.
    pub fn adapter(&self) -> Option<&'ctx AdapterInfo> {
        self.owner.adapter.as_ref()
    }

    /// The struct an impl method's `this` refers to.
    pub fn wrapped_struct(&self) -> Option<&'ctx TypeDecl> {
        self.adapter()
            .and_then(|adapter| self.index.get(&adapter.struct_name))
    }

    /// Type of `this` as seen by source code.
    pub fn this_type(&self) -> Type {
        match self.adapter() {
            Some(adapter) => Type::from_qualified_name(adapter.struct_name.clone()),
            None => self.owner.as_type(),
        }
    }

    /// Declaration whose fields bare names refer to.
    pub fn field_scope(&self) -> &'ctx TypeDecl {
        self.wrapped_struct().unwrap_or(self.owner)
    }

    pub fn resolver(&self) -> TypeResolver<'ctx, StructuralIndex> {
        TypeResolver::new(self.aliases, self.index)
    }

    pub fn resolve_type(&self, expr: &TypeExpr<'_>) -> Type {
        self.resolver().resolve(expr)
    }

    /// Resolve a type written in a method body, requiring the class it
    /// names (or its array element class) to exist.
    pub fn resolve_known(&self, expr: &TypeExpr<'_>) -> Result<Type, CompilationError> {
        let ty = self.resolve_type(expr);
        let mut base = &ty;
        while let Some(element) = base.element_type() {
            base = element;
        }
        match base {
            Type::Object(name) if !self.index.contains(name) => Err(CompilationError::UnknownType {
                name: expr.path.dotted(),
                span: expr.span,
            }),
            _ => Ok(ty),
        }
    }

    /// Declare the method's parameters in order.
    pub fn declare_params(&mut self) -> Result<(), CompilationError> {
        let method = self.method;
        for (i, ty) in method.params.iter().enumerate() {
            let name = method
                .param_names
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("arg{i}"));
            self.scope.declare_param(name, ty.clone(), method.span)?;
        }
        Ok(())
    }

    /// Span of the method, for errors without a better location.
    pub fn span(&self) -> Span {
        self.method.span
    }
}
