//! Bare name compilation.
//!
//! A name is resolved, in order, as a local variable, `this`, a field of the
//! enclosing type, and finally a type name. Inside an impl method `this` and
//! bare fields refer to the wrapped struct, not the adapter.

use atypical_core::{CompilationError, Span, Type};
use atypical_parser::ast::Ident;
use atypical_registry::WRAPPED_FIELD;

use super::{ExprCompiler, Result};
use crate::bytecode::Opcode;
use crate::expr_info::ExprInfo;

/// Compile a bare identifier.
pub fn compile_ident(compiler: &mut ExprCompiler<'_, '_>, ident: &Ident<'_>) -> Result<ExprInfo> {
    if let Some(var) = compiler.ctx().scope.lookup(ident.name) {
        let (ty, slot) = (var.ty.clone(), var.slot);
        compiler.emitter().load(&ty, slot);
        return Ok(ExprInfo::local(ty, slot));
    }

    if ident.name == "this" {
        return compile_this(compiler, ident.span);
    }

    let fields = compiler.ctx().field_scope();
    if let Some((decl, field)) = compiler.ctx().index.find_field(&fields.name, ident.name) {
        let (owner, ty, is_static) = (decl.name.clone(), field.ty.clone(), field.is_static);
        if is_static {
            compiler.emitter().field(Opcode::Getstatic, &owner, ident.name, &ty);
        } else {
            push_this(compiler, ident.span)?;
            compiler.emitter().field(Opcode::Getfield, &owner, ident.name, &ty);
        }
        return Ok(ExprInfo::member(ty));
    }

    if let Some(name) = compiler.ctx().resolver().lookup_type(ident.name) {
        return Ok(ExprInfo::static_type(Type::from_qualified_name(name)));
    }

    Err(CompilationError::UnresolvedName {
        name: ident.name.to_string(),
        span: ident.span,
    })
}

/// Compile `this`.
fn compile_this(compiler: &mut ExprCompiler<'_, '_>, span: Span) -> Result<ExprInfo> {
    let ty = push_this(compiler, span)?;
    Ok(ExprInfo::local(ty, 0))
}

/// Push the receiver source code sees as `this`.
///
/// In an impl method that is the adapter's `wrapped` field.
pub(crate) fn push_this(compiler: &mut ExprCompiler<'_, '_>, span: Span) -> Result<Type> {
    if compiler.ctx().is_static() {
        return Err(CompilationError::ThisInStaticContext { span });
    }
    let ty = compiler.ctx().this_type();
    let adapter = compiler.ctx().owner.name.clone();
    let in_adapter = compiler.ctx().adapter().is_some();

    let emitter = compiler.emitter();
    emitter.load(&Type::object(), 0);
    if in_adapter {
        emitter.field(Opcode::Getfield, &adapter, WRAPPED_FIELD, &ty);
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use atypical_core::CompilationError;

    use crate::bytecode::Opcode;
    use crate::test_support::{compile_err, compile_ok, ops};

    #[test]
    fn locals_come_first() {
        let classes = compile_ok("fn f(x: int): int { return x; }");
        assert_eq!(ops(&classes, "main", "f"), vec![Opcode::Iload, Opcode::Ireturn]);
    }

    #[test]
    fn module_fields_read_through_this() {
        let classes = compile_ok(
            "module Counter {\n\
               struct { count: int; }\n\
               impl { fn get(): int { return count; } }\n\
             }",
        );
        assert_eq!(
            ops(&classes, "Counter", "get"),
            vec![Opcode::Aload, Opcode::Getfield, Opcode::Ireturn]
        );
    }

    #[test]
    fn impl_this_is_the_wrapped_struct() {
        let classes = compile_ok(
            "struct Dog { name: string; }\n\
             trait Named { fn name(): string; }\n\
             impl Named for Dog { fn name(): string { return this.name; } }",
        );
        assert_eq!(
            ops(&classes, "Named$Dog", "name"),
            vec![
                Opcode::Aload,
                Opcode::Getfield,
                Opcode::Getfield,
                Opcode::Areturn
            ]
        );
    }

    #[test]
    fn this_in_global_function() {
        let err = compile_err("fn f(): obj { return this; }");
        assert!(matches!(
            err.as_compilation(),
            Some(CompilationError::ThisInStaticContext { .. })
        ));
    }

    #[test]
    fn unresolved_names() {
        let err = compile_err("fn f(): int { return y; }");
        assert!(matches!(
            err.as_compilation(),
            Some(CompilationError::UnresolvedName { name, .. }) if name == "y"
        ));
    }
}
