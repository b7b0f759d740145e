//! Member access and indexing.
//!
//! A receiver that names a type (`System`, `java.lang.System`, an alias)
//! selects static semantics for that one step: `GETSTATIC` for fields and
//! `INVOKESTATIC` for methods. Every later step of a chain works on the
//! value the step produced.

use atypical_core::{CompilationError, Span, Type};
use atypical_parser::ast::{Expr, IndexExpr, MemberAccess, MemberExpr};

use super::{ExprCompiler, Result, calls, is_int_like};
use crate::bytecode::Opcode;
use crate::expr_info::ExprInfo;

/// What a member access is applied to.
pub(crate) enum Receiver {
    /// A type; nothing is on the stack.
    Static(String),
    /// A value on the stack.
    Value(ExprInfo),
}

/// Compile `object.field` or `object.method(args)`.
pub fn compile_member(compiler: &mut ExprCompiler<'_, '_>, member: &MemberExpr<'_>) -> Result<ExprInfo> {
    let receiver = compile_receiver(compiler, member.object)?;
    match member.member {
        MemberAccess::Field(name) => compile_field(compiler, receiver, name.name, member.span),
        MemberAccess::Method { name, args } => match receiver {
            Receiver::Static(owner) => {
                calls::compile_static_call(compiler, &owner, name.name, args, member.span)
            }
            Receiver::Value(info) => {
                calls::compile_method_call(compiler, &info.ty, name.name, args, member.span)
            }
        },
    }
}

/// Compile the receiver of a member access.
pub(crate) fn compile_receiver(compiler: &mut ExprCompiler<'_, '_>, object: &Expr<'_>) -> Result<Receiver> {
    // A path that is not a type is compiled step by step; an unknown root
    // is reported by name resolution.
    if let Some(path) = type_path(compiler, object)
        && let Some(name) = compiler.ctx().resolver().lookup_type(&path)
    {
        return Ok(Receiver::Static(name));
    }

    let info = compiler.compile(object)?;
    if let Some(target) = info.ty.static_target() {
        let name = target.internal_name().map(str::to_string).ok_or_else(|| {
            CompilationError::mismatch(object.span(), format!("'{target}' has no members"))
        })?;
        return Ok(Receiver::Static(name));
    }
    if info.ty.is_void() {
        return Err(CompilationError::mismatch(
            object.span(),
            "expression has no value",
        ));
    }
    Ok(Receiver::Value(info))
}

/// Dotted spelling of a chain of names whose root is not a value.
fn type_path(compiler: &ExprCompiler<'_, '_>, expr: &Expr<'_>) -> Option<String> {
    match expr {
        Expr::Ident(ident) if !compiler.is_value_name(ident) => Some(ident.name.to_string()),
        Expr::Member(member) => match member.member {
            MemberAccess::Field(name) => {
                type_path(compiler, member.object).map(|path| format!("{path}.{}", name.name))
            }
            MemberAccess::Method { .. } => None,
        },
        _ => None,
    }
}

fn compile_field(
    compiler: &mut ExprCompiler<'_, '_>,
    receiver: Receiver,
    name: &str,
    span: Span,
) -> Result<ExprInfo> {
    match receiver {
        Receiver::Static(owner) => {
            let index = compiler.ctx().index;
            let (decl, field) = index.find_field(&owner, name).ok_or_else(|| unknown_field(name, &owner, span))?;
            if !field.is_static {
                return Err(CompilationError::mismatch(
                    span,
                    format!("field '{name}' of '{}' is not static", decl.as_type()),
                ));
            }
            compiler.emitter().field(Opcode::Getstatic, &decl.name, name, &field.ty);
            Ok(ExprInfo::member(field.ty.clone()))
        }
        Receiver::Value(info) => match &info.ty {
            Type::Array(_) if name == "length" => {
                compiler.emitter().emit(Opcode::Arraylength);
                Ok(ExprInfo::temporary(Type::Int))
            }
            Type::Object(owner) => {
                let index = compiler.ctx().index;
                let (decl, field) = index.find_field(owner, name).ok_or_else(|| unknown_field(name, owner, span))?;
                let emitter = compiler.emitter();
                if field.is_static {
                    emitter.emit(Opcode::Pop);
                    emitter.field(Opcode::Getstatic, &decl.name, name, &field.ty);
                } else {
                    emitter.field(Opcode::Getfield, &decl.name, name, &field.ty);
                }
                Ok(ExprInfo::member(field.ty.clone()))
            }
            other => Err(CompilationError::UnknownField {
                field: name.to_string(),
                type_name: other.to_string(),
                span,
            }),
        },
    }
}

pub(crate) fn unknown_field(name: &str, owner: &str, span: Span) -> CompilationError {
    CompilationError::UnknownField {
        field: name.to_string(),
        type_name: atypical_core::to_binary_name(owner),
        span,
    }
}

/// Compile `array[index]`.
pub fn compile_index(compiler: &mut ExprCompiler<'_, '_>, index: &IndexExpr<'_>) -> Result<ExprInfo> {
    let element = compile_array_and_index(compiler, index)?;
    compiler.emitter().array_load(&element);
    Ok(ExprInfo::array_element(element))
}

/// Push the array and the index, returning the element type.
pub(crate) fn compile_array_and_index(
    compiler: &mut ExprCompiler<'_, '_>,
    index: &IndexExpr<'_>,
) -> Result<Type> {
    let array = compiler.compile_value(index.object)?;
    let element = array.ty.element_type().cloned().ok_or_else(|| {
        CompilationError::mismatch(
            index.object.span(),
            format!("cannot index non-array type '{}'", array.ty),
        )
    })?;

    let idx = compiler.compile_value(index.index)?;
    if !is_int_like(&idx.ty) {
        return Err(CompilationError::mismatch(
            index.index.span(),
            format!("array index must be int, found '{}'", idx.ty),
        ));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use atypical_core::CompilationError;

    use crate::bytecode::{Instruction, Opcode};
    use crate::test_support::{compile_err, compile_ok, method_code, ops};

    #[test]
    fn static_field_through_implicit_package() {
        let classes = compile_ok("fn f(): void { System.out.println(1); }");
        let code = method_code(&classes, "main", "f");
        assert!(matches!(
            &code.instructions[0],
            Instruction::Field(Opcode::Getstatic, m) if m.owner == "java/lang/System" && m.name == "out"
        ));
    }

    #[test]
    fn fully_qualified_receiver() {
        let classes = compile_ok("fn f(): void { java.lang.System.out.println(\"x\"); }");
        assert_eq!(
            ops(&classes, "main", "f"),
            vec![Opcode::Getstatic, Opcode::Ldc, Opcode::Invokevirtual, Opcode::Return]
        );
    }

    #[test]
    fn struct_fields_and_array_length() {
        let classes = compile_ok(
            "struct P { x: int; }\n\
             fn f(p: P, a: long[]): int { return p.x + a.length; }",
        );
        assert_eq!(
            ops(&classes, "main", "f"),
            vec![
                Opcode::Aload,
                Opcode::Getfield,
                Opcode::Aload,
                Opcode::Arraylength,
                Opcode::Iadd,
                Opcode::Ireturn
            ]
        );
    }

    #[test]
    fn indexing_by_element_kind() {
        let classes = compile_ok(
            "fn f(a: long[], i: int): long { return a[i]; }\n\
             fn g(a: bool[]): bool { return a[0]; }",
        );
        assert!(ops(&classes, "main", "f").contains(&Opcode::Laload));
        assert!(ops(&classes, "main", "g").contains(&Opcode::Baload));
    }

    #[test]
    fn indexing_errors() {
        for source in [
            "fn f(a: int): int { return a[0]; }",
            "fn f(a: int[], b: bool): int { return a[b]; }",
            "fn f(a: int[]): int { return a[1L]; }",
        ] {
            let err = compile_err(source);
            assert!(matches!(err.as_compilation(), Some(CompilationError::TypeMismatch { .. })));
        }
    }

    #[test]
    fn unknown_field() {
        let err = compile_err("struct P { x: int; }\nfn f(p: P): int { return p.y; }");
        assert!(matches!(
            err.as_compilation(),
            Some(CompilationError::UnknownField { field, type_name, .. })
                if field == "y" && type_name == "P"
        ));
    }
}
