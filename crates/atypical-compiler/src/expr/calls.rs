//! Call compilation and method dispatch.
//!
//! Overloads are matched exactly (see [`MethodDescriptor::matches`]): the
//! first declared method whose parameters equal the argument types, with
//! `null` matching any position, wins.
//!
//! Arguments are compiled before the target is known, so anything that has
//! to sit below them on the stack is inserted afterwards at a mark taken
//! before the first argument:
//!
//! - the implicit `this` of a bare instance call
//! - the adapter wrapping a struct receiver whose method comes from a trait
//! - a `POP` of a receiver whose method turned out to be static

use atypical_core::{CompilationError, MethodDescriptor, OBJECT_CLASS, Span, Type, format_arg_types};
use atypical_parser::ast::{CallExpr, Expr};
use atypical_registry::{CONSTRUCTOR_NAME, MethodSig, StructuralIndex, TypeDecl, WRAPPED_FIELD};

use super::{ExprCompiler, Result};
use crate::bytecode::{Instruction, MemberRef, MethodRef, Opcode};
use crate::expr_info::ExprInfo;

/// Compile a bare call `f(args)`.
///
/// Inside an impl method the adapter's own methods are tried first, then the
/// wrapped struct's. Elsewhere the enclosing type's methods are tried, then
/// the file's global functions.
pub fn compile_call(compiler: &mut ExprCompiler<'_, '_>, call: &CallExpr<'_>) -> Result<ExprInfo> {
    let mark = compiler.emitter().mark();
    let args = compiler.compile_args(call.args)?;
    let name = call.callee.name;

    let index = compiler.ctx().index;
    let owner = compiler.ctx().owner;
    let in_static = compiler.ctx().is_static();

    if let Some(adapter) = compiler.ctx().adapter() {
        if let Some(sig) = owner.find_method(name, &args) {
            compiler
                .emitter()
                .insert(mark, [Instruction::Local(Opcode::Aload, 0)]);
            emit_invoke(compiler, owner, sig);
            return Ok(ExprInfo::method_result(sig.ret.clone()));
        }
        if let Some((decl, sig)) = find_callable(index, &adapter.struct_name, name, &args, true) {
            if !sig.is_static {
                let wrapped = Type::from_qualified_name(adapter.struct_name.clone());
                compiler.emitter().insert(
                    mark,
                    [
                        Instruction::Local(Opcode::Aload, 0),
                        Instruction::Field(
                            Opcode::Getfield,
                            MemberRef::new(&owner.name, WRAPPED_FIELD, wrapped.descriptor()),
                        ),
                    ],
                );
            }
            emit_invoke(compiler, decl, sig);
            return Ok(ExprInfo::method_result(sig.ret.clone()));
        }
    } else if let Some((decl, sig)) = find_callable(index, &owner.name, name, &args, !in_static) {
        if !sig.is_static {
            compiler
                .emitter()
                .insert(mark, [Instruction::Local(Opcode::Aload, 0)]);
        }
        emit_invoke(compiler, decl, sig);
        return Ok(ExprInfo::method_result(sig.ret.clone()));
    }

    if let Some(holder) = compiler.ctx().holder
        && holder.name != owner.name
        && let Some((decl, sig)) = find_callable(index, &holder.name, name, &args, false)
    {
        emit_invoke(compiler, decl, sig);
        return Ok(ExprInfo::method_result(sig.ret.clone()));
    }

    Err(CompilationError::NoApplicableMethod {
        owner: compiler.ctx().this_type().to_string(),
        name: name.to_string(),
        args: format_arg_types(&args),
        span: call.span,
    })
}

/// Compile `Type.method(args)`.
pub fn compile_static_call(
    compiler: &mut ExprCompiler<'_, '_>,
    owner: &str,
    name: &str,
    args: &[&Expr<'_>],
    span: Span,
) -> Result<ExprInfo> {
    let arg_types = compiler.compile_args(args)?;
    let index = compiler.ctx().index;
    let (decl, sig) = find_callable(index, owner, name, &arg_types, true)
        .ok_or_else(|| no_applicable_method(&Type::from_qualified_name(owner), name, &arg_types, span))?;
    if !sig.is_static {
        return Err(CompilationError::mismatch(
            span,
            format!("method '{}.{name}' is not static", decl.as_type()),
        ));
    }
    emit_invoke(compiler, decl, sig);
    Ok(ExprInfo::method_result(sig.ret.clone()))
}

/// Compile `receiver.method(args)` with the receiver already on the stack.
///
/// The receiver's own type and its superclasses are searched first. If that
/// fails and the receiver is a struct, every trait it implements is probed
/// in registration order and the receiver is wrapped in the matching
/// adapter.
pub fn compile_method_call(
    compiler: &mut ExprCompiler<'_, '_>,
    receiver: &Type,
    name: &str,
    args: &[&Expr<'_>],
    span: Span,
) -> Result<ExprInfo> {
    let mark = compiler.emitter().mark();
    let arg_types = compiler.compile_args(args)?;

    let owner = match receiver {
        Type::Object(owner) => owner.as_str(),
        Type::Array(_) => OBJECT_CLASS,
        _ => return Err(no_applicable_method(receiver, name, &arg_types, span)),
    };

    let index = compiler.ctx().index;
    if let Some((decl, sig)) = index.find_method(owner, name, &arg_types) {
        if sig.is_static {
            compiler
                .emitter()
                .insert(mark, [Instruction::Simple(Opcode::Pop)]);
        }
        emit_invoke(compiler, decl, sig);
        return Ok(ExprInfo::method_result(sig.ret.clone()));
    }

    if let Some((trait_decl, sig)) = index.find_trait_method(owner, name, &arg_types)
        && let Some(adapter) = index.adapter_for(&trait_decl.name, owner)
    {
        tracing::trace!(adapter = %adapter.name, method = name, "dispatching through trait adapter");
        compiler
            .emitter()
            .insert(mark, adapter_wrap(&adapter.name, receiver));
        compiler
            .emitter()
            .invoke(Opcode::Invokevirtual, &adapter.name, name, &sig.descriptor());
        return Ok(ExprInfo::method_result(sig.ret.clone()));
    }

    Err(no_applicable_method(receiver, name, &arg_types, span))
}

/// Instructions turning a struct on top of the stack into an adapter
/// instance: `NEW A; DUP_X1; SWAP; INVOKESPECIAL A.<init>(S)V`.
pub(crate) fn adapter_wrap(adapter: &str, wrapped: &Type) -> Vec<Instruction> {
    let ctor = MethodDescriptor::new(vec![wrapped.clone()], Type::Void);
    vec![
        Instruction::Type(Opcode::New, adapter.to_string()),
        Instruction::Simple(Opcode::DupX1),
        Instruction::Simple(Opcode::Swap),
        Instruction::Invoke(
            Opcode::Invokespecial,
            MethodRef::new(adapter, CONSTRUCTOR_NAME, ctor.to_string()),
        ),
    ]
}

/// First method named `name` on `owner` or a superclass accepting `args`.
/// Instance methods are skipped unless `allow_instance`.
fn find_callable<'i>(
    index: &'i StructuralIndex,
    owner: &str,
    name: &str,
    args: &[Type],
    allow_instance: bool,
) -> Option<(&'i TypeDecl, &'i MethodSig)> {
    index.ancestors(owner).find_map(|decl| {
        decl.methods_named(name)
            .find(|m| {
                !m.is_constructor()
                    && (allow_instance || m.is_static)
                    && MethodDescriptor::matches(&m.params, args)
            })
            .map(|m| (decl, m))
    })
}

/// Invoke `sig` as declared on `decl`.
fn emit_invoke(compiler: &mut ExprCompiler<'_, '_>, decl: &TypeDecl, sig: &MethodSig) {
    let op = if sig.is_static {
        Opcode::Invokestatic
    } else if decl.is_interface() {
        Opcode::Invokeinterface
    } else {
        Opcode::Invokevirtual
    };
    compiler
        .emitter()
        .invoke(op, &decl.name, &sig.name, &sig.descriptor());
}

fn no_applicable_method(receiver: &Type, name: &str, args: &[Type], span: Span) -> CompilationError {
    CompilationError::NoApplicableMethod {
        owner: receiver.to_string(),
        name: name.to_string(),
        args: format_arg_types(args),
        span,
    }
}
