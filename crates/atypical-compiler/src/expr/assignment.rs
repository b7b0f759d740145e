//! Assignment expression compilation.
//!
//! `target = value` stores into a local, a field or an array element. The
//! assignment itself has no value, so `a = b = c` is rejected and an
//! assignment statement leaves nothing to pop.

use atypical_core::{CompilationError, Span, Type};
use atypical_parser::ast::{AssignExpr, Expr, MemberAccess};

use super::identifiers::push_this;
use super::member::{Receiver, compile_array_and_index, compile_receiver, unknown_field};
use super::{ExprCompiler, Result};
use crate::bytecode::Opcode;
use crate::expr_info::{ExprInfo, LValue};

/// Compile an assignment expression.
pub fn compile_assign(compiler: &mut ExprCompiler<'_, '_>, assign: &AssignExpr<'_>) -> Result<ExprInfo> {
    // The receiver (and index) go on the stack before the value.
    let target = analyze_assign_target(compiler, assign.target)?;

    let value = compiler.compile_value(assign.value)?;
    if !target.ty().accepts(&value.ty) {
        return Err(CompilationError::mismatch(
            assign.span,
            format!("cannot assign '{}' to '{}'", value.ty, target.ty()),
        ));
    }

    emit_store(compiler, &target);
    Ok(ExprInfo::void())
}

/// Work out where an assignment stores, pushing any receiver or index.
fn analyze_assign_target(compiler: &mut ExprCompiler<'_, '_>, target: &Expr<'_>) -> Result<LValue> {
    match target {
        Expr::Ident(ident) => {
            if let Some(var) = compiler.ctx().scope.lookup(ident.name) {
                return Ok(LValue::Local {
                    slot: var.slot,
                    ty: var.ty.clone(),
                });
            }
            if ident.name == "this" {
                return Err(CompilationError::NotAnLvalue { span: ident.span });
            }

            let fields = compiler.ctx().field_scope();
            if let Some((decl, field)) = compiler.ctx().index.find_field(&fields.name, ident.name) {
                if !field.is_static {
                    push_this(compiler, ident.span)?;
                }
                return Ok(LValue::Field {
                    owner: decl.name.clone(),
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                    is_static: field.is_static,
                });
            }

            if compiler.ctx().resolver().lookup_type(ident.name).is_some() {
                return Err(CompilationError::NotAnLvalue { span: ident.span });
            }
            Err(CompilationError::UnresolvedName {
                name: ident.name.to_string(),
                span: ident.span,
            })
        }

        Expr::Member(member) => {
            let MemberAccess::Field(name) = member.member else {
                return Err(CompilationError::NotAnLvalue { span: member.span });
            };
            field_target(compiler, member.object, name.name, member.span)
        }

        Expr::Index(index) => {
            let element = compile_array_and_index(compiler, index)?;
            Ok(LValue::ArrayElement { element })
        }

        Expr::Paren(paren) => analyze_assign_target(compiler, paren.expr),

        other => Err(CompilationError::NotAnLvalue { span: other.span() }),
    }
}

/// `object.name = ...`
fn field_target(
    compiler: &mut ExprCompiler<'_, '_>,
    object: &Expr<'_>,
    name: &str,
    span: Span,
) -> Result<LValue> {
    let index = compiler.ctx().index;
    match compile_receiver(compiler, object)? {
        Receiver::Static(owner) => {
            let (decl, field) = index
                .find_field(&owner, name)
                .ok_or_else(|| unknown_field(name, &owner, span))?;
            if !field.is_static {
                return Err(CompilationError::mismatch(
                    span,
                    format!("field '{name}' of '{}' is not static", decl.as_type()),
                ));
            }
            Ok(LValue::Field {
                owner: decl.name.clone(),
                name: field.name.clone(),
                ty: field.ty.clone(),
                is_static: true,
            })
        }
        Receiver::Value(info) => match &info.ty {
            Type::Object(owner) => {
                let (decl, field) = index
                    .find_field(owner, name)
                    .ok_or_else(|| unknown_field(name, owner, span))?;
                if field.is_static {
                    compiler.emitter().emit(Opcode::Pop);
                }
                Ok(LValue::Field {
                    owner: decl.name.clone(),
                    name: field.name.clone(),
                    ty: field.ty.clone(),
                    is_static: field.is_static,
                })
            }
            Type::Array(_) if name == "length" => Err(CompilationError::NotAnLvalue { span }),
            other => Err(CompilationError::UnknownField {
                field: name.to_string(),
                type_name: other.to_string(),
                span,
            }),
        },
    }
}

fn emit_store(compiler: &mut ExprCompiler<'_, '_>, target: &LValue) {
    let emitter = compiler.emitter();
    match target {
        LValue::Local { slot, ty } => emitter.store(ty, *slot),
        LValue::Field {
            owner,
            name,
            ty,
            is_static,
        } => {
            let op = if *is_static {
                Opcode::Putstatic
            } else {
                Opcode::Putfield
            };
            emitter.field(op, owner, name, ty);
        }
        LValue::ArrayElement { element } => emitter.array_store(element),
    }
}
