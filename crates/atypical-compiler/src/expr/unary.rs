//! Unary operator compilation.

use atypical_core::{CompilationError, Type, ValueKind};
use atypical_parser::ast::{UnaryExpr, UnaryOp};

use super::{ExprCompiler, Result, expect_bool};
use crate::bytecode::Opcode;
use crate::expr_info::ExprInfo;

/// Compile `-x` or `!x`.
pub fn compile_unary(compiler: &mut ExprCompiler<'_, '_>, un: &UnaryExpr<'_>) -> Result<ExprInfo> {
    let operand = compiler.compile_value(un.operand)?;
    match un.op {
        UnaryOp::Neg => {
            let opcode = Opcode::negate(operand.ty.kind())
                .filter(|_| operand.ty.is_numeric())
                .ok_or_else(|| {
                    CompilationError::mismatch(
                        un.span,
                        format!("cannot negate '{}'", operand.ty),
                    )
                })?;
            compiler.emitter().emit(opcode);
            let ty = if operand.ty.kind() == ValueKind::Int {
                Type::Int
            } else {
                operand.ty
            };
            Ok(ExprInfo::temporary(ty))
        }
        UnaryOp::LogicalNot => {
            expect_bool(&operand.ty, "operand of '!'", un.span)?;
            let emitter = compiler.emitter();
            emitter.emit(Opcode::Iconst1);
            emitter.emit(Opcode::Ixor);
            Ok(ExprInfo::temporary(Type::Boolean))
        }
    }
}
