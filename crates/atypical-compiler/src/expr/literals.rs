//! Literal expression compilation.
//!
//! Compiles literal values (numbers, strings, booleans, null).

use atypical_core::Type;
use atypical_parser::ast::LiteralKind;

use super::{ExprCompiler, Result};
use crate::expr_info::ExprInfo;

/// Compile a literal expression.
pub fn compile_literal(compiler: &mut ExprCompiler<'_, '_>, kind: &LiteralKind<'_>) -> Result<ExprInfo> {
    let emitter = compiler.emitter();
    let ty = match kind {
        LiteralKind::Int(value) => {
            emitter.emit_int(*value);
            Type::Int
        }
        LiteralKind::Long(value) => {
            emitter.emit_long(*value);
            Type::Long
        }
        LiteralKind::Float(value) => {
            emitter.emit_float(*value);
            Type::Float
        }
        LiteralKind::Double(value) => {
            emitter.emit_double(*value);
            Type::Double
        }
        LiteralKind::Bool(value) => {
            emitter.emit_bool(*value);
            Type::Boolean
        }
        LiteralKind::String(value) => {
            emitter.emit_string(value);
            Type::string()
        }
        // Null unifies with any reference type.
        LiteralKind::Null => {
            emitter.emit_null();
            Type::Unknown
        }
    };
    Ok(ExprInfo::literal(ty))
}
