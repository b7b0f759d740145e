//! Binary operator compilation.
//!
//! Arithmetic picks its opcode family from the operand kind, and both
//! operands must have the same kind. `&&` and `||` evaluate both sides and
//! combine them with `IAND`/`IOR`. Comparisons leave 0 or 1 on the stack:
//!
//! ```text
//!     <left> <right>
//!     IF_xx  T        ; or xCMPx + IFxx for long, float and double
//!     ICONST_0
//!     GOTO   E
//! T:  ICONST_1
//! E:
//! ```

use atypical_core::{CompilationError, Span, Type, ValueKind};
use atypical_parser::ast::{BinaryExpr, BinaryOp};

use super::{ExprCompiler, Result, expect_bool};
use crate::bytecode::{Comparison, Opcode};
use crate::expr_info::ExprInfo;

/// Compile a binary expression.
pub fn compile_binary(compiler: &mut ExprCompiler<'_, '_>, bin: &BinaryExpr<'_>) -> Result<ExprInfo> {
    let left = compiler.compile_value(bin.left)?;
    let right = compiler.compile_value(bin.right)?;

    if bin.op.is_logical() {
        return compile_logical(compiler, bin.op, &left.ty, &right.ty, bin.span);
    }
    if let Some(cmp) = Comparison::from_op(bin.op) {
        return compile_comparison(compiler, cmp, &left.ty, &right.ty, bin);
    }
    compile_arithmetic(compiler, bin.op, &left.ty, &right.ty, bin.span)
}

fn compile_logical(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: &Type,
    right: &Type,
    span: Span,
) -> Result<ExprInfo> {
    expect_bool(left, &format!("left operand of '{op}'"), span)?;
    expect_bool(right, &format!("right operand of '{op}'"), span)?;
    let opcode = if op == BinaryOp::LogicalAnd {
        Opcode::Iand
    } else {
        Opcode::Ior
    };
    compiler.emitter().emit(opcode);
    Ok(ExprInfo::temporary(Type::Boolean))
}

fn compile_arithmetic(
    compiler: &mut ExprCompiler<'_, '_>,
    op: BinaryOp,
    left: &Type,
    right: &Type,
    span: Span,
) -> Result<ExprInfo> {
    if !left.is_numeric() || !right.is_numeric() || left.kind() != right.kind() {
        return Err(operand_mismatch(op, left, right, span));
    }
    let kind = left.kind();
    let opcode = Opcode::arithmetic(op, kind)
        .ok_or_else(|| CompilationError::internal(format!("no opcode for '{op}' on {left}")))?;
    compiler.emitter().emit(opcode);

    // Narrow int kinds compute as int.
    let ty = if kind == ValueKind::Int {
        Type::Int
    } else {
        left.clone()
    };
    Ok(ExprInfo::temporary(ty))
}

fn compile_comparison(
    compiler: &mut ExprCompiler<'_, '_>,
    cmp: Comparison,
    left: &Type,
    right: &Type,
    bin: &BinaryExpr<'_>,
) -> Result<ExprInfo> {
    let jump = comparison_jump(compiler, cmp, left, right)
        .ok_or_else(|| operand_mismatch(bin.op, left, right, bin.span))?;

    let emitter = compiler.emitter();
    let on_true = emitter.new_label();
    let end = emitter.new_label();
    emitter.jump(jump, on_true);
    emitter.emit(Opcode::Iconst0);
    emitter.jump(Opcode::Goto, end);
    emitter.place_label(on_true);
    emitter.emit(Opcode::Iconst1);
    emitter.place_label(end);
    Ok(ExprInfo::temporary(Type::Boolean))
}

/// Emit any compare instruction and return the conditional jump taken when
/// the comparison holds. `None` when the operands cannot be compared.
fn comparison_jump(
    compiler: &mut ExprCompiler<'_, '_>,
    cmp: Comparison,
    left: &Type,
    right: &Type,
) -> Option<Opcode> {
    if left.is_reference() && right.is_reference() {
        return Opcode::if_acmp(cmp);
    }
    if left.kind() != right.kind() {
        return None;
    }
    match left.kind() {
        ValueKind::Int => {
            // Booleans only compare for equality, and only with booleans.
            let booleans = (*left == Type::Boolean, *right == Type::Boolean);
            match booleans {
                (true, true) if cmp.is_equality() => Some(Opcode::if_icmp(cmp)),
                (false, false) => Some(Opcode::if_icmp(cmp)),
                _ => None,
            }
        }
        kind @ (ValueKind::Long | ValueKind::Float | ValueKind::Double) => {
            let compare = Opcode::compare(kind, cmp)?;
            compiler.emitter().emit(compare);
            Some(Opcode::if_zero(cmp))
        }
        ValueKind::Reference | ValueKind::Void => None,
    }
}

fn operand_mismatch(op: BinaryOp, left: &Type, right: &Type, span: Span) -> CompilationError {
    CompilationError::mismatch(
        span,
        format!("operator '{op}' cannot be applied to '{left}' and '{right}'"),
    )
}

#[cfg(test)]
mod tests {
    use atypical_core::CompilationError;

    use crate::bytecode::Opcode;
    use crate::test_support::{compile_err, compile_ok, ops};

    #[test]
    fn arithmetic_by_kind() {
        let classes = compile_ok(
            "fn i(a: int, b: int): int { return a % b; }\n\
             fn l(a: long, b: long): long { return a * b; }\n\
             fn d(a: double, b: double): double { return a - b; }",
        );
        assert!(ops(&classes, "main", "i").contains(&Opcode::Irem));
        assert!(ops(&classes, "main", "l").contains(&Opcode::Lmul));
        assert!(ops(&classes, "main", "d").contains(&Opcode::Dsub));
    }

    #[test]
    fn int_comparison_shape() {
        let classes = compile_ok("fn lt(a: int, b: int): bool { return a < b; }");
        assert_eq!(
            ops(&classes, "main", "lt"),
            vec![
                Opcode::Iload,
                Opcode::Iload,
                Opcode::IfIcmplt,
                Opcode::Iconst0,
                Opcode::Goto,
                Opcode::Iconst1,
                Opcode::Ireturn,
            ]
        );
    }

    #[test]
    fn wide_comparisons_use_compare_instructions() {
        let classes = compile_ok(
            "fn l(a: long, b: long): bool { return a >= b; }\n\
             fn f(a: float, b: float): bool { return a < b; }\n\
             fn d(a: double, b: double): bool { return a == b; }",
        );
        let l = ops(&classes, "main", "l");
        assert!(l.contains(&Opcode::Lcmp) && l.contains(&Opcode::Ifge));
        let f = ops(&classes, "main", "f");
        assert!(f.contains(&Opcode::Fcmpg) && f.contains(&Opcode::Iflt));
        let d = ops(&classes, "main", "d");
        assert!(d.contains(&Opcode::Dcmpl) && d.contains(&Opcode::Ifeq));
    }

    #[test]
    fn reference_equality() {
        let classes = compile_ok("fn f(s: string): bool { return s != null; }");
        assert!(ops(&classes, "main", "f").contains(&Opcode::IfAcmpne));
        let err = compile_err("fn f(s: string): bool { return s < s; }");
        assert!(matches!(err.as_compilation(), Some(CompilationError::TypeMismatch { .. })));
    }

    #[test]
    fn eager_logical_operators() {
        let classes = compile_ok("fn f(a: bool, b: bool): bool { return a && b || a; }");
        let ops = ops(&classes, "main", "f");
        assert!(ops.contains(&Opcode::Iand) && ops.contains(&Opcode::Ior));
        assert!(!ops.contains(&Opcode::Ifeq));
    }

    #[test]
    fn mismatched_operands() {
        for source in [
            "fn f(a: int, b: long): long { return a + b; }",
            "fn f(a: int): bool { return a && true; }",
            "fn f(a: bool, b: bool): bool { return a < b; }",
            "fn f(a: string): string { return a + a; }",
        ] {
            let err = compile_err(source);
            assert!(
                matches!(err.as_compilation(), Some(CompilationError::TypeMismatch { .. })),
                "{source}: {err}"
            );
        }
    }
}
