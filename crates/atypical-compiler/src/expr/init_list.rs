//! Initializer expression compilation.
//!
//! - `new T(args)` allocates a struct or module and runs its constructor.
//! - `[T][e0, e1, ...]` builds an array from its elements.
//!
//! Array elements are evaluated left to right, so they sit below the new
//! array on the stack. They are stored from the last one back:
//!
//! ```text
//!     e0 .. en-1 arr                      ; category-1 element
//!     DUP_X1  SWAP  <idx>  SWAP  xASTORE  ; e0 .. en-2 arr
//!
//!     e0 .. en-1 arr                      ; category-2 element
//!     DUP_X2  <idx>  DUP2_X2  POP2  xASTORE
//! ```

use atypical_core::{CompilationError, MethodDescriptor, Type, format_arg_types};
use atypical_parser::ast::{ArrayInitExpr, NewExpr};
use atypical_registry::CONSTRUCTOR_NAME;

use super::{ExprCompiler, Result};
use crate::bytecode::Opcode;
use crate::expr_info::ExprInfo;

/// Compile `new T(args)`.
///
/// The constructor is chosen among the ones the type declares by the
/// arguments the caller wrote. Struct and module constructors carry a
/// trailing marker parameter, passed as `null`.
pub fn compile_new(compiler: &mut ExprCompiler<'_, '_>, new: &NewExpr<'_>) -> Result<ExprInfo> {
    let ty = compiler.ctx().resolve_known(&new.ty)?;
    let index = compiler.ctx().index;
    let decl = match &ty {
        Type::Object(name) => index.get(name),
        _ => None,
    }
    .filter(|decl| decl.is_instantiable())
    .ok_or_else(|| {
        CompilationError::invalid_operation(new.span, format!("cannot instantiate '{ty}'"))
    })?;

    let emitter = compiler.emitter();
    emitter.emit_type(Opcode::New, decl.name.clone());
    emitter.emit(Opcode::Dup);

    let args = compiler.compile_args(new.args)?;
    let ctor = decl
        .find_constructor(&args)
        .ok_or_else(|| CompilationError::NoApplicableConstructor {
            type_name: ty.to_string(),
            args: format_arg_types(&args),
            span: new.span,
        })?;

    let emitter = compiler.emitter();
    if ctor.has_marker() {
        emitter.emit_null();
    }
    emitter.invoke(
        Opcode::Invokespecial,
        &decl.name,
        CONSTRUCTOR_NAME,
        &MethodDescriptor::new(ctor.params.clone(), Type::Void),
    );
    Ok(ExprInfo::temporary(ty))
}

/// Compile `[T][elements]`.
pub fn compile_array_init(compiler: &mut ExprCompiler<'_, '_>, init: &ArrayInitExpr<'_>) -> Result<ExprInfo> {
    let element = compiler.ctx().resolve_known(&init.element_ty)?;
    if element.is_void() {
        return Err(CompilationError::mismatch(init.span, "array elements cannot be void"));
    }

    for expr in init.elements {
        let value = compiler.compile_value(expr)?;
        if !element.accepts(&value.ty) {
            return Err(CompilationError::mismatch(
                expr.span(),
                format!("array element of type '{}' where '{element}' is expected", value.ty),
            ));
        }
    }

    let count = init.elements.len();
    let length = i32::try_from(count).map_err(|_| {
        CompilationError::invalid_operation(init.span, "too many array elements")
    })?;

    let emitter = compiler.emitter();
    emitter.emit_int(length);
    emitter.new_array(&element);

    let wide = element.slot_size() == 2;
    for idx in (0..length).rev() {
        if wide {
            emitter.emit(Opcode::DupX2);
            emitter.emit_int(idx);
            emitter.emit(Opcode::Dup2X2);
            emitter.emit(Opcode::Pop2);
        } else {
            emitter.emit(Opcode::DupX1);
            emitter.emit(Opcode::Swap);
            emitter.emit_int(idx);
            emitter.emit(Opcode::Swap);
        }
        emitter.array_store(&element);
    }

    Ok(ExprInfo::temporary(Type::array_of(element)))
}
