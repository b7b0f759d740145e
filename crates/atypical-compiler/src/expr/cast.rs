//! Cast expression compilation.
//!
//! `cast<T>(expr)` covers three cases:
//!
//! - numeric to numeric: a conversion opcode sequence (`I2L`, `D2I`, ...)
//! - reference to class or array: `CHECKCAST`
//! - reference to trait: a [`TraitCastStrategy`] producing an adapter
//!
//! The target VM has no traits. A struct becomes a trait value by being
//! wrapped in its adapter class `Trait$Struct`, and a cast has to build that
//! adapter. When the operand's static type does not name the struct (it may
//! be `obj` or another trait), the adapter name is only known at runtime,
//! which is what [`ReflectiveCast`] handles.

use atypical_core::{CompilationError, MethodDescriptor, OBJECT_CLASS, STRING_CLASS, Type, to_binary_name};
use atypical_parser::ast::CastExpr;
use atypical_registry::library::{CHAR_SEQUENCE_CLASS, CLASS_CLASS, CONSTRUCTOR_CLASS};

use super::calls::adapter_wrap;
use super::{ExprCompiler, Result};
use crate::bytecode::Opcode;
use crate::expr_info::ExprInfo;
use crate::options::TraitCastMode;

/// Compile a cast expression: `cast<Type>(expr)`
pub fn compile_cast(compiler: &mut ExprCompiler<'_, '_>, cast: &CastExpr<'_>) -> Result<ExprInfo> {
    let target = compiler.ctx().resolve_known(&cast.target)?;
    let operand = compiler.compile_value(cast.expr)?.ty;

    // Identity cast
    if operand == target {
        return Ok(ExprInfo::temporary(target));
    }

    let invalid = || CompilationError::InvalidCast {
        from: operand.to_string(),
        to: target.to_string(),
        span: cast.span,
    };

    if operand.is_numeric() && target.is_numeric() {
        for op in numeric_conversion(&operand, &target) {
            compiler.emitter().emit(op);
        }
        return Ok(ExprInfo::temporary(target));
    }

    if !operand.is_reference() || !target.is_reference() {
        return Err(invalid());
    }

    let index = compiler.ctx().index;
    match &target {
        Type::Object(name) if index.is_trait(name) && !operand.is_unknown() => {
            let strategy = strategy_for(compiler.ctx().options.trait_casts);
            strategy.emit(compiler, &operand, name)?;
        }
        _ => {
            let class = target.class_operand().ok_or_else(invalid)?;
            compiler.emitter().emit_type(Opcode::Checkcast, class);
        }
    }
    Ok(ExprInfo::temporary(target))
}

/// Opcodes converting a numeric value of type `from` to `to`.
///
/// Byte, short and char targets narrow through int.
fn numeric_conversion(from: &Type, to: &Type) -> Vec<Opcode> {
    let mut ops = Vec::with_capacity(2);
    let to_int = match from {
        Type::Long => Some(Opcode::L2i),
        Type::Float => Some(Opcode::F2i),
        Type::Double => Some(Opcode::D2i),
        _ => None,
    };

    match (from, to) {
        (Type::Long, Type::Float) => ops.push(Opcode::L2f),
        (Type::Long, Type::Double) => ops.push(Opcode::L2d),
        (Type::Float, Type::Long) => ops.push(Opcode::F2l),
        (Type::Float, Type::Double) => ops.push(Opcode::F2d),
        (Type::Double, Type::Long) => ops.push(Opcode::D2l),
        (Type::Double, Type::Float) => ops.push(Opcode::D2f),
        (_, Type::Long) => ops.push(Opcode::I2l),
        (_, Type::Float) => ops.push(Opcode::I2f),
        (_, Type::Double) => ops.push(Opcode::I2d),
        (_, int_like) => {
            ops.extend(to_int);
            match int_like {
                Type::Byte => ops.push(Opcode::I2b),
                Type::Char => ops.push(Opcode::I2c),
                Type::Short => ops.push(Opcode::I2s),
                _ => {}
            }
        }
    }
    ops
}

/// Turns a reference on the stack into an instance of a trait.
///
/// Implementations leave exactly one reference, typed as the trait, where
/// the operand was.
pub trait TraitCastStrategy {
    fn emit(&self, compiler: &mut ExprCompiler<'_, '_>, operand: &Type, trait_name: &str) -> Result<()>;
}

/// Pick the strategy for a [`TraitCastMode`].
pub fn strategy_for(mode: TraitCastMode) -> &'static dyn TraitCastStrategy {
    match mode {
        TraitCastMode::Reflective => &ReflectiveCast,
        TraitCastMode::Static => &StaticAdapterCast,
    }
}

/// Builds the adapter name from the operand's runtime class and
/// instantiates it through reflection:
///
/// ```text
/// Class.forName("<Trait>$" + obj.getClass().getName().replace(".", "_"))
///     .getDeclaredConstructor(new Class[] { obj.getClass() })
///     .newInstance(new Object[] { obj })
/// ```
///
/// The resulting name equals [`atypical_registry::adapter_name`] for every
/// struct, so the lookup finds the adapter generated for the pair.
pub struct ReflectiveCast;

impl TraitCastStrategy for ReflectiveCast {
    fn emit(&self, compiler: &mut ExprCompiler<'_, '_>, _operand: &Type, trait_name: &str) -> Result<()> {
        let object = Type::object();
        let string = Type::string();
        let class = Type::from_qualified_name(CLASS_CLASS);
        let span = compiler.ctx().span();
        let tmp = compiler.ctx_mut().scope.reserve_temp(&object, span)?;
        let prefix = format!("{}$", to_binary_name(trait_name));

        let get_class = MethodDescriptor::new(vec![], class.clone());
        let string_to_string = MethodDescriptor::new(vec![string.clone()], string.clone());
        let char_sequence = Type::from_qualified_name(CHAR_SEQUENCE_CLASS);

        let emitter = compiler.emitter();
        emitter.store(&object, tmp);

        // Adapter class name
        emitter.emit_string(&prefix);
        emitter.load(&object, tmp);
        emitter.invoke(Opcode::Invokevirtual, OBJECT_CLASS, "getClass", &get_class);
        emitter.invoke(
            Opcode::Invokevirtual,
            CLASS_CLASS,
            "getName",
            &MethodDescriptor::new(vec![], string.clone()),
        );
        emitter.emit_string(".");
        emitter.emit_string("_");
        emitter.invoke(
            Opcode::Invokevirtual,
            STRING_CLASS,
            "replace",
            &MethodDescriptor::new(vec![char_sequence.clone(), char_sequence], string.clone()),
        );
        emitter.invoke(Opcode::Invokevirtual, STRING_CLASS, "concat", &string_to_string);
        emitter.invoke(
            Opcode::Invokestatic,
            CLASS_CLASS,
            "forName",
            &MethodDescriptor::new(vec![string], class.clone()),
        );

        // Constructor taking the operand's runtime class
        emitter.emit(Opcode::Iconst1);
        emitter.emit_type(Opcode::Anewarray, CLASS_CLASS);
        emitter.emit(Opcode::Dup);
        emitter.emit(Opcode::Iconst0);
        emitter.load(&object, tmp);
        emitter.invoke(Opcode::Invokevirtual, OBJECT_CLASS, "getClass", &get_class);
        emitter.emit(Opcode::Aastore);
        emitter.invoke(
            Opcode::Invokevirtual,
            CLASS_CLASS,
            "getDeclaredConstructor",
            &MethodDescriptor::new(
                vec![Type::array_of(class)],
                Type::from_qualified_name(CONSTRUCTOR_CLASS),
            ),
        );

        // Instantiate with the operand
        emitter.emit(Opcode::Iconst1);
        emitter.emit_type(Opcode::Anewarray, OBJECT_CLASS);
        emitter.emit(Opcode::Dup);
        emitter.emit(Opcode::Iconst0);
        emitter.load(&object, tmp);
        emitter.emit(Opcode::Aastore);
        emitter.invoke(
            Opcode::Invokevirtual,
            CONSTRUCTOR_CLASS,
            "newInstance",
            &MethodDescriptor::new(vec![Type::array_of(object.clone())], object),
        );

        emitter.emit_type(Opcode::Checkcast, trait_name);
        Ok(())
    }
}

/// Constructs the adapter directly when the operand's static type is a
/// struct known to implement the trait; falls back to [`ReflectiveCast`]
/// otherwise.
pub struct StaticAdapterCast;

impl TraitCastStrategy for StaticAdapterCast {
    fn emit(&self, compiler: &mut ExprCompiler<'_, '_>, operand: &Type, trait_name: &str) -> Result<()> {
        let index = compiler.ctx().index;
        let adapter = operand
            .internal_name()
            .and_then(|name| index.adapter_for(trait_name, name));
        match adapter {
            Some(adapter) => {
                for insn in adapter_wrap(&adapter.name, operand) {
                    compiler.emitter().emit_insn(insn);
                }
                Ok(())
            }
            None => ReflectiveCast.emit(compiler, operand, trait_name),
        }
    }
}
