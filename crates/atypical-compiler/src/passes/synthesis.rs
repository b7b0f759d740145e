//! Constructor synthesis (pass 2).
//!
//! Structs and modules get a constructor storing each parameter into the
//! field of the same position; the trailing marker parameter is ignored.
//! Adapters get a constructor storing their single parameter into
//! `wrapped`.
//!
//! ```text
//!     ALOAD_0
//!     INVOKESPECIAL java/lang/Object.<init>()V
//!     ALOAD_0  <xLOAD i>  PUTFIELD field_i      ; per field
//!     RETURN
//! ```

use atypical_core::{AtypicalError, CompilationError, MethodDescriptor, OBJECT_CLASS, Type};
use atypical_registry::{MethodSig, StructuralIndex, TypeDecl};

use super::{BodyMap, MethodKey};
use crate::bytecode::{Code, Opcode};
use crate::emit::CodeEmitter;

/// Generate every constructor body in `index`.
#[tracing::instrument(skip_all)]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn synthesize(index: &StructuralIndex, bodies: &mut BodyMap) -> Result<(), AtypicalError> {
    for decl in index.emitted() {
        if !(decl.is_instantiable() || decl.adapter.is_some()) {
            continue;
        }
        for ctor in decl.methods.iter().filter(|m| m.is_constructor()) {
            let code = constructor_code(decl, ctor).map_err(|source| AtypicalError::Compilation {
                file: decl.source_file.clone().unwrap_or_else(|| decl.name.clone()),
                source,
            })?;
            tracing::trace!(owner = %decl.name, descriptor = %ctor.descriptor(), "synthesized constructor");
            bodies.insert(MethodKey::new(&decl.name, ctor), code);
        }
    }
    Ok(())
}

/// Body of a reserved constructor: super call, then one store per
/// instance field, in declaration order.
pub fn constructor_code(decl: &TypeDecl, ctor: &MethodSig) -> Result<Code, CompilationError> {
    let this = Type::from_qualified_name(decl.name.clone());
    let superclass = decl.superclass.as_deref().unwrap_or(OBJECT_CLASS);

    let mut emitter = CodeEmitter::new();
    emitter.load(&this, 0);
    emitter.invoke(
        Opcode::Invokespecial,
        superclass,
        &ctor.name,
        &MethodDescriptor::void(),
    );

    let fields = decl.fields.iter().filter(|f| !f.is_static);
    let mut slot = 1;
    for (field, param) in fields.zip(ctor.source_params()) {
        if field.ty != *param {
            return Err(CompilationError::internal(format!(
                "constructor of '{}' does not match field '{}'",
                decl.name, field.name
            )));
        }
        emitter.load(&this, 0);
        emitter.load(param, slot);
        emitter.field(Opcode::Putfield, &decl.name, &field.name, &field.ty);
        slot += param.slot_size();
    }
    emitter.emit(Opcode::Return);

    let max_locals = 1 + ctor.descriptor().param_slots();
    emitter.finish(max_locals)
}
