//! Instruction emitter for method bodies.
//!
//! The [`CodeEmitter`] builds one method's instruction list. It picks the
//! compact encodings for constants, selects kind-specific loads, stores and
//! returns from a [`Type`], and manages labels.
//!
//! # Example
//!
//! ```
//! use atypical_compiler::emit::CodeEmitter;
//! use atypical_compiler::bytecode::Opcode;
//! use atypical_core::Type;
//!
//! let mut emitter = CodeEmitter::new();
//! emitter.load(&Type::Int, 0);
//! emitter.load(&Type::Int, 1);
//! emitter.emit(Opcode::Iadd);
//! emitter.emit_return(&Type::Int);
//!
//! let code = emitter.finish(2).unwrap();
//! assert_eq!(code.instructions.len(), 4);
//! ```

mod labels;

use atypical_core::{CompilationError, MethodDescriptor, Type};

use crate::bytecode::{Code, Constant, Instruction, Label, MemberRef, MethodRef, Opcode};
use labels::LabelManager;

/// Emits the instructions of a single method.
#[derive(Debug, Default)]
pub struct CodeEmitter {
    instructions: Vec<Instruction>,
    labels: LabelManager,
    /// Record line markers.
    line_numbers: bool,
    current_line: Option<u32>,
}

impl CodeEmitter {
    /// An emitter that does not record line numbers.
    pub fn new() -> Self {
        Self::default()
    }

    /// An emitter that records a line marker whenever the line changes.
    pub fn with_line_numbers() -> Self {
        Self {
            line_numbers: true,
            ..Self::default()
        }
    }

    /// Set the source line of the following instructions.
    pub fn set_line(&mut self, line: u32) {
        if self.line_numbers && line > 0 && self.current_line != Some(line) {
            self.current_line = Some(line);
            self.instructions.push(Instruction::Line(line));
        }
    }

    /// Instructions emitted so far.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    // ==========================================================================
    // Positions
    // ==========================================================================

    /// Current position, for a later [`insert`](Self::insert).
    pub fn mark(&self) -> usize {
        self.instructions.len()
    }

    /// Insert instructions at a position returned by [`mark`](Self::mark).
    ///
    /// Used when a receiver has to be pushed or wrapped below arguments that
    /// were compiled before the call target was known.
    pub fn insert(&mut self, at: usize, insns: impl IntoIterator<Item = Instruction>) {
        let tail = self.instructions.split_off(at);
        self.instructions.extend(insns);
        self.instructions.extend(tail);
    }

    // ==========================================================================
    // Basic emission
    // ==========================================================================

    pub fn emit(&mut self, op: Opcode) {
        self.instructions.push(Instruction::Simple(op));
    }

    pub fn emit_insn(&mut self, insn: Instruction) {
        self.instructions.push(insn);
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    /// Push an int using the shortest encoding.
    pub fn emit_int(&mut self, value: i32) {
        match value {
            -1 => self.emit(Opcode::IconstM1),
            0 => self.emit(Opcode::Iconst0),
            1 => self.emit(Opcode::Iconst1),
            2 => self.emit(Opcode::Iconst2),
            3 => self.emit(Opcode::Iconst3),
            4 => self.emit(Opcode::Iconst4),
            5 => self.emit(Opcode::Iconst5),
            v if i8::try_from(v).is_ok() => {
                self.instructions.push(Instruction::Int(Opcode::Bipush, v))
            }
            v if i16::try_from(v).is_ok() => {
                self.instructions.push(Instruction::Int(Opcode::Sipush, v))
            }
            v => self.instructions.push(Instruction::Ldc(Constant::Int(v))),
        }
    }

    pub fn emit_long(&mut self, value: i64) {
        match value {
            0 => self.emit(Opcode::Lconst0),
            1 => self.emit(Opcode::Lconst1),
            v => self.instructions.push(Instruction::Ldc(Constant::Long(v))),
        }
    }

    pub fn emit_float(&mut self, value: f32) {
        // Bit comparison keeps -0.0 out of FCONST_0.
        match value.to_bits() {
            bits if bits == 0f32.to_bits() => self.emit(Opcode::Fconst0),
            bits if bits == 1f32.to_bits() => self.emit(Opcode::Fconst1),
            bits if bits == 2f32.to_bits() => self.emit(Opcode::Fconst2),
            _ => self.instructions.push(Instruction::Ldc(Constant::float(value))),
        }
    }

    pub fn emit_double(&mut self, value: f64) {
        match value.to_bits() {
            bits if bits == 0f64.to_bits() => self.emit(Opcode::Dconst0),
            bits if bits == 1f64.to_bits() => self.emit(Opcode::Dconst1),
            _ => self.instructions.push(Instruction::Ldc(Constant::double(value))),
        }
    }

    pub fn emit_bool(&mut self, value: bool) {
        self.emit(if value { Opcode::Iconst1 } else { Opcode::Iconst0 });
    }

    pub fn emit_string(&mut self, value: &str) {
        self.instructions
            .push(Instruction::Ldc(Constant::String(value.to_string())));
    }

    pub fn emit_null(&mut self) {
        self.emit(Opcode::AconstNull);
    }

    // ==========================================================================
    // Locals and returns
    // ==========================================================================

    pub fn load(&mut self, ty: &Type, slot: u16) {
        self.instructions
            .push(Instruction::Local(Opcode::load_for(ty.kind()), slot));
    }

    pub fn store(&mut self, ty: &Type, slot: u16) {
        self.instructions
            .push(Instruction::Local(Opcode::store_for(ty.kind()), slot));
    }

    pub fn emit_return(&mut self, ty: &Type) {
        self.emit(Opcode::return_for(ty.kind()));
    }

    /// Discard a value of type `ty`.
    pub fn emit_pop(&mut self, ty: &Type) {
        match ty.slot_size() {
            0 => {}
            1 => self.emit(Opcode::Pop),
            _ => self.emit(Opcode::Pop2),
        }
    }

    // ==========================================================================
    // Objects and arrays
    // ==========================================================================

    pub fn emit_type(&mut self, op: Opcode, class: impl Into<String>) {
        self.instructions.push(Instruction::Type(op, class.into()));
    }

    /// Allocate an array of `element` whose length is on the stack.
    pub fn new_array(&mut self, element: &Type) {
        match Opcode::newarray_code(element) {
            Some(code) => self
                .instructions
                .push(Instruction::Int(Opcode::Newarray, i32::from(code))),
            None => {
                let class = element
                    .class_operand()
                    .unwrap_or_else(|| atypical_core::OBJECT_CLASS.to_string());
                self.emit_type(Opcode::Anewarray, class);
            }
        }
    }

    pub fn array_load(&mut self, element: &Type) {
        self.emit(Opcode::array_load_for(element));
    }

    pub fn array_store(&mut self, element: &Type) {
        self.emit(Opcode::array_store_for(element));
    }

    pub fn field(&mut self, op: Opcode, owner: &str, name: &str, ty: &Type) {
        self.instructions.push(Instruction::Field(
            op,
            MemberRef::new(owner, name, ty.descriptor()),
        ));
    }

    /// Invoke `owner.name` with `descriptor`. `INVOKEINTERFACE` gets an
    /// interface method reference.
    pub fn invoke(&mut self, op: Opcode, owner: &str, name: &str, descriptor: &MethodDescriptor) {
        let mut method = MethodRef::new(owner, name, descriptor.to_string());
        if op == Opcode::Invokeinterface {
            method = method.interface();
        }
        self.instructions.push(Instruction::Invoke(op, method));
    }

    // ==========================================================================
    // Control flow
    // ==========================================================================

    pub fn new_label(&mut self) -> Label {
        self.labels.create()
    }

    /// Bind `label` to the current position.
    pub fn place_label(&mut self, label: Label) {
        if self.labels.bind(label) {
            self.instructions.push(Instruction::Label(label));
        }
    }

    pub fn jump(&mut self, op: Opcode, label: Label) {
        debug_assert!(op.is_jump(), "{op:?} is not a jump");
        self.instructions.push(Instruction::Jump(op, label));
    }

    /// Whether the last code-producing instruction can fall through.
    pub fn is_reachable_end(&self) -> bool {
        self.instructions
            .iter()
            .rev()
            .find(|i| i.opcode().is_some() || matches!(i, Instruction::Label(_)))
            .is_none_or(|i| i.falls_through())
    }

    /// Finish the method. Every referenced label must have been placed.
    pub fn finish(self, max_locals: u16) -> Result<Code, CompilationError> {
        for insn in &self.instructions {
            if let Instruction::Jump(_, label) = insn
                && !self.labels.is_bound(*label)
            {
                return Err(CompilationError::internal(format!(
                    "jump to unplaced label {label}"
                )));
            }
        }
        Ok(Code::new(self.instructions, max_locals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(emitter: &CodeEmitter) -> Vec<Opcode> {
        emitter
            .instructions()
            .iter()
            .filter_map(Instruction::opcode)
            .collect()
    }

    #[test]
    fn int_encodings() {
        let mut e = CodeEmitter::new();
        for v in [-1, 5, 100, -128, 1000, 40_000, i32::MIN] {
            e.emit_int(v);
        }
        assert_eq!(
            ops(&e),
            vec![
                Opcode::IconstM1,
                Opcode::Iconst5,
                Opcode::Bipush,
                Opcode::Bipush,
                Opcode::Sipush,
                Opcode::Ldc,
                Opcode::Ldc,
            ]
        );
    }

    #[test]
    fn wide_constants() {
        let mut e = CodeEmitter::new();
        e.emit_long(1);
        e.emit_long(7);
        e.emit_float(-0.0);
        e.emit_double(1.0);
        assert_eq!(
            ops(&e),
            vec![Opcode::Lconst1, Opcode::Ldc2W, Opcode::Ldc, Opcode::Dconst1]
        );
    }

    #[test]
    fn kind_specific_locals() {
        let mut e = CodeEmitter::new();
        e.load(&Type::Boolean, 1);
        e.store(&Type::Long, 2);
        e.load(&Type::string(), 4);
        e.emit_pop(&Type::Double);
        e.emit_pop(&Type::Void);
        assert_eq!(
            ops(&e),
            vec![Opcode::Iload, Opcode::Lstore, Opcode::Aload, Opcode::Pop2]
        );
    }

    #[test]
    fn insert_below_arguments() {
        let mut e = CodeEmitter::new();
        let mark = e.mark();
        e.emit_int(1);
        e.insert(mark, [Instruction::Local(Opcode::Aload, 0)]);
        assert_eq!(ops(&e), vec![Opcode::Aload, Opcode::Iconst1]);
    }

    #[test]
    fn unplaced_label_is_an_error() {
        let mut e = CodeEmitter::new();
        let label = e.new_label();
        e.jump(Opcode::Goto, label);
        assert!(e.finish(0).is_err());

        let mut e = CodeEmitter::new();
        let label = e.new_label();
        e.jump(Opcode::Goto, label);
        e.place_label(label);
        e.emit(Opcode::Return);
        assert!(e.finish(0).is_ok());
    }

    #[test]
    fn reachability() {
        let mut e = CodeEmitter::new();
        assert!(e.is_reachable_end());
        e.emit(Opcode::Return);
        assert!(!e.is_reachable_end());
        let label = e.new_label();
        e.place_label(label);
        assert!(e.is_reachable_end());
    }

    #[test]
    fn line_markers_only_on_change() {
        let mut e = CodeEmitter::with_line_numbers();
        e.set_line(3);
        e.emit(Opcode::Nop);
        e.set_line(3);
        e.set_line(4);
        let lines: Vec<_> = e
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Line(_)))
            .collect();
        assert_eq!(lines.len(), 2);

        let mut e = CodeEmitter::new();
        e.set_line(3);
        assert!(e.instructions().is_empty());
    }
}
