//! Operand stack depth analysis.
//!
//! Walks the instruction list as a control flow graph (fall through plus
//! jump edges), checking that every instruction is reached with a single
//! stack depth and recording the deepest point.

use atypical_compiler::bytecode::{Instruction, Label, Opcode};
use atypical_core::{DescriptorError, EmitError, MethodDescriptor, Type};
use rustc_hash::FxHashMap;

/// Values popped and pushed by one instruction, in stack slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEffect {
    pub pops: u16,
    pub pushes: u16,
}

const fn effect(pops: u16, pushes: u16) -> StackEffect {
    StackEffect { pops, pushes }
}

/// Stack effect of `insn`. Labels and line markers have none.
pub fn stack_effect(insn: &Instruction) -> Result<StackEffect, EmitError> {
    use Opcode::*;

    let op = match insn {
        Instruction::Label(_) | Instruction::Line(_) => return Ok(effect(0, 0)),
        Instruction::Ldc(constant) => {
            return Ok(effect(0, if constant.is_wide() { 2 } else { 1 }));
        }
        Instruction::Field(op, field) => {
            let size = Type::parse_descriptor(&field.descriptor)?.slot_size();
            return Ok(match op {
                Getstatic => effect(0, size),
                Putstatic => effect(size, 0),
                Getfield => effect(1, size),
                _ => effect(1 + size, 0),
            });
        }
        Instruction::Invoke(op, method) => {
            let descriptor = MethodDescriptor::parse(&method.descriptor)?;
            let receiver = u16::from(*op != Invokestatic);
            return Ok(effect(
                descriptor.param_slots() + receiver,
                descriptor.ret.slot_size(),
            ));
        }
        Instruction::Simple(op)
        | Instruction::Int(op, _)
        | Instruction::Local(op, _)
        | Instruction::Type(op, _)
        | Instruction::Jump(op, _) => *op,
    };

    Ok(match op {
        Nop | Wide | Goto | Return => effect(0, 0),
        Swap => effect(2, 2),
        AconstNull | IconstM1 | Iconst0 | Iconst1 | Iconst2 | Iconst3 | Iconst4 | Iconst5
        | Fconst0 | Fconst1 | Fconst2 | Bipush | Sipush | Ldc | LdcW | New => effect(0, 1),
        Lconst0 | Lconst1 | Dconst0 | Dconst1 | Ldc2W => effect(0, 2),
        Iload | Fload | Aload => effect(0, 1),
        Lload | Dload => effect(0, 2),
        Istore | Fstore | Astore => effect(1, 0),
        Lstore | Dstore => effect(2, 0),
        Iaload | Faload | Aaload | Baload | Caload | Saload => effect(2, 1),
        Laload | Daload => effect(2, 2),
        Iastore | Fastore | Aastore | Bastore | Castore | Sastore => effect(3, 0),
        Lastore | Dastore => effect(4, 0),
        Pop => effect(1, 0),
        Pop2 => effect(2, 0),
        Dup => effect(1, 2),
        DupX1 => effect(2, 3),
        DupX2 => effect(3, 4),
        Dup2 => effect(2, 4),
        Dup2X1 => effect(3, 5),
        Dup2X2 => effect(4, 6),
        Iadd | Isub | Imul | Idiv | Irem | Iand | Ior | Ixor | Fadd | Fsub | Fmul | Fdiv
        | Frem => effect(2, 1),
        Ladd | Lsub | Lmul | Ldiv | Lrem | Dadd | Dsub | Dmul | Ddiv | Drem => effect(4, 2),
        Ineg | Fneg => effect(1, 1),
        Lneg | Dneg => effect(2, 2),
        I2l | I2d | F2l | F2d => effect(1, 2),
        I2f | F2i | I2b | I2c | I2s => effect(1, 1),
        L2i | L2f | D2i | D2f => effect(2, 1),
        L2d | D2l => effect(2, 2),
        Lcmp | Dcmpl | Dcmpg => effect(4, 1),
        Fcmpl | Fcmpg => effect(2, 1),
        Ifeq | Ifne | Iflt | Ifge | Ifgt | Ifle | Ifnull | Ifnonnull => effect(1, 0),
        IfIcmpeq | IfIcmpne | IfIcmplt | IfIcmpge | IfIcmpgt | IfIcmple | IfAcmpeq
        | IfAcmpne => effect(2, 0),
        Ireturn | Freturn | Areturn => effect(1, 0),
        Lreturn | Dreturn => effect(2, 0),
        Newarray | Anewarray | Arraylength | Checkcast | Instanceof => effect(1, 1),
        Getstatic | Putstatic | Getfield | Putfield | Invokevirtual | Invokespecial
        | Invokestatic | Invokeinterface => {
            return Err(EmitError::Descriptor(DescriptorError::Invalid {
                descriptor: op.mnemonic(),
                reason: "member instruction without a reference".to_string(),
            }));
        }
    })
}

/// Maximum operand stack depth of `instructions`.
pub fn max_stack(method: &str, instructions: &[Instruction]) -> Result<u16, EmitError> {
    let labels: FxHashMap<Label, usize> = instructions
        .iter()
        .enumerate()
        .filter_map(|(i, insn)| match insn {
            Instruction::Label(label) => Some((*label, i)),
            _ => None,
        })
        .collect();

    let mut depths: Vec<Option<u16>> = vec![None; instructions.len()];
    let mut worklist = Vec::new();
    let mut max = 0;

    let reach = |index: usize, depth: u16, depths: &mut Vec<Option<u16>>, worklist: &mut Vec<usize>| {
        if index >= depths.len() {
            return Ok(());
        }
        match depths[index] {
            Some(first) if first != depth => Err(EmitError::StackMismatch {
                method: method.to_string(),
                index,
                first,
                second: depth,
            }),
            Some(_) => Ok(()),
            None => {
                depths[index] = Some(depth);
                worklist.push(index);
                Ok(())
            }
        }
    };

    reach(0, 0, &mut depths, &mut worklist)?;
    while let Some(index) = worklist.pop() {
        let insn = &instructions[index];
        let depth = depths[index].unwrap_or(0);
        let StackEffect { pops, pushes } = stack_effect(insn)?;
        if depth < pops {
            return Err(EmitError::StackUnderflow {
                method: method.to_string(),
                index,
            });
        }
        let after = depth - pops + pushes;
        max = max.max(after);

        if let Instruction::Jump(op, label) = insn {
            let target = *labels.get(label).ok_or_else(|| EmitError::UnboundLabel {
                method: method.to_string(),
                label: label.0,
            })?;
            reach(target, after, &mut depths, &mut worklist)?;
            if *op == Opcode::Goto {
                continue;
            }
        }
        if insn.falls_through() {
            reach(index + 1, after, &mut depths, &mut worklist)?;
        }
    }
    Ok(max)
}
