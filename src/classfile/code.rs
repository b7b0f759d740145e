//! Method body assembly: symbolic instructions to `Code` attribute bytes.
//!
//! Layout runs in two steps. The first resolves every constant pool operand
//! and fixes the size, and so the offset, of each instruction; the second
//! encodes them with jump offsets taken from the label positions.

use atypical_compiler::bytecode::{Code, Instruction, Label, Opcode};
use atypical_core::{EmitError, MethodDescriptor};
use rustc_hash::FxHashMap;

use super::bytes::ByteWriter;
use super::constant_pool::ConstantPool;
use super::stack::max_stack;

/// Largest method body the class file format allows.
pub const MAX_CODE_LENGTH: usize = 65_535;

const ILOAD_0: u8 = 0x1a;
const ISTORE_0: u8 = 0x3b;

/// An assembled method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledCode {
    pub bytes: Vec<u8>,
    pub max_stack: u16,
    pub max_locals: u16,
    /// `(start_pc, line)` pairs.
    pub line_numbers: Vec<(u16, u16)>,
}

/// Pool operand and size chosen for each instruction.
#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: usize,
    operand: u16,
}

pub fn assemble(method: &str, code: &Code, pool: &mut ConstantPool) -> Result<AssembledCode, EmitError> {
    let max_stack = max_stack(method, &code.instructions)?;

    let mut slots = Vec::with_capacity(code.instructions.len());
    let mut labels: FxHashMap<Label, usize> = FxHashMap::default();
    let mut line_numbers: Vec<(u16, u16)> = Vec::new();
    let mut offset = 0usize;

    for insn in &code.instructions {
        let operand = pool_operand(insn, pool)?;
        slots.push(Slot { offset, operand });
        match insn {
            Instruction::Label(label) => {
                labels.insert(*label, offset);
            }
            Instruction::Line(line) => {
                let entry = (offset as u16, (*line).min(u32::from(u16::MAX)) as u16);
                match line_numbers.last_mut() {
                    Some(last) if usize::from(last.0) == offset => *last = entry,
                    _ => line_numbers.push(entry),
                }
            }
            _ => {}
        }
        offset += encoded_size(insn, operand);
    }

    if offset > MAX_CODE_LENGTH {
        return Err(EmitError::CodeTooLarge {
            method: method.to_string(),
            size: offset,
        });
    }

    let mut out = ByteWriter::new();
    for (insn, slot) in code.instructions.iter().zip(&slots) {
        encode(method, insn, *slot, &labels, &mut out)?;
    }

    Ok(AssembledCode {
        bytes: out.into_bytes(),
        max_stack,
        max_locals: code.max_locals,
        line_numbers,
    })
}

fn pool_operand(insn: &Instruction, pool: &mut ConstantPool) -> Result<u16, EmitError> {
    Ok(match insn {
        Instruction::Ldc(constant) => pool.constant(constant)?,
        Instruction::Type(_, class) => pool.class(class)?,
        Instruction::Field(_, field) => pool.field_ref(&field.owner, &field.name, &field.descriptor)?,
        Instruction::Invoke(_, method) => {
            pool.method_ref(&method.owner, &method.name, &method.descriptor, method.interface)?
        }
        _ => 0,
    })
}

fn encoded_size(insn: &Instruction, operand: u16) -> usize {
    match insn {
        Instruction::Label(_) | Instruction::Line(_) => 0,
        Instruction::Simple(_) => 1,
        Instruction::Int(Opcode::Sipush, _) => 3,
        Instruction::Int(_, _) => 2,
        Instruction::Local(_, slot) => match slot {
            0..=3 => 1,
            4..=255 => 2,
            _ => 4,
        },
        Instruction::Ldc(constant) if constant.is_wide() || operand > 255 => 3,
        Instruction::Ldc(_) => 2,
        Instruction::Invoke(Opcode::Invokeinterface, _) => 5,
        Instruction::Type(..) | Instruction::Field(..) | Instruction::Invoke(..) | Instruction::Jump(..) => 3,
    }
}

fn encode(
    method: &str,
    insn: &Instruction,
    slot: Slot,
    labels: &FxHashMap<Label, usize>,
    out: &mut ByteWriter,
) -> Result<(), EmitError> {
    match insn {
        Instruction::Label(_) | Instruction::Line(_) => {}
        Instruction::Simple(op) => out.u8((*op).into()),
        Instruction::Int(op, value) => {
            out.u8((*op).into());
            match op {
                Opcode::Sipush => out.i16(*value as i16),
                Opcode::Bipush => out.u8(*value as i8 as u8),
                _ => out.u8(*value as u8),
            }
        }
        Instruction::Local(op, index) => encode_local(*op, *index, out),
        Instruction::Ldc(constant) => {
            if constant.is_wide() {
                out.u8(Opcode::Ldc2W.into());
                out.u16(slot.operand);
            } else if slot.operand > 255 {
                out.u8(Opcode::LdcW.into());
                out.u16(slot.operand);
            } else {
                out.u8(Opcode::Ldc.into());
                out.u8(slot.operand as u8);
            }
        }
        Instruction::Invoke(Opcode::Invokeinterface, method_ref) => {
            let descriptor = MethodDescriptor::parse(&method_ref.descriptor)?;
            out.u8(Opcode::Invokeinterface.into());
            out.u16(slot.operand);
            out.u8((descriptor.param_slots() + 1) as u8);
            out.u8(0);
        }
        Instruction::Type(op, _) | Instruction::Field(op, _) | Instruction::Invoke(op, _) => {
            out.u8((*op).into());
            out.u16(slot.operand);
        }
        Instruction::Jump(op, label) => {
            let target = labels.get(label).ok_or_else(|| EmitError::UnboundLabel {
                method: method.to_string(),
                label: label.0,
            })?;
            let delta = *target as i64 - slot.offset as i64;
            let delta = i16::try_from(delta).map_err(|_| EmitError::BranchOutOfRange {
                method: method.to_string(),
                offset: delta,
            })?;
            out.u8((*op).into());
            out.i16(delta);
        }
    }
    Ok(())
}

/// `xLOAD_n`/`xSTORE_n` for slots 0 to 3, `WIDE` above 255.
fn encode_local(op: Opcode, index: u16, out: &mut ByteWriter) {
    let code: u8 = op.into();
    match index {
        0..=3 => {
            let (base, first) = if code < u8::from(Opcode::Istore) {
                (ILOAD_0, u8::from(Opcode::Iload))
            } else {
                (ISTORE_0, u8::from(Opcode::Istore))
            };
            out.u8(base + (code - first) * 4 + index as u8);
        }
        4..=255 => {
            out.u8(code);
            out.u8(index as u8);
        }
        _ => {
            out.u8(Opcode::Wide.into());
            out.u8(code);
            out.u16(index);
        }
    }
}
