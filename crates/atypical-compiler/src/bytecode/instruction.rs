//! Symbolic instruction lists.
//!
//! Method bodies are kept as [`Instruction`]s with symbolic [`Label`]s and
//! unresolved constants. The class writer assigns offsets, constant pool
//! indexes and the operand stack depth.

use std::fmt;

use super::{Constant, Opcode};

/// A jump target inside one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Field reference: `owner.name : descriptor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MemberRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// Method reference. `interface` selects an interface method constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub interface: bool,
}

impl MethodRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
            interface: false,
        }
    }

    pub fn interface(mut self) -> Self {
        self.interface = true;
        self
    }
}

/// One entry of a method body.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Opcode without operands.
    Simple(Opcode),
    /// `BIPUSH`, `SIPUSH` and `NEWARRAY`.
    Int(Opcode, i32),
    /// Local variable load or store.
    Local(Opcode, u16),
    /// Constant load; the writer picks `LDC`, `LDC_W` or `LDC2_W`.
    Ldc(Constant),
    /// Class operand: `NEW`, `ANEWARRAY`, `CHECKCAST`, `INSTANCEOF`.
    Type(Opcode, String),
    Field(Opcode, MemberRef),
    Invoke(Opcode, MethodRef),
    Jump(Opcode, Label),
    /// Binds a label to the next instruction.
    Label(Label),
    /// Source line of the following instructions.
    Line(u32),
}

impl Instruction {
    /// The opcode, if this entry produces code.
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Instruction::Simple(op)
            | Instruction::Int(op, _)
            | Instruction::Local(op, _)
            | Instruction::Type(op, _)
            | Instruction::Field(op, _)
            | Instruction::Invoke(op, _)
            | Instruction::Jump(op, _) => Some(*op),
            Instruction::Ldc(c) if c.is_wide() => Some(Opcode::Ldc2W),
            Instruction::Ldc(_) => Some(Opcode::Ldc),
            Instruction::Label(_) | Instruction::Line(_) => None,
        }
    }

    /// Whether execution can fall through to the next entry.
    pub fn falls_through(&self) -> bool {
        self.opcode().is_none_or(|op| !op.ends_block())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Simple(op) => write!(f, "    {}", op.mnemonic()),
            Instruction::Int(op, v) => write!(f, "    {} {v}", op.mnemonic()),
            Instruction::Local(op, slot) => write!(f, "    {} {slot}", op.mnemonic()),
            Instruction::Ldc(c) => write!(f, "    LDC {c}"),
            Instruction::Type(op, name) => write!(f, "    {} {name}", op.mnemonic()),
            Instruction::Field(op, m) => {
                write!(f, "    {} {}.{} : {}", op.mnemonic(), m.owner, m.name, m.descriptor)
            }
            Instruction::Invoke(op, m) => {
                write!(f, "    {} {}.{}{}", op.mnemonic(), m.owner, m.name, m.descriptor)
            }
            Instruction::Jump(op, label) => write!(f, "    {} {label}", op.mnemonic()),
            Instruction::Label(label) => write!(f, "  {label}:"),
            Instruction::Line(line) => write!(f, "  LINE {line}"),
        }
    }
}

/// A finished method body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Code {
    pub instructions: Vec<Instruction>,
    /// Local variable slots, including `this` and parameters.
    pub max_locals: u16,
}

impl Code {
    pub fn new(instructions: Vec<Instruction>, max_locals: u16) -> Self {
        Self {
            instructions,
            max_locals,
        }
    }

    /// Entries that produce code (labels and line markers skipped).
    pub fn ops(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.opcode().is_some())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  max_locals = {}", self.max_locals)?;
        for insn in &self.instructions {
            writeln!(f, "{insn}")?;
        }
        Ok(())
    }
}
