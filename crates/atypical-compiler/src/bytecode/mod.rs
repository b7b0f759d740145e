//! Instruction-level representation of method bodies.
//!
//! - [`Opcode`]: the target instruction set
//! - [`Instruction`], [`Label`], [`Code`]: symbolic method bodies
//! - [`Constant`]: values loaded by `LDC`

mod constant;
mod instruction;
mod opcode;

pub use constant::Constant;
pub use instruction::{Code, Instruction, Label, MemberRef, MethodRef};
pub use opcode::{Comparison, Opcode};
