//! Target instruction set.
//!
//! The discriminants are the VM's opcode bytes, so an [`Opcode`] converts
//! to and from `u8` directly.

use atypical_core::{Type, ValueKind};
use atypical_parser::ast::BinaryOp;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The six relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn from_op(op: BinaryOp) -> Option<Comparison> {
        Some(match op {
            BinaryOp::Equal => Comparison::Eq,
            BinaryOp::NotEqual => Comparison::Ne,
            BinaryOp::Less => Comparison::Lt,
            BinaryOp::LessEqual => Comparison::Le,
            BinaryOp::Greater => Comparison::Gt,
            BinaryOp::GreaterEqual => Comparison::Ge,
            _ => return None,
        })
    }

    /// Equality tests, the only comparisons defined on references.
    pub fn is_equality(self) -> bool {
        matches!(self, Comparison::Eq | Comparison::Ne)
    }
}

/// Operation codes used by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    // =========================================================================
    // Constants
    // =========================================================================
    Nop = 0x00,
    AconstNull = 0x01,
    IconstM1 = 0x02,
    Iconst0 = 0x03,
    Iconst1 = 0x04,
    Iconst2 = 0x05,
    Iconst3 = 0x06,
    Iconst4 = 0x07,
    Iconst5 = 0x08,
    Lconst0 = 0x09,
    Lconst1 = 0x0a,
    Fconst0 = 0x0b,
    Fconst1 = 0x0c,
    Fconst2 = 0x0d,
    Dconst0 = 0x0e,
    Dconst1 = 0x0f,
    /// Operand: i8
    Bipush = 0x10,
    /// Operand: i16
    Sipush = 0x11,
    /// Operand: u8 constant index
    Ldc = 0x12,
    /// Operand: u16 constant index
    LdcW = 0x13,
    /// Operand: u16 constant index (long/double)
    Ldc2W = 0x14,

    // =========================================================================
    // Locals
    // =========================================================================
    Iload = 0x15,
    Lload = 0x16,
    Fload = 0x17,
    Dload = 0x18,
    Aload = 0x19,
    Istore = 0x36,
    Lstore = 0x37,
    Fstore = 0x38,
    Dstore = 0x39,
    Astore = 0x3a,

    // =========================================================================
    // Arrays
    // =========================================================================
    Iaload = 0x2e,
    Laload = 0x2f,
    Faload = 0x30,
    Daload = 0x31,
    Aaload = 0x32,
    Baload = 0x33,
    Caload = 0x34,
    Saload = 0x35,
    Iastore = 0x4f,
    Lastore = 0x50,
    Fastore = 0x51,
    Dastore = 0x52,
    Aastore = 0x53,
    Bastore = 0x54,
    Castore = 0x55,
    Sastore = 0x56,

    // =========================================================================
    // Stack
    // =========================================================================
    Pop = 0x57,
    Pop2 = 0x58,
    Dup = 0x59,
    DupX1 = 0x5a,
    DupX2 = 0x5b,
    Dup2 = 0x5c,
    Dup2X1 = 0x5d,
    Dup2X2 = 0x5e,
    Swap = 0x5f,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    Iadd = 0x60,
    Ladd = 0x61,
    Fadd = 0x62,
    Dadd = 0x63,
    Isub = 0x64,
    Lsub = 0x65,
    Fsub = 0x66,
    Dsub = 0x67,
    Imul = 0x68,
    Lmul = 0x69,
    Fmul = 0x6a,
    Dmul = 0x6b,
    Idiv = 0x6c,
    Ldiv = 0x6d,
    Fdiv = 0x6e,
    Ddiv = 0x6f,
    Irem = 0x70,
    Lrem = 0x71,
    Frem = 0x72,
    Drem = 0x73,
    Ineg = 0x74,
    Lneg = 0x75,
    Fneg = 0x76,
    Dneg = 0x77,
    Iand = 0x7e,
    Ior = 0x80,
    Ixor = 0x82,

    // =========================================================================
    // Conversions
    // =========================================================================
    I2l = 0x85,
    I2f = 0x86,
    I2d = 0x87,
    L2i = 0x88,
    L2f = 0x89,
    L2d = 0x8a,
    F2i = 0x8b,
    F2l = 0x8c,
    F2d = 0x8d,
    D2i = 0x8e,
    D2l = 0x8f,
    D2f = 0x90,
    I2b = 0x91,
    I2c = 0x92,
    I2s = 0x93,

    // =========================================================================
    // Comparisons and jumps
    // =========================================================================
    Lcmp = 0x94,
    Fcmpl = 0x95,
    Fcmpg = 0x96,
    Dcmpl = 0x97,
    Dcmpg = 0x98,
    Ifeq = 0x99,
    Ifne = 0x9a,
    Iflt = 0x9b,
    Ifge = 0x9c,
    Ifgt = 0x9d,
    Ifle = 0x9e,
    IfIcmpeq = 0x9f,
    IfIcmpne = 0xa0,
    IfIcmplt = 0xa1,
    IfIcmpge = 0xa2,
    IfIcmpgt = 0xa3,
    IfIcmple = 0xa4,
    IfAcmpeq = 0xa5,
    IfAcmpne = 0xa6,
    Goto = 0xa7,

    // =========================================================================
    // Returns
    // =========================================================================
    Ireturn = 0xac,
    Lreturn = 0xad,
    Freturn = 0xae,
    Dreturn = 0xaf,
    Areturn = 0xb0,
    Return = 0xb1,

    // =========================================================================
    // Objects
    // =========================================================================
    Getstatic = 0xb2,
    Putstatic = 0xb3,
    Getfield = 0xb4,
    Putfield = 0xb5,
    Invokevirtual = 0xb6,
    Invokespecial = 0xb7,
    Invokestatic = 0xb8,
    Invokeinterface = 0xb9,
    New = 0xbb,
    /// Operand: u8 primitive array type code
    Newarray = 0xbc,
    Anewarray = 0xbd,
    Arraylength = 0xbe,
    Checkcast = 0xc0,
    Instanceof = 0xc1,
    /// Prefix widening the local index of the next instruction.
    Wide = 0xc4,
    Ifnull = 0xc6,
    Ifnonnull = 0xc7,
}

impl Opcode {
    /// Assembler mnemonic, e.g. `IF_ICMPLT`.
    pub fn mnemonic(self) -> String {
        let name = format!("{self:?}");
        let mut out = String::with_capacity(name.len() + 2);
        for (i, ch) in name.chars().enumerate() {
            if i > 0 && ch.is_ascii_uppercase() {
                out.push('_');
            }
            out.push(ch.to_ascii_uppercase());
        }
        // ICONST_0, LCONST_1, ...
        if let Some(pos) = out.find("CONST")
            && out[pos + 5..].starts_with(|c: char| c.is_ascii_digit())
        {
            out.insert(pos + 5, '_');
        }
        out
    }

    /// Conditional or unconditional jump taking a label.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Ifeq
                | Opcode::Ifne
                | Opcode::Iflt
                | Opcode::Ifge
                | Opcode::Ifgt
                | Opcode::Ifle
                | Opcode::IfIcmpeq
                | Opcode::IfIcmpne
                | Opcode::IfIcmplt
                | Opcode::IfIcmpge
                | Opcode::IfIcmpgt
                | Opcode::IfIcmple
                | Opcode::IfAcmpeq
                | Opcode::IfAcmpne
                | Opcode::Goto
                | Opcode::Ifnull
                | Opcode::Ifnonnull
        )
    }

    pub fn is_return(self) -> bool {
        matches!(
            self,
            Opcode::Ireturn
                | Opcode::Lreturn
                | Opcode::Freturn
                | Opcode::Dreturn
                | Opcode::Areturn
                | Opcode::Return
        )
    }

    /// Control never continues to the next instruction.
    pub fn ends_block(self) -> bool {
        self == Opcode::Goto || self.is_return()
    }

    /// `xLOAD` for a value kind.
    pub fn load_for(kind: ValueKind) -> Opcode {
        match kind {
            ValueKind::Int => Opcode::Iload,
            ValueKind::Long => Opcode::Lload,
            ValueKind::Float => Opcode::Fload,
            ValueKind::Double => Opcode::Dload,
            ValueKind::Reference | ValueKind::Void => Opcode::Aload,
        }
    }

    /// `xSTORE` for a value kind.
    pub fn store_for(kind: ValueKind) -> Opcode {
        match kind {
            ValueKind::Int => Opcode::Istore,
            ValueKind::Long => Opcode::Lstore,
            ValueKind::Float => Opcode::Fstore,
            ValueKind::Double => Opcode::Dstore,
            ValueKind::Reference | ValueKind::Void => Opcode::Astore,
        }
    }

    /// `xRETURN` for a value kind.
    pub fn return_for(kind: ValueKind) -> Opcode {
        match kind {
            ValueKind::Void => Opcode::Return,
            ValueKind::Int => Opcode::Ireturn,
            ValueKind::Long => Opcode::Lreturn,
            ValueKind::Float => Opcode::Freturn,
            ValueKind::Double => Opcode::Dreturn,
            ValueKind::Reference => Opcode::Areturn,
        }
    }

    /// Element load for an array of `element`.
    pub fn array_load_for(element: &Type) -> Opcode {
        match element {
            Type::Boolean | Type::Byte => Opcode::Baload,
            Type::Char => Opcode::Caload,
            Type::Short => Opcode::Saload,
            Type::Int => Opcode::Iaload,
            Type::Long => Opcode::Laload,
            Type::Float => Opcode::Faload,
            Type::Double => Opcode::Daload,
            _ => Opcode::Aaload,
        }
    }

    /// Element store for an array of `element`.
    pub fn array_store_for(element: &Type) -> Opcode {
        match element {
            Type::Boolean | Type::Byte => Opcode::Bastore,
            Type::Char => Opcode::Castore,
            Type::Short => Opcode::Sastore,
            Type::Int => Opcode::Iastore,
            Type::Long => Opcode::Lastore,
            Type::Float => Opcode::Fastore,
            Type::Double => Opcode::Dastore,
            _ => Opcode::Aastore,
        }
    }

    /// Arithmetic instruction for `op` on operands of `kind`.
    pub fn arithmetic(op: BinaryOp, kind: ValueKind) -> Option<Opcode> {
        use Opcode::*;
        let family = match op {
            BinaryOp::Add => [Iadd, Ladd, Fadd, Dadd],
            BinaryOp::Sub => [Isub, Lsub, Fsub, Dsub],
            BinaryOp::Mul => [Imul, Lmul, Fmul, Dmul],
            BinaryOp::Div => [Idiv, Ldiv, Fdiv, Ddiv],
            BinaryOp::Mod => [Irem, Lrem, Frem, Drem],
            _ => return None,
        };
        match kind {
            ValueKind::Int => Some(family[0]),
            ValueKind::Long => Some(family[1]),
            ValueKind::Float => Some(family[2]),
            ValueKind::Double => Some(family[3]),
            ValueKind::Reference | ValueKind::Void => None,
        }
    }

    /// Negation for a numeric kind.
    pub fn negate(kind: ValueKind) -> Option<Opcode> {
        match kind {
            ValueKind::Int => Some(Opcode::Ineg),
            ValueKind::Long => Some(Opcode::Lneg),
            ValueKind::Float => Some(Opcode::Fneg),
            ValueKind::Double => Some(Opcode::Dneg),
            ValueKind::Reference | ValueKind::Void => None,
        }
    }

    /// `IFxx` testing the result of `LCMP`/`FCMPx`/`DCMPx` against zero.
    pub fn if_zero(cmp: Comparison) -> Opcode {
        match cmp {
            Comparison::Eq => Opcode::Ifeq,
            Comparison::Ne => Opcode::Ifne,
            Comparison::Lt => Opcode::Iflt,
            Comparison::Le => Opcode::Ifle,
            Comparison::Gt => Opcode::Ifgt,
            Comparison::Ge => Opcode::Ifge,
        }
    }

    /// `IF_ICMPxx` for two int operands.
    pub fn if_icmp(cmp: Comparison) -> Opcode {
        match cmp {
            Comparison::Eq => Opcode::IfIcmpeq,
            Comparison::Ne => Opcode::IfIcmpne,
            Comparison::Lt => Opcode::IfIcmplt,
            Comparison::Le => Opcode::IfIcmple,
            Comparison::Gt => Opcode::IfIcmpgt,
            Comparison::Ge => Opcode::IfIcmpge,
        }
    }

    /// `IF_ACMPxx` for two references; only equality is defined.
    pub fn if_acmp(cmp: Comparison) -> Option<Opcode> {
        match cmp {
            Comparison::Eq => Some(Opcode::IfAcmpeq),
            Comparison::Ne => Some(Opcode::IfAcmpne),
            _ => None,
        }
    }

    /// Compare instruction for wide and floating kinds.
    ///
    /// NaN must make the comparison false, so `<`/`<=` use the `G` variant
    /// (NaN pushes 1) and the others the `L` variant (NaN pushes -1).
    pub fn compare(kind: ValueKind, cmp: Comparison) -> Option<Opcode> {
        let less = matches!(cmp, Comparison::Lt | Comparison::Le);
        match kind {
            ValueKind::Long => Some(Opcode::Lcmp),
            ValueKind::Float if less => Some(Opcode::Fcmpg),
            ValueKind::Float => Some(Opcode::Fcmpl),
            ValueKind::Double if less => Some(Opcode::Dcmpg),
            ValueKind::Double => Some(Opcode::Dcmpl),
            _ => None,
        }
    }

    /// Primitive array type code used by `NEWARRAY`.
    pub fn newarray_code(element: &Type) -> Option<u8> {
        Some(match element {
            Type::Boolean => 4,
            Type::Char => 5,
            Type::Float => 6,
            Type::Double => 7,
            Type::Byte => 8,
            Type::Short => 9,
            Type::Int => 10,
            Type::Long => 11,
            _ => return None,
        })
    }
}
