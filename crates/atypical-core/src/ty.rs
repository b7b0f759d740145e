//! Source-level type model.
//!
//! [`Type`] is a closed set of variants mirroring what the target VM can
//! describe, plus two compiler-internal variants: [`Type::Static`] (a value
//! that stands for a type itself, used for `Type.member` chains) and
//! [`Type::Unknown`] (the type of `null`, which unifies with any parameter
//! during overload matching).
//!
//! Types print to and parse from JVM field descriptors. The internal variants
//! use the prefixes `T` (static reference) and `U` (unknown), which never
//! appear in emitted class files.

use std::fmt;

use crate::error::DescriptorError;

/// Qualified internal name of the root class.
pub const OBJECT_CLASS: &str = "java/lang/Object";
/// Qualified internal name of the string class.
pub const STRING_CLASS: &str = "java/lang/String";
/// Qualified internal name of the trailing constructor marker type.
pub const VOID_MARKER_CLASS: &str = "java/lang/Void";

/// A source type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Byte,
    Char,
    Short,
    /// Class, interface or adapter, by slash separated qualified name.
    Object(String),
    /// Array of the element type.
    Array(Box<Type>),
    /// The type itself used as a value (`System` in `System.out`).
    Static(Box<Type>),
    /// Type of the `null` literal.
    Unknown,
}

/// How a value of some type lives on the operand stack.
///
/// Opcode families (`ILOAD`/`LLOAD`/`FLOAD`/`DLOAD`/`ALOAD` and friends) are
/// chosen by this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Void,
    /// int, boolean, byte, char, short
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ValueKind {
    /// Operand stack / local slot width.
    pub fn size(self) -> u16 {
        match self {
            ValueKind::Void => 0,
            ValueKind::Long | ValueKind::Double => 2,
            _ => 1,
        }
    }
}

impl Type {
    /// Object type from a qualified name.
    pub fn from_qualified_name(name: impl Into<String>) -> Type {
        Type::Object(name.into())
    }

    /// Array whose elements are `element`.
    pub fn array_of(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    /// Turn a type into a static-type-reference.
    ///
    /// A static reference to a static reference is meaningless and rejected.
    pub fn to_static_reference(self) -> Result<Type, DescriptorError> {
        match self {
            Type::Static(_) => Err(DescriptorError::AlreadyStatic {
                descriptor: self.descriptor(),
            }),
            other => Ok(Type::Static(Box::new(other))),
        }
    }

    /// Map a built-in source type name to its type.
    pub fn primitive_from_name(name: &str) -> Option<Type> {
        Some(match name {
            "void" => Type::Void,
            "int" => Type::Int,
            "long" => Type::Long,
            "float" => Type::Float,
            "double" => Type::Double,
            "bool" => Type::Boolean,
            "byte" => Type::Byte,
            "char" => Type::Char,
            "short" => Type::Short,
            "obj" => Type::Object(OBJECT_CLASS.to_string()),
            _ => return None,
        })
    }

    /// The `java/lang/String` type.
    pub fn string() -> Type {
        Type::Object(STRING_CLASS.to_string())
    }

    /// The `java/lang/Object` type.
    pub fn object() -> Type {
        Type::Object(OBJECT_CLASS.to_string())
    }

    /// Number of local variable slots a value of this type occupies.
    pub fn slot_size(&self) -> u16 {
        self.kind().size()
    }

    /// Stack representation of this type.
    pub fn kind(&self) -> ValueKind {
        match self {
            Type::Void => ValueKind::Void,
            Type::Int | Type::Boolean | Type::Byte | Type::Char | Type::Short => ValueKind::Int,
            Type::Long => ValueKind::Long,
            Type::Float => ValueKind::Float,
            Type::Double => ValueKind::Double,
            Type::Object(_) | Type::Array(_) | Type::Static(_) | Type::Unknown => {
                ValueKind::Reference
            }
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Type::Static(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    /// Primitive (non-reference, non-void) type.
    pub fn is_primitive(&self) -> bool {
        !matches!(self.kind(), ValueKind::Reference | ValueKind::Void)
    }

    /// Whether values of this type are heap references (including `null`).
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Object(_) | Type::Array(_) | Type::Unknown)
    }

    /// int, long, float or double (and the narrow int kinds).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Int | Type::Long | Type::Float | Type::Double | Type::Byte | Type::Char | Type::Short
        )
    }

    /// Element type of an array.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Type referred to by a static-type-reference.
    pub fn static_target(&self) -> Option<&Type> {
        match self {
            Type::Static(inner) => Some(inner),
            _ => None,
        }
    }

    /// Qualified name of an object type.
    pub fn internal_name(&self) -> Option<&str> {
        match self {
            Type::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Name used by class-operand instructions (`NEW`, `CHECKCAST`, `ANEWARRAY`).
    ///
    /// Object types use their internal name, arrays their descriptor.
    pub fn class_operand(&self) -> Option<String> {
        match self {
            Type::Object(name) => Some(name.clone()),
            Type::Array(_) => Some(self.descriptor()),
            _ => None,
        }
    }

    /// Whether a value of type `value` may be stored where `self` is expected.
    ///
    /// Types must be equal; `null` is accepted by any reference type.
    pub fn accepts(&self, value: &Type) -> bool {
        self == value || (value.is_unknown() && self.is_reference())
    }

    /// Field descriptor for this type.
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    /// Append the descriptor for this type to `out`.
    pub fn write_descriptor(&self, out: &mut String) {
        match self {
            Type::Void => out.push('V'),
            Type::Int => out.push('I'),
            Type::Long => out.push('J'),
            Type::Float => out.push('F'),
            Type::Double => out.push('D'),
            Type::Boolean => out.push('Z'),
            Type::Byte => out.push('B'),
            Type::Char => out.push('C'),
            Type::Short => out.push('S'),
            Type::Object(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
            Type::Array(elem) => {
                out.push('[');
                elem.write_descriptor(out);
            }
            Type::Static(inner) => {
                out.push('T');
                inner.write_descriptor(out);
            }
            Type::Unknown => out.push('U'),
        }
    }

    /// Parse a complete field descriptor.
    pub fn parse_descriptor(descriptor: &str) -> Result<Type, DescriptorError> {
        let (ty, rest) = Self::parse_prefix(descriptor)?;
        if !rest.is_empty() {
            return Err(DescriptorError::Invalid {
                descriptor: descriptor.to_string(),
                reason: format!("trailing characters '{rest}'"),
            });
        }
        Ok(ty)
    }

    /// Parse one type from the front of `input`, returning the remainder.
    pub fn parse_prefix(input: &str) -> Result<(Type, &str), DescriptorError> {
        let invalid = |reason: &str| DescriptorError::Invalid {
            descriptor: input.to_string(),
            reason: reason.to_string(),
        };
        let mut chars = input.chars();
        let first = chars.next().ok_or_else(|| invalid("unexpected end"))?;
        let rest = chars.as_str();
        let ty = match first {
            'V' => Type::Void,
            'I' => Type::Int,
            'J' => Type::Long,
            'F' => Type::Float,
            'D' => Type::Double,
            'Z' => Type::Boolean,
            'B' => Type::Byte,
            'C' => Type::Char,
            'S' => Type::Short,
            'U' => Type::Unknown,
            'L' => {
                let end = rest.find(';').ok_or_else(|| invalid("unterminated class name"))?;
                if end == 0 {
                    return Err(invalid("empty class name"));
                }
                return Ok((Type::Object(rest[..end].to_string()), &rest[end + 1..]));
            }
            '[' => {
                let (elem, rest) = Self::parse_prefix(rest)?;
                if elem.is_void() {
                    return Err(invalid("array of void"));
                }
                return Ok((Type::array_of(elem), rest));
            }
            'T' => {
                let (inner, rest) = Self::parse_prefix(rest)?;
                let ty = inner.to_static_reference()?;
                return Ok((ty, rest));
            }
            other => return Err(invalid(&format!("unexpected character '{other}'"))),
        };
        Ok((ty, rest))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Boolean => write!(f, "bool"),
            Type::Byte => write!(f, "byte"),
            Type::Char => write!(f, "char"),
            Type::Short => write!(f, "short"),
            Type::Object(name) => write!(f, "{}", name.replace('/', ".")),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::Static(inner) => write!(f, "type {inner}"),
            Type::Unknown => write!(f, "null"),
        }
    }
}
