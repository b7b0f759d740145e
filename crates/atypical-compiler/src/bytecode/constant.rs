//! Values loaded by `LDC`.

use std::fmt;

use atypical_core::Type;
use ordered_float::OrderedFloat;

/// A loadable constant.
///
/// Floats are wrapped in [`OrderedFloat`] so constants can be hashed and
/// deduplicated by the class writer's constant pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
}

impl Constant {
    pub fn float(value: f32) -> Self {
        Constant::Float(OrderedFloat(value))
    }

    pub fn double(value: f64) -> Self {
        Constant::Double(OrderedFloat(value))
    }

    /// Long and double constants take two pool entries and two stack slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    /// Static type of the loaded value.
    pub fn ty(&self) -> Type {
        match self {
            Constant::Int(_) => Type::Int,
            Constant::Long(_) => Type::Long,
            Constant::Float(_) => Type::Float,
            Constant::Double(_) => Type::Double,
            Constant::String(_) => Type::string(),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Long(v) => write!(f, "{v}L"),
            Constant::Float(v) => write!(f, "{}f", v.0),
            Constant::Double(v) => write!(f, "{}d", v.0),
            Constant::String(s) => write!(f, "{s:?}"),
        }
    }
}
