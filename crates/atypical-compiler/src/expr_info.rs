//! Expression type information for the compiler.
//!
//! `ExprInfo` captures the result of compiling an expression: its static
//! type and where the value came from.

use atypical_core::Type;

/// Where an expression's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    /// A computed value (operators, casts, assignments).
    #[default]
    Temporary,
    /// A local variable or parameter in the given slot.
    Local(u16),
    /// A field read.
    Member,
    /// A type name used as a value; nothing is on the stack.
    StaticType,
    /// An array element read.
    ArrayElement,
    /// The result of a method call.
    MethodResult,
    /// A literal constant.
    Literal,
}

/// Result of compiling an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo {
    /// Static type of the value left on the stack.
    pub ty: Type,
    pub provenance: Provenance,
}

impl ExprInfo {
    pub fn new(ty: Type, provenance: Provenance) -> Self {
        Self { ty, provenance }
    }

    /// A computed value.
    ///
    /// ```ignore
    /// // The result of `1 + 2`
    /// let info = ExprInfo::temporary(Type::Int);
    /// ```
    pub fn temporary(ty: Type) -> Self {
        Self::new(ty, Provenance::Temporary)
    }

    pub fn literal(ty: Type) -> Self {
        Self::new(ty, Provenance::Literal)
    }

    pub fn local(ty: Type, slot: u16) -> Self {
        Self::new(ty, Provenance::Local(slot))
    }

    pub fn member(ty: Type) -> Self {
        Self::new(ty, Provenance::Member)
    }

    pub fn method_result(ty: Type) -> Self {
        Self::new(ty, Provenance::MethodResult)
    }

    pub fn array_element(ty: Type) -> Self {
        Self::new(ty, Provenance::ArrayElement)
    }

    /// A type name used as a receiver; `ty` is the referenced type.
    pub fn static_type(ty: Type) -> Self {
        Self::new(Type::Static(Box::new(ty)), Provenance::StaticType)
    }

    /// Expressions of type void (assignments, void calls).
    pub fn void() -> Self {
        Self::temporary(Type::Void)
    }

    pub fn is_static_type(&self) -> bool {
        self.provenance == Provenance::StaticType
    }
}

/// Target of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    /// Local slot; nothing on the stack.
    Local { slot: u16, ty: Type },
    /// Field; the receiver is on the stack unless static.
    Field {
        owner: String,
        name: String,
        ty: Type,
        is_static: bool,
    },
    /// Array element; array and index are on the stack.
    ArrayElement { element: Type },
}

impl LValue {
    /// Type a stored value must have.
    pub fn ty(&self) -> &Type {
        match self {
            LValue::Local { ty, .. } | LValue::Field { ty, .. } => ty,
            LValue::ArrayElement { element } => element,
        }
    }
}
