//! Local scope management for method compilation.
//!
//! This module provides `LocalScope` for tracking local variables during
//! method body compilation. It handles:
//! - Slot allocation, with long and double taking two slots
//! - Nested block scopes (if/else/while bodies)
//!
//! Slots are handed out monotonically. A variable whose block has ended is
//! no longer visible by name, but its slot is never given to another
//! variable.

use atypical_core::{CompilationError, Span, Type};
use rustc_hash::FxHashMap;

// ============================================================================
// Types
// ============================================================================

/// Information about a local variable.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    /// Variable name
    pub name: String,
    /// Variable type
    pub ty: Type,
    /// First slot occupied
    pub slot: u16,
    /// Scope depth where declared
    pub depth: u32,
    /// Source location of declaration
    pub span: Span,
}

// ============================================================================
// LocalScope
// ============================================================================

/// Local variables of the method being compiled.
#[derive(Debug, Default)]
pub struct LocalScope {
    /// Variables by name in the current scope chain
    variables: FxHashMap<String, LocalVar>,

    /// Current scope depth (0 = method scope)
    scope_depth: u32,

    /// Next free slot
    next_slot: u16,
}

impl LocalScope {
    /// An empty scope for a static method.
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope whose slot 0 holds the receiver.
    pub fn for_instance() -> Self {
        Self {
            next_slot: 1,
            ..Self::default()
        }
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Enter a new block.
    pub fn push_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Exit the current block, hiding the variables it declared.
    pub fn pop_scope(&mut self) {
        let depth = self.scope_depth;
        self.variables.retain(|_, var| var.depth < depth);
        self.scope_depth = self.scope_depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.scope_depth
    }

    // ==========================================================================
    // Variables
    // ==========================================================================

    /// Declare a parameter. Parameters live at depth 0 and are declared
    /// before any local.
    pub fn declare_param(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        span: Span,
    ) -> Result<u16, CompilationError> {
        self.declare(name, ty, span)
    }

    /// Declare a variable in the current block and allocate its slot.
    ///
    /// A name that is already visible, in this block or an enclosing one,
    /// cannot be declared again.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        ty: Type,
        span: Span,
    ) -> Result<u16, CompilationError> {
        let name = name.into();
        if let Some(existing) = self.variables.get(&name) {
            return Err(CompilationError::VariableRedeclaration {
                name,
                original_span: existing.span,
                new_span: span,
            });
        }

        let slot = self.allocate(&ty, span)?;
        self.variables.insert(
            name.clone(),
            LocalVar {
                name,
                ty,
                slot,
                depth: self.scope_depth,
                span,
            },
        );
        Ok(slot)
    }

    /// Reserve an unnamed slot for compiler temporaries.
    pub fn reserve_temp(&mut self, ty: &Type, span: Span) -> Result<u16, CompilationError> {
        self.allocate(ty, span)
    }

    /// The frame size is a `u16`, so the slot after the last one must fit.
    fn allocate(&mut self, ty: &Type, span: Span) -> Result<u16, CompilationError> {
        let slot = self.next_slot;
        self.next_slot = slot
            .checked_add(ty.slot_size().max(1))
            .ok_or(CompilationError::TooManyLocals { span })?;
        Ok(slot)
    }

    /// Look up a visible variable.
    pub fn lookup(&self, name: &str) -> Option<&LocalVar> {
        self.variables.get(name)
    }

    /// Local slots used so far, for the frame size.
    pub fn max_locals(&self) -> u16 {
        self.next_slot
    }
}
