//! Core types shared by every Atypical compiler crate.
//!
//! - [`Span`]: source locations
//! - [`Type`], [`MethodDescriptor`]: the type model and its descriptor encoding
//! - [`AliasMap`]: per-file import aliases
//! - [`TypeHash`]: stable identities for the structural index
//! - [`error`]: the error hierarchy for every phase

pub mod alias;
pub mod descriptor;
pub mod error;
pub mod span;
pub mod ty;
pub mod type_hash;

pub use alias::{AliasMap, to_binary_name, to_internal_name};
pub use descriptor::{MethodDescriptor, format_arg_types};
pub use error::{
    AtypicalError, CompilationError, DescriptorError, EmitError, LexError, ParseError,
    ParseErrorKind, ParseErrors, RegistrationError,
};
pub use span::Span;
pub use ty::{OBJECT_CLASS, STRING_CLASS, Type, VOID_MARKER_CLASS, ValueKind};
pub use type_hash::TypeHash;
