//! Structural declarations for the Atypical compiler.
//!
//! The structural pass fills an [`IndexBuilder`] with one [`TypeDecl`] per
//! module, struct, trait, impl adapter and global-function holder. Building
//! it yields the immutable [`StructuralIndex`] every later pass reads.

pub mod decl;
pub mod index;
pub mod library;
pub mod trait_impls;

pub use decl::{
    AdapterInfo, CONSTRUCTOR_NAME, FieldDecl, MethodSig, TypeDecl, TypeKind, WRAPPED_FIELD,
};
pub use index::{IndexBuilder, StructuralIndex};
pub use library::library_types;
pub use trait_impls::{TraitImplRegistry, adapter_name};
