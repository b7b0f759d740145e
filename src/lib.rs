//! Atypical: a compiler from Atypical source to JVM class files.
//!
//! The pipeline lives in the workspace crates:
//!
//! - `atypical-parser` turns source text into an arena allocated AST
//! - `atypical-registry` indexes every declared type and method signature
//! - `atypical-compiler` type checks bodies and lowers them to symbolic
//!   bytecode
//!
//! This crate ties them together behind [`Unit`] and serializes the result
//! with [`ClassFileWriter`].

pub mod classfile;
pub mod cli;
pub mod commands;
pub mod unit;

pub use atypical_compiler::{
    AccessFlags, ClassEmitter, ClassRecord, CompiledProgram, CompilerOptions, FieldRecord, MethodRecord,
    TraitCastMode,
};
pub use atypical_core::{AtypicalError, CompilationError, EmitError, ParseErrors, RegistrationError};
pub use classfile::ClassFileWriter;
pub use unit::{ClassFile, SourceText, Unit};
