//! Atypical Compiler
//!
//! Compiles parsed Atypical files to JVM-style class records.
//!
//! ## Architecture
//!
//! - **Pass 1 (Structure)**: every module, struct, trait, impl and global function becomes a declaration
//! - **Pass 2 (Synthesis)**: constructor bodies for structs, modules and trait adapters
//! - **Pass 3 (Compilation)**: type check method bodies and generate instructions
//!
//! Serializing a [`ClassRecord`] is left to a [`ClassEmitter`].
//!
//! ## Modules
//!
//! - [`bytecode`]: Opcodes, constants and symbolic instructions
//! - [`context`]: Per-method compilation context
//! - [`emit`]: Instruction emitter with labels and line markers
//! - [`expr`]: Expression compiler, including trait casts
//! - [`options`]: Compiler options
//! - [`output`]: Class records handed to the emitter
//! - [`passes`]: The three passes and their driver
//! - [`scope`]: Local variable slots
//! - [`stmt`]: Statement compiler for control flow and declarations
//! - [`type_resolver`]: Type resolution from AST to semantic types

pub mod bytecode;
pub mod context;
pub mod emit;
pub mod expr;
mod expr_info;
pub mod options;
pub mod output;
pub mod passes;
mod return_checker;
pub mod scope;
pub mod stmt;
pub mod type_resolver;

#[cfg(test)]
mod test_support;

pub use bytecode::{Code, Instruction, Opcode};
pub use context::MethodContext;
pub use emit::CodeEmitter;
pub use expr::ExprCompiler;
pub use expr::cast::TraitCastStrategy;
pub use expr_info::ExprInfo;
pub use options::{CompilerOptions, TraitCastMode};
pub use output::{AccessFlags, ClassEmitter, ClassRecord, FieldRecord, MethodRecord};
pub use passes::{CompiledProgram, MethodKey, SourceUnit, compile_program};
pub use scope::{LocalScope, LocalVar};
pub use stmt::StmtCompiler;
pub use type_resolver::TypeResolver;

// Re-export CompilationError from core for convenience
pub use atypical_core::CompilationError;
