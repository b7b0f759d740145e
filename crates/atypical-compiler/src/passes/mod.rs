//! Compiler passes.
//!
//! - [`structure`]: Pass 1 - every declaration of every file becomes a [`TypeDecl`]
//! - [`synthesis`]: Pass 2 - constructor bodies for structs, modules and adapters
//! - [`compilation`]: Pass 3 - type check method bodies and generate instructions
//!
//! [`compile_program`] runs them in order and assembles one [`ClassRecord`]
//! per emitted type. The structural pass finishes for all files before any
//! body is compiled; the index it produces is immutable.

pub mod compilation;
pub mod structure;
pub mod synthesis;

use std::fmt;

use atypical_core::{AtypicalError, CompilationError};
use atypical_parser::SourceFile;
use atypical_registry::{MethodSig, StructuralIndex, TypeDecl};
use rustc_hash::FxHashMap;

use crate::bytecode::Code;
use crate::options::CompilerOptions;
use crate::output::{ClassRecord, MethodRecord};

pub use structure::{BodyJob, StructureOutput};

/// Method bodies produced by passes 2 and 3.
pub type BodyMap = FxHashMap<MethodKey, Code>;

/// One parsed input file.
#[derive(Debug, Clone, Copy)]
pub struct SourceUnit<'ast> {
    /// Name the file was added under, used in errors and for the global
    /// function holder.
    pub name: &'ast str,
    pub file: &'ast SourceFile<'ast>,
}

impl<'ast> SourceUnit<'ast> {
    pub fn new(name: &'ast str, file: &'ast SourceFile<'ast>) -> Self {
        Self { name, file }
    }
}

/// Identity of a method: owner, name and descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MethodKey {
    pub fn new(owner: &str, sig: &MethodSig) -> Self {
        Self {
            owner: owner.to_string(),
            name: sig.name.clone(),
            descriptor: sig.descriptor().to_string(),
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Result of a successful run over all files.
#[derive(Debug)]
pub struct CompiledProgram {
    pub index: StructuralIndex,
    /// One record per emitted type, in declaration order.
    pub classes: Vec<ClassRecord>,
}

impl CompiledProgram {
    pub fn class(&self, name: &str) -> Option<&ClassRecord> {
        self.classes.iter().find(|class| class.name == name)
    }
}

/// Run passes 1 to 3 over `units`. The first error aborts the run.
#[tracing::instrument(skip_all, fields(files = units.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_program(
    units: &[SourceUnit<'_>],
    options: &CompilerOptions,
) -> Result<CompiledProgram, AtypicalError> {
    let StructureOutput {
        index,
        jobs,
        holders,
    } = structure::build(units)?;
    tracing::debug!(types = index.len(), bodies = jobs.len(), "structural pass complete");

    let mut bodies = BodyMap::default();
    synthesis::synthesize(&index, &mut bodies)?;
    compilation::compile_bodies(&index, units, &holders, &jobs, options, &mut bodies)?;

    let classes = index
        .emitted()
        .map(|decl| assemble(decl, &mut bodies))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(classes = classes.len(), "compiled program");

    Ok(CompiledProgram { index, classes })
}

fn assemble(decl: &TypeDecl, bodies: &mut BodyMap) -> Result<ClassRecord, AtypicalError> {
    let mut class = ClassRecord::from_decl(decl);
    for sig in &decl.methods {
        let code = if sig.is_abstract {
            None
        } else {
            let key = MethodKey::new(&decl.name, sig);
            let code = bodies.remove(&key).ok_or_else(|| AtypicalError::Compilation {
                file: decl.source_file.clone().unwrap_or_else(|| decl.name.clone()),
                source: CompilationError::internal(format!("no body for {key}")),
            })?;
            Some(code)
        };
        class.methods.push(MethodRecord::new(sig, code));
    }
    Ok(class)
}
