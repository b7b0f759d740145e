//! Helpers for compiling single-file programs in unit tests.

use atypical_core::AtypicalError;
use atypical_parser::Parser;
use bumpalo::Bump;

use crate::bytecode::{Code, Opcode};
use crate::options::CompilerOptions;
use crate::output::ClassRecord;
use crate::passes::{SourceUnit, compile_program};

const FILE_NAME: &str = "main.atp";

fn try_compile(source: &str, options: &CompilerOptions) -> Result<Vec<ClassRecord>, AtypicalError> {
    let arena = Bump::new();
    let file = Parser::parse(source, &arena).map_err(|errors| AtypicalError::Parse {
        file: FILE_NAME.to_string(),
        errors,
    })?;
    let units = [SourceUnit::new(FILE_NAME, &file)];
    compile_program(&units, options).map(|program| program.classes)
}

/// Compile `source` as `main.atp` without line markers, panicking on error.
pub fn compile_ok(source: &str) -> Vec<ClassRecord> {
    compile_with(source, &CompilerOptions::default().with_line_numbers(false))
}

pub fn compile_with(source: &str, options: &CompilerOptions) -> Vec<ClassRecord> {
    match try_compile(source, options) {
        Ok(classes) => classes,
        Err(err) => panic!("compilation failed: {err}\n{source}"),
    }
}

/// Compile `source`, expecting an error.
pub fn compile_err(source: &str) -> AtypicalError {
    match try_compile(source, &CompilerOptions::default().with_line_numbers(false)) {
        Ok(_) => panic!("expected an error compiling:\n{source}"),
        Err(err) => err,
    }
}

/// Body of the first method named `method` on `class`.
pub fn method_code<'a>(classes: &'a [ClassRecord], class: &str, method: &str) -> &'a Code {
    let record = classes
        .iter()
        .find(|c| c.name == class)
        .unwrap_or_else(|| panic!("no class {class}"));
    record
        .method_named(method)
        .and_then(|m| m.code.as_ref())
        .unwrap_or_else(|| panic!("no body for {class}.{method}"))
}

/// Opcodes of a method body, labels and line markers skipped.
pub fn ops(classes: &[ClassRecord], class: &str, method: &str) -> Vec<Opcode> {
    method_code(classes, class, method)
        .ops()
        .filter_map(|insn| insn.opcode())
        .collect()
}
