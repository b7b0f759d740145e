//! Class file writer.
//!
//! [`ClassFileWriter`] turns a [`ClassRecord`] into the bytes of a `.class`
//! file:
//!
//! ```text
//! magic, minor, major
//! constant pool
//! access, this, super, interfaces
//! fields
//! methods (Code + LineNumberTable)
//! SourceFile
//! ```
//!
//! The default major version is 49, which predates stack map frames, so no
//! `StackMapTable` attributes are written.

mod bytes;
mod code;
mod constant_pool;
mod stack;

pub use code::{AssembledCode, MAX_CODE_LENGTH, assemble};
pub use constant_pool::{ConstantPool, modified_utf8};
pub use stack::{StackEffect, max_stack, stack_effect};

use atypical_compiler::{ClassEmitter, ClassRecord, FieldRecord, MethodRecord};
use atypical_core::EmitError;

use bytes::ByteWriter;

pub const MAGIC: u32 = 0xCAFE_BABE;

/// Java 5 class files.
pub const DEFAULT_MAJOR_VERSION: u16 = 49;

/// Writes class records as class files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassFileWriter {
    major_version: u16,
}

impl Default for ClassFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassFileWriter {
    pub fn new() -> Self {
        Self {
            major_version: DEFAULT_MAJOR_VERSION,
        }
    }

    pub fn with_major_version(mut self, major_version: u16) -> Self {
        self.major_version = major_version;
        self
    }

    pub fn major_version(&self) -> u16 {
        self.major_version
    }

    /// Serialize one class.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write(&self, record: &ClassRecord) -> Result<Vec<u8>, EmitError> {
        let mut pool = ConstantPool::new();
        let mut body = ByteWriter::new();

        body.u16(record.access.bits());
        body.u16(pool.class(&record.name)?);
        match &record.superclass {
            Some(superclass) => body.u16(pool.class(superclass)?),
            None => body.u16(0),
        }
        body.u16(table_count("interfaces", record.interfaces.len())?);
        for interface in &record.interfaces {
            body.u16(pool.class(interface)?);
        }

        body.u16(table_count("fields", record.fields.len())?);
        for field in &record.fields {
            write_field(field, &mut pool, &mut body)?;
        }

        body.u16(table_count("methods", record.methods.len())?);
        for method in &record.methods {
            write_method(&record.name, method, &mut pool, &mut body)?;
        }

        match &record.source_file {
            Some(file) => {
                body.u16(1);
                body.u16(pool.utf8("SourceFile")?);
                body.u32(2);
                body.u16(pool.utf8(file)?);
            }
            None => body.u16(0),
        }

        let mut out = ByteWriter::new();
        out.u32(MAGIC);
        out.u16(0);
        out.u16(self.major_version);
        pool.write(&mut out)?;
        out.bytes(&body.into_bytes());

        tracing::trace!(class = %record.name, size = out.len(), "wrote class file");
        Ok(out.into_bytes())
    }
}

impl ClassEmitter for ClassFileWriter {
    fn emit(&mut self, record: &ClassRecord) -> Result<Vec<u8>, EmitError> {
        self.write(record)
    }
}

/// `count` as a class file table length.
fn table_count(what: &'static str, count: usize) -> Result<u16, EmitError> {
    u16::try_from(count).map_err(|_| EmitError::TooMany { what, count })
}

fn write_field(field: &FieldRecord, pool: &mut ConstantPool, out: &mut ByteWriter) -> Result<(), EmitError> {
    out.u16(field.access.bits());
    out.u16(pool.utf8(&field.name)?);
    out.u16(pool.utf8(&field.descriptor)?);
    out.u16(0);
    Ok(())
}

fn write_method(
    class: &str,
    method: &MethodRecord,
    pool: &mut ConstantPool,
    out: &mut ByteWriter,
) -> Result<(), EmitError> {
    out.u16(method.access.bits());
    out.u16(pool.utf8(&method.name)?);
    out.u16(pool.utf8(&method.descriptor)?);

    let Some(code) = &method.code else {
        out.u16(0);
        return Ok(());
    };

    let label = format!("{class}.{}{}", method.name, method.descriptor);
    let assembled = assemble(&label, code, pool)?;

    out.u16(1);
    out.u16(pool.utf8("Code")?);

    let line_table_len = if assembled.line_numbers.is_empty() {
        0
    } else {
        6 + 2 + 4 * assembled.line_numbers.len()
    };
    let attribute_len = 2 + 2 + 4 + assembled.bytes.len() + 2 + 2 + line_table_len;
    out.u32(attribute_len as u32);
    out.u16(assembled.max_stack);
    out.u16(assembled.max_locals);
    out.u32(assembled.bytes.len() as u32);
    out.bytes(&assembled.bytes);
    // exception table
    out.u16(0);

    if assembled.line_numbers.is_empty() {
        out.u16(0);
    } else {
        out.u16(1);
        out.u16(pool.utf8("LineNumberTable")?);
        let entries = table_count("line number entries", assembled.line_numbers.len())?;
        out.u32(2 + 4 * u32::from(entries));
        out.u16(entries);
        for (start_pc, line) in &assembled.line_numbers {
            out.u16(*start_pc);
            out.u16(*line);
        }
    }
    Ok(())
}
