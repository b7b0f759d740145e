//! Class file constant pool.
//!
//! Entries are deduplicated: asking for the same constant twice returns the
//! same index. Long and double entries take two indexes.

use atypical_compiler::bytecode::Constant;
use atypical_core::EmitError;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use super::bytes::ByteWriter;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Integer(i32),
    Float(OrderedFloat<f32>),
    Long(i64),
    Double(OrderedFloat<f64>),
    Class(u16),
    String(u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    InterfaceMethodref(u16, u16),
    NameAndType(u16, u16),
}

impl Entry {
    fn is_wide(&self) -> bool {
        matches!(self, Entry::Long(_) | Entry::Double(_))
    }
}

/// Constant pool under construction.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Entry>,
    indexes: FxHashMap<Entry, u16>,
    /// Next free index; index 0 is never used.
    next: u16,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    fn add(&mut self, entry: Entry) -> Result<u16, EmitError> {
        if let Some(&index) = self.indexes.get(&entry) {
            return Ok(index);
        }
        let index = self.next;
        let width = if entry.is_wide() { 2 } else { 1 };
        self.next = index
            .checked_add(width)
            .ok_or(EmitError::ConstantPoolOverflow)?;
        self.indexes.insert(entry.clone(), index);
        self.entries.push(entry);
        Ok(index)
    }

    /// Fails when the modified UTF-8 form does not fit the `u16` length
    /// field.
    pub fn utf8(&mut self, value: &str) -> Result<u16, EmitError> {
        let length = modified_utf8(value).len();
        if u16::try_from(length).is_err() {
            return Err(EmitError::ConstantTooLong { length });
        }
        self.add(Entry::Utf8(value.to_string()))
    }

    pub fn class(&mut self, internal_name: &str) -> Result<u16, EmitError> {
        let name = self.utf8(internal_name)?;
        self.add(Entry::Class(name))
    }

    pub fn string(&mut self, value: &str) -> Result<u16, EmitError> {
        let utf8 = self.utf8(value)?;
        self.add(Entry::String(utf8))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, EmitError> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.add(Entry::NameAndType(name, descriptor))
    }

    pub fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16, EmitError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.add(Entry::Fieldref(class, nat))
    }

    pub fn method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
        interface: bool,
    ) -> Result<u16, EmitError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        if interface {
            self.add(Entry::InterfaceMethodref(class, nat))
        } else {
            self.add(Entry::Methodref(class, nat))
        }
    }

    /// Entry for an `LDC` operand.
    pub fn constant(&mut self, constant: &Constant) -> Result<u16, EmitError> {
        match constant {
            Constant::Int(v) => self.add(Entry::Integer(*v)),
            Constant::Long(v) => self.add(Entry::Long(*v)),
            Constant::Float(v) => self.add(Entry::Float(*v)),
            Constant::Double(v) => self.add(Entry::Double(*v)),
            Constant::String(s) => self.string(s),
        }
    }

    /// Value of the `constant_pool_count` item.
    pub fn count(&self) -> u16 {
        self.next
    }

    pub fn write(&self, out: &mut ByteWriter) -> Result<(), EmitError> {
        out.u16(self.count());
        for entry in &self.entries {
            match entry {
                Entry::Utf8(value) => {
                    let bytes = modified_utf8(value);
                    out.u8(TAG_UTF8);
                    let length = u16::try_from(bytes.len())
                        .map_err(|_| EmitError::ConstantTooLong { length: bytes.len() })?;
                    out.u16(length);
                    out.bytes(&bytes);
                }
                Entry::Integer(v) => {
                    out.u8(TAG_INTEGER);
                    out.u32(*v as u32);
                }
                Entry::Float(v) => {
                    out.u8(TAG_FLOAT);
                    out.u32(v.0.to_bits());
                }
                Entry::Long(v) => {
                    out.u8(TAG_LONG);
                    out.u64(*v as u64);
                }
                Entry::Double(v) => {
                    out.u8(TAG_DOUBLE);
                    out.u64(v.0.to_bits());
                }
                Entry::Class(name) => {
                    out.u8(TAG_CLASS);
                    out.u16(*name);
                }
                Entry::String(utf8) => {
                    out.u8(TAG_STRING);
                    out.u16(*utf8);
                }
                Entry::Fieldref(class, nat) => {
                    out.u8(TAG_FIELDREF);
                    out.u16(*class);
                    out.u16(*nat);
                }
                Entry::Methodref(class, nat) => {
                    out.u8(TAG_METHODREF);
                    out.u16(*class);
                    out.u16(*nat);
                }
                Entry::InterfaceMethodref(class, nat) => {
                    out.u8(TAG_INTERFACE_METHODREF);
                    out.u16(*class);
                    out.u16(*nat);
                }
                Entry::NameAndType(name, descriptor) => {
                    out.u8(TAG_NAME_AND_TYPE);
                    out.u16(*name);
                    out.u16(*descriptor);
                }
            }
        }
        Ok(())
    }
}

/// Modified UTF-8: NUL is two bytes and supplementary characters are
/// encoded as surrogate pairs of three bytes each.
pub fn modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}
