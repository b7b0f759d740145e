//! Compiled class records and the serialization seam.
//!
//! A [`ClassRecord`] is everything needed to write one class: names, access
//! flags, fields, and methods with their compiled [`Code`]. Turning records
//! into bytes is the job of a [`ClassEmitter`].

use std::fmt;

use bitflags::bitflags;

use atypical_core::EmitError;
use atypical_registry::{FieldDecl, MethodSig, TypeDecl, TypeKind, WRAPPED_FIELD};

use crate::bytecode::Code;

bitflags! {
    /// Class, field and method access flags with their class file values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        /// `ACC_SUPER` on classes.
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
    }
}

impl AccessFlags {
    /// Flags for a class or interface of `kind`.
    pub fn for_class(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Trait => Self::PUBLIC | Self::INTERFACE | Self::ABSTRACT,
            TypeKind::TraitImpl => Self::PUBLIC | Self::SUPER | Self::SYNTHETIC,
            _ => Self::PUBLIC | Self::SUPER,
        }
    }

    pub fn for_method(sig: &MethodSig) -> Self {
        let mut flags = Self::PUBLIC;
        if sig.is_static {
            flags |= Self::STATIC;
        }
        if sig.is_abstract {
            flags |= Self::ABSTRACT;
        }
        flags
    }

    pub fn for_field(field: &FieldDecl) -> Self {
        let mut flags = Self::PUBLIC;
        if field.is_static {
            flags |= Self::STATIC;
        }
        if field.name == WRAPPED_FIELD {
            flags |= Self::FINAL;
        }
        flags
    }
}

/// A field as written to the class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub name: String,
    pub descriptor: String,
    pub access: AccessFlags,
}

impl FieldRecord {
    pub fn from_decl(field: &FieldDecl) -> Self {
        Self {
            name: field.name.clone(),
            descriptor: field.ty.descriptor(),
            access: AccessFlags::for_field(field),
        }
    }
}

/// A method as written to the class. Abstract methods have no code.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRecord {
    pub name: String,
    pub descriptor: String,
    pub access: AccessFlags,
    pub code: Option<Code>,
}

impl MethodRecord {
    pub fn new(sig: &MethodSig, code: Option<Code>) -> Self {
        Self {
            name: sig.name.clone(),
            descriptor: sig.descriptor().to_string(),
            access: AccessFlags::for_method(sig),
            code,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.access.contains(AccessFlags::ABSTRACT)
    }

    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }
}

/// One compiled class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    /// Slash separated qualified name.
    pub name: String,
    pub kind: TypeKind,
    pub access: AccessFlags,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldRecord>,
    pub methods: Vec<MethodRecord>,
    /// File the class was declared in, without directories.
    pub source_file: Option<String>,
}

impl ClassRecord {
    /// Record for `decl` with its fields and no methods yet.
    pub fn from_decl(decl: &TypeDecl) -> Self {
        Self {
            name: decl.name.clone(),
            kind: decl.kind,
            access: AccessFlags::for_class(decl.kind),
            superclass: decl.superclass.clone(),
            interfaces: decl.interfaces.clone(),
            fields: decl.fields.iter().map(FieldRecord::from_decl).collect(),
            methods: Vec::new(),
            source_file: decl.source_file.clone(),
        }
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodRecord> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    /// First method named `name`.
    pub fn method_named(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_interface(&self) -> bool {
        self.access.contains(AccessFlags::INTERFACE)
    }
}

impl fmt::Display for ClassRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.name)?;
        if let Some(superclass) = &self.superclass {
            write!(f, " extends {superclass}")?;
        }
        if !self.interfaces.is_empty() {
            write!(f, " implements {}", self.interfaces.join(", "))?;
        }
        writeln!(f)?;
        for field in &self.fields {
            writeln!(f, "  field {} {}", field.name, field.descriptor)?;
        }
        for method in &self.methods {
            writeln!(f, "  method {}{}", method.name, method.descriptor)?;
            if let Some(code) = &method.code {
                write!(f, "{code}")?;
            }
        }
        Ok(())
    }
}

/// Serializes class records.
pub trait ClassEmitter {
    fn emit(&mut self, record: &ClassRecord) -> Result<Vec<u8>, EmitError>;
}
