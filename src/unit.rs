//! Compilation unit API.
//!
//! A [`Unit`] collects named source files and compiles them together, so
//! declarations in one file are visible from every other.
//!
//! # Example
//!
//! ```ignore
//! use atypical::Unit;
//!
//! let mut unit = Unit::new();
//! unit.add_source("geo.atp", "struct geo.Point { x: int; y: int; }");
//! unit.add_source("main.atp", r#"
//!     import geo.Point;
//!     fn origin(): Point { return new Point(0, 0); }
//! "#);
//!
//! // One class file per declared type
//! for class in unit.build()? {
//!     println!("{} ({} bytes)", class.name, class.bytes.len());
//! }
//! ```

use std::path::PathBuf;

use atypical_compiler::{ClassEmitter, CompiledProgram, CompilerOptions, SourceUnit, compile_program};
use atypical_core::AtypicalError;
use atypical_parser::{Parser, SourceFile};
use bumpalo::Bump;

use crate::classfile::ClassFileWriter;

/// A source file added to a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub name: String,
    pub text: String,
}

/// One serialized class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    /// Slash separated qualified name.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ClassFile {
    /// `a/b/C` becomes `a/b/C.class`.
    pub fn relative_path(&self) -> PathBuf {
        self.name.split('/').collect::<PathBuf>().with_file_name(format!("{}.class", self.simple_name()))
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// A set of source files compiled together.
#[derive(Debug, Default)]
pub struct Unit {
    options: CompilerOptions,
    /// In the order they were added.
    sources: Vec<SourceText>,
}

impl Unit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            sources: Vec::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Add a source file. Adding a name again replaces its text in place.
    pub fn add_source(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        let text = text.into();
        match self.sources.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.text = text,
            None => self.sources.push(SourceText { name, text }),
        }
    }

    pub fn sources(&self) -> &[SourceText] {
        &self.sources
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Parse every file, then run the structural, synthesis and body
    /// passes. Nothing is serialized.
    #[tracing::instrument(skip_all, fields(files = self.sources.len()))]
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self) -> Result<CompiledProgram, AtypicalError> {
        let arena = Bump::new();
        let files = self
            .sources
            .iter()
            .map(|source| parse_source(source, &arena))
            .collect::<Result<Vec<_>, _>>()?;
        let units: Vec<_> = self
            .sources
            .iter()
            .zip(&files)
            .map(|(source, file)| SourceUnit::new(&source.name, file))
            .collect();
        compile_program(&units, &self.options)
    }

    /// Compile and write every class with the default [`ClassFileWriter`].
    pub fn build(&self) -> Result<Vec<ClassFile>, AtypicalError> {
        self.build_with(&mut ClassFileWriter::new())
    }

    /// Compile and serialize every class with `emitter`, in declaration
    /// order.
    pub fn build_with(&self, emitter: &mut dyn ClassEmitter) -> Result<Vec<ClassFile>, AtypicalError> {
        let program = self.compile()?;
        program
            .classes
            .iter()
            .map(|class| {
                let bytes = emitter.emit(class).map_err(|source| AtypicalError::Emit {
                    class: class.name.clone(),
                    source,
                })?;
                Ok(ClassFile {
                    name: class.name.clone(),
                    bytes,
                })
            })
            .collect()
    }
}

fn parse_source<'ast>(source: &SourceText, arena: &'ast Bump) -> Result<SourceFile<'ast>, AtypicalError> {
    tracing::debug!(file = %source.name, "parsing");
    Parser::parse(&source.text, arena).map_err(|errors| AtypicalError::Parse {
        file: source.name.clone(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_follow_packages() {
        let class = ClassFile {
            name: "geo/shapes/Point".into(),
            bytes: vec![],
        };
        assert_eq!(class.relative_path(), PathBuf::from("geo/shapes/Point.class"));
    }

    #[test]
    fn adding_a_name_twice_replaces_it() {
        let mut unit = Unit::new();
        unit.add_source("a.atp", "struct A { }");
        unit.add_source("b.atp", "struct B { }");
        unit.add_source("a.atp", "struct C { }");
        assert_eq!(unit.source_count(), 2);
        assert_eq!(unit.sources()[0].text, "struct C { }");
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut unit = Unit::new();
        unit.add_source("ok.atp", "struct A { }");
        unit.add_source("bad.atp", "struct { ");
        let err = unit.compile().unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.file(), Some("bad.atp"));
    }

    #[test]
    fn build_writes_one_class_per_type() {
        let mut unit = Unit::new();
        unit.add_source("main.atp", "struct A { x: int; }\nfn f(): int { return 1; }");
        let classes = unit.build().unwrap();
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "main"]);
        assert!(classes.iter().all(|c| c.bytes.starts_with(&[0xca, 0xfe, 0xba, 0xbe])));
    }
}
