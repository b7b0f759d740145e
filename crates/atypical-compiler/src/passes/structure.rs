//! Structural pass (pass 1): declarations to [`TypeDecl`]s.
//!
//! Walks every file in input order and every item in declaration order,
//! producing one declaration per module, struct, trait and impl adapter,
//! plus one global function holder per file that has global functions.
//! Method bodies are not looked at; each one becomes a [`BodyJob`] for the
//! compilation pass.
//!
//! Impl adapters are registered after the declarations of every file, and
//! impls are validated only then, so an impl may name a trait or struct
//! declared in a later file.

use atypical_core::{
    AtypicalError, RegistrationError, Span, Type, VOID_MARKER_CLASS, to_binary_name,
    to_internal_name,
};
use atypical_parser::SourceFile;
use atypical_parser::ast::{Field, FunctionDecl, FunctionSig, ImplDecl, Item, ModuleDecl, Path, StructDecl, TraitDecl};
use atypical_registry::{
    AdapterInfo, FieldDecl, IndexBuilder, MethodSig, StructuralIndex, TypeDecl, TypeKind, WRAPPED_FIELD,
    adapter_name, library_types,
};
use rustc_hash::FxHashSet;

use super::{MethodKey, SourceUnit};
use crate::type_resolver::TypeResolver;

/// A method body waiting for the compilation pass.
#[derive(Debug, Clone, Copy)]
pub struct BodyJob<'ast> {
    /// Index of the declaring file in the input.
    pub unit: usize,
    pub decl: &'ast FunctionDecl<'ast>,
}

/// Result of the structural pass.
pub struct StructureOutput<'ast> {
    pub index: StructuralIndex,
    /// Bodies in file and declaration order, keyed by the method they
    /// implement.
    pub jobs: Vec<(MethodKey, BodyJob<'ast>)>,
    /// Global function holder of each file, if it has one.
    pub holders: Vec<Option<String>>,
}

/// An impl recorded for validation once every file is registered.
struct PendingImpl {
    adapter: String,
    trait_name: String,
    struct_name: String,
    span: Span,
    unit: usize,
}

/// Run the structural pass over `units`.
#[tracing::instrument(skip_all, fields(files = units.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn build<'ast>(units: &[SourceUnit<'ast>]) -> Result<StructureOutput<'ast>, AtypicalError> {
    let known = known_type_names(units);
    let mut builder = IndexBuilder::with_library();
    let mut jobs = Vec::new();
    let mut holders = Vec::with_capacity(units.len());
    let mut pending = Vec::new();
    let mut adapters = Vec::new();

    for (unit_index, unit) in units.iter().enumerate() {
        let mut pass = FilePass {
            unit: unit_index,
            source_name: source_file_name(unit.name),
            holder_name: holder_name(unit.name),
            resolver: TypeResolver::new(unit.file.aliases(), &known),
            decls: Vec::new(),
            holder: None,
            jobs: &mut jobs,
            pending: &mut pending,
            adapters: Vec::new(),
        };
        pass.run(unit.file)
            .map_err(|source| registration_error(unit.name, source))?;

        holders.push(pass.holder.is_some().then(|| pass.holder_name.clone()));
        let (decls, file_adapters) = pass.finish();
        adapters.extend(file_adapters.into_iter().map(|decl| (unit_index, decl)));
        for decl in decls {
            tracing::debug!(name = %decl.name, kind = decl.kind.as_str(), "registered type");
            builder
                .register_type(decl)
                .map_err(|source| registration_error(unit.name, source))?;
        }
    }

    for (unit_index, decl) in adapters {
        tracing::debug!(name = %decl.name, "registered adapter");
        builder
            .register_type(decl)
            .map_err(|source| registration_error(units[unit_index].name, source))?;
    }

    for implementation in &pending {
        validate_impl(&builder, implementation)
            .map_err(|source| registration_error(units[implementation.unit].name, source))?;
        builder.register_impl(&implementation.struct_name, &implementation.trait_name);
    }

    Ok(StructureOutput {
        index: builder.build(),
        jobs,
        holders,
    })
}

/// Library names plus every type any file declares, so types resolve
/// regardless of declaration order.
fn known_type_names(units: &[SourceUnit<'_>]) -> FxHashSet<String> {
    let mut known: FxHashSet<String> = library_types().into_iter().map(|decl| decl.name).collect();
    for unit in units {
        for item in unit.file.items() {
            let name = match item {
                Item::Module(module) => module.name,
                Item::Struct(decl) => decl.name,
                Item::Trait(decl) => decl.name,
                _ => continue,
            };
            known.insert(declared_name(&name));
        }
    }
    known
}

fn declared_name(path: &Path<'_>) -> String {
    to_internal_name(&path.dotted())
}

/// `dir/shapes.atp` -> `shapes`
pub(crate) fn holder_name(file: &str) -> String {
    let base = source_file_name(file);
    base.strip_suffix(".atp").unwrap_or(&base).to_string()
}

/// File name without directories.
fn source_file_name(file: &str) -> String {
    file.rsplit(['/', '\\']).next().unwrap_or(file).to_string()
}

fn registration_error(file: &str, source: RegistrationError) -> AtypicalError {
    AtypicalError::Registration {
        file: file.to_string(),
        source,
    }
}

/// Declarations of one file, collected in order.
struct FilePass<'p, 'ast> {
    unit: usize,
    source_name: String,
    holder_name: String,
    resolver: TypeResolver<'p, FxHashSet<String>>,
    decls: Vec<TypeDecl>,
    /// Position of the holder in `decls`, once the first global function
    /// has been seen.
    holder: Option<usize>,
    jobs: &'p mut Vec<(MethodKey, BodyJob<'ast>)>,
    pending: &'p mut Vec<PendingImpl>,
    /// Impl adapters, registered after every file's declarations.
    adapters: Vec<TypeDecl>,
}

impl<'p, 'ast> FilePass<'p, 'ast> {
    fn run(&mut self, file: &SourceFile<'ast>) -> Result<(), RegistrationError> {
        for item in file.items() {
            match item {
                Item::Import(_) => {}
                Item::Module(module) => self.module(module)?,
                Item::Struct(decl) => self.structure(decl)?,
                Item::Trait(decl) => self.trait_decl(decl)?,
                Item::Impl(decl) => self.impl_decl(decl)?,
                Item::Function(func) => self.global_function(func)?,
            }
        }
        Ok(())
    }

    fn finish(self) -> (Vec<TypeDecl>, Vec<TypeDecl>) {
        (self.decls, self.adapters)
    }

    fn new_decl(&self, name: String, kind: TypeKind, span: Span) -> TypeDecl {
        TypeDecl::new(name, kind)
            .with_span(span)
            .with_source_file(self.source_name.clone())
    }

    fn structure(&mut self, decl: &StructDecl<'ast>) -> Result<(), RegistrationError> {
        let mut ty = self.new_decl(declared_name(&decl.name), TypeKind::Struct, decl.span);
        self.add_fields(&mut ty, decl.fields)?;
        self.decls.push(ty);
        Ok(())
    }

    fn module(&mut self, module: &ModuleDecl<'ast>) -> Result<(), RegistrationError> {
        let mut ty = self.new_decl(declared_name(&module.name), TypeKind::Module, module.span);
        self.add_fields(&mut ty, module.fields)?;
        for method in module.methods {
            self.add_body(&mut ty, method, false)?;
        }
        self.decls.push(ty);
        Ok(())
    }

    /// Fields in order, then the constructor taking them plus the marker.
    fn add_fields(&self, ty: &mut TypeDecl, fields: &[Field<'ast>]) -> Result<(), RegistrationError> {
        let mut params = Vec::with_capacity(fields.len() + 1);
        for field in fields {
            let field_ty = self.resolver.resolve(&field.ty);
            params.push(field_ty.clone());
            ty.add_field(FieldDecl::new(field.name.name, field_ty, field.span))?;
        }
        params.push(Type::from_qualified_name(VOID_MARKER_CLASS));
        ty.add_method(MethodSig::constructor(params).with_span(ty.span))
    }

    fn trait_decl(&mut self, decl: &TraitDecl<'ast>) -> Result<(), RegistrationError> {
        let mut ty = self.new_decl(declared_name(&decl.name), TypeKind::Trait, decl.span);
        for sig in decl.methods {
            ty.add_method(self.signature(sig, false).into_abstract())?;
        }
        self.decls.push(ty);
        Ok(())
    }

    fn impl_decl(&mut self, decl: &ImplDecl<'ast>) -> Result<(), RegistrationError> {
        let trait_ty = self.resolver.resolve(&decl.trait_ty);
        let Type::Object(trait_name) = trait_ty else {
            return Err(RegistrationError::NotATrait {
                name: decl.trait_ty.path.dotted(),
                span: decl.trait_ty.span,
            });
        };
        let struct_ty = self.resolver.resolve(&decl.target);
        let Type::Object(struct_name) = struct_ty.clone() else {
            return Err(RegistrationError::UnknownImplTarget {
                name: decl.target.path.dotted(),
                span: decl.target.span,
            });
        };

        let name = adapter_name(&trait_name, &struct_name);
        let mut ty = self.new_decl(name.clone(), TypeKind::TraitImpl, decl.span);
        ty.interfaces.push(trait_name.clone());
        ty.adapter = Some(AdapterInfo {
            trait_name: trait_name.clone(),
            struct_name: struct_name.clone(),
        });
        ty.add_field(FieldDecl::new(WRAPPED_FIELD, struct_ty.clone(), decl.span))?;
        ty.add_method(MethodSig::constructor(vec![struct_ty]).with_span(decl.span))?;
        for method in decl.methods {
            self.add_body(&mut ty, method, false)?;
        }
        self.adapters.push(ty);

        self.pending.push(PendingImpl {
            adapter: name,
            trait_name,
            struct_name,
            span: decl.span,
            unit: self.unit,
        });
        Ok(())
    }

    fn global_function(&mut self, func: &'ast FunctionDecl<'ast>) -> Result<(), RegistrationError> {
        let position = match self.holder {
            Some(position) => position,
            None => {
                let holder = self.new_decl(self.holder_name.clone(), TypeKind::GlobalFunctionHolder, func.span);
                self.decls.push(holder);
                let position = self.decls.len() - 1;
                self.holder = Some(position);
                position
            }
        };
        let sig = self.signature(&func.sig, true);
        let owner = self.decls[position].name.clone();
        self.push_job(&owner, &sig, func);
        self.decls[position].add_method(sig)
    }

    fn add_body(
        &mut self,
        ty: &mut TypeDecl,
        func: &'ast FunctionDecl<'ast>,
        is_static: bool,
    ) -> Result<(), RegistrationError> {
        let sig = self.signature(&func.sig, is_static);
        self.push_job(&ty.name, &sig, func);
        ty.add_method(sig)
    }

    fn push_job(&mut self, owner: &str, sig: &MethodSig, decl: &'ast FunctionDecl<'ast>) {
        self.jobs.push((
            MethodKey::new(owner, sig),
            BodyJob {
                unit: self.unit,
                decl,
            },
        ));
    }

    fn signature(&self, sig: &FunctionSig<'ast>, is_static: bool) -> MethodSig {
        let params = sig.params.iter().map(|p| self.resolver.resolve(&p.ty)).collect();
        let ret = sig
            .return_ty
            .as_ref()
            .map_or(Type::Void, |ty| self.resolver.resolve(ty));
        let names = sig.params.iter().map(|p| p.name.name.to_string()).collect();
        let method = if is_static {
            MethodSig::static_method(sig.name.name, params, ret)
        } else {
            MethodSig::instance(sig.name.name, params, ret)
        };
        method.with_param_names(names).with_span(sig.span)
    }
}

/// The trait must be a trait, the target a struct or module, and the
/// adapter must implement every trait method with the same descriptor.
fn validate_impl(builder: &IndexBuilder, implementation: &PendingImpl) -> Result<(), RegistrationError> {
    let trait_decl = builder
        .get(&implementation.trait_name)
        .filter(|decl| decl.is_trait())
        .ok_or_else(|| RegistrationError::NotATrait {
            name: to_binary_name(&implementation.trait_name),
            span: implementation.span,
        })?;

    let is_target = builder
        .get(&implementation.struct_name)
        .is_some_and(|decl| decl.is_instantiable());
    if !is_target {
        return Err(RegistrationError::UnknownImplTarget {
            name: to_binary_name(&implementation.struct_name),
            span: implementation.span,
        });
    }

    let adapter = builder
        .get(&implementation.adapter)
        .ok_or_else(|| RegistrationError::UnknownImplTarget {
            name: to_binary_name(&implementation.adapter),
            span: implementation.span,
        })?;
    for method in &trait_decl.methods {
        let descriptor = method.descriptor();
        if adapter.find_exact(&method.name, &descriptor).is_none() {
            return Err(RegistrationError::MissingTraitMethod {
                trait_name: to_binary_name(&implementation.trait_name),
                struct_name: to_binary_name(&implementation.struct_name),
                method: method.name.clone(),
                descriptor: descriptor.to_string(),
                span: implementation.span,
            });
        }
    }
    Ok(())
}
