//! Two-phase structural index.
//!
//! [`IndexBuilder`] collects declarations during the structural pass.
//! [`IndexBuilder::build`] consumes it into a [`StructuralIndex`], which has
//! no mutating methods: every type and trait implementation is known before
//! the first method body is compiled.
//!
//! # Example
//!
//! ```
//! use atypical_registry::{IndexBuilder, TypeDecl, TypeKind};
//!
//! let mut builder = IndexBuilder::with_library();
//! builder.register_type(TypeDecl::new("zoo/Dog", TypeKind::Struct)).unwrap();
//! builder.register_type(TypeDecl::new("zoo/Greeter", TypeKind::Trait)).unwrap();
//! builder.register_impl("zoo/Dog", "zoo/Greeter");
//!
//! let index = builder.build();
//! assert!(index.is_trait("zoo/Greeter"));
//! assert_eq!(index.trait_impls().traits_of("zoo/Dog"), ["zoo/Greeter"]);
//! ```

use rustc_hash::FxHashMap;

use atypical_core::{RegistrationError, Type, TypeHash};

use crate::decl::{FieldDecl, MethodSig, TypeDecl, TypeKind};
use crate::library::library_types;
use crate::trait_impls::{TraitImplRegistry, adapter_name};

/// Declarations in registration order, keyed by name hash.
///
/// Each hash maps to every declaration sharing it, so lookups and duplicate
/// checks compare full names.
#[derive(Debug, Clone, Default)]
struct TypeTable {
    types: Vec<TypeDecl>,
    by_hash: FxHashMap<TypeHash, Vec<usize>>,
}

impl TypeTable {
    fn insert(&mut self, decl: TypeDecl) -> Result<(), RegistrationError> {
        self.insert_hashed(decl.type_hash(), decl)
    }

    fn insert_hashed(&mut self, hash: TypeHash, decl: TypeDecl) -> Result<(), RegistrationError> {
        if self.find(hash, &decl.name).is_some() {
            return Err(RegistrationError::DuplicateType {
                name: atypical_core::to_binary_name(&decl.name),
                span: decl.span,
            });
        }
        self.by_hash.entry(hash).or_default().push(self.types.len());
        self.types.push(decl);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.find(TypeHash::from_name(name), name).map(|i| &self.types[i])
    }

    fn find(&self, hash: TypeHash, name: &str) -> Option<usize> {
        self.by_hash
            .get(&hash)?
            .iter()
            .copied()
            .find(|&i| self.types[i].name == name)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Mutable collection phase of the structural index.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    table: TypeTable,
    trait_impls: TraitImplRegistry,
}

impl IndexBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder with the runtime library declarations registered.
    pub fn with_library() -> Self {
        let mut builder = Self::new();
        for decl in library_types() {
            // Library names are distinct.
            let _ = builder.table.insert(decl);
        }
        builder
    }

    /// Register a declaration. A second declaration with the same
    /// qualified name is an error.
    pub fn register_type(&mut self, decl: TypeDecl) -> Result<(), RegistrationError> {
        self.table.insert(decl)
    }

    /// Record `impl trait_name for struct_name`.
    pub fn register_impl(&mut self, struct_name: &str, trait_name: &str) -> bool {
        self.trait_impls.register(struct_name, trait_name)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.table.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.types.is_empty()
    }

    /// Freeze the index.
    pub fn build(self) -> StructuralIndex {
        StructuralIndex {
            table: self.table,
            trait_impls: self.trait_impls,
        }
    }
}

// ============================================================================
// Frozen index
// ============================================================================

/// Read-only view of every declaration, shared by all later passes.
#[derive(Debug, Clone)]
pub struct StructuralIndex {
    table: TypeTable,
    trait_impls: TraitImplRegistry,
}

impl StructuralIndex {
    pub fn get(&self, name: &str) -> Option<&TypeDecl> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_trait(&self, name: &str) -> bool {
        self.get(name).is_some_and(TypeDecl::is_trait)
    }

    /// Declaration behind an object type.
    pub fn decl_of(&self, ty: &Type) -> Option<&TypeDecl> {
        ty.internal_name().and_then(|name| self.get(name))
    }

    /// All declarations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDecl> {
        self.table.types.iter()
    }

    /// Declarations that are written out, in registration order.
    pub fn emitted(&self) -> impl Iterator<Item = &TypeDecl> {
        self.iter().filter(|decl| decl.kind.is_emitted())
    }

    pub fn len(&self) -> usize {
        self.table.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.types.is_empty()
    }

    pub fn trait_impls(&self) -> &TraitImplRegistry {
        &self.trait_impls
    }

    /// Walk `name` and its superclasses.
    pub fn ancestors<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a TypeDecl> + 'a {
        let mut next = self.get(name);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.superclass.as_deref().and_then(|s| self.get(s));
            Some(current)
        })
    }

    /// Field `name` on `owner` or one of its superclasses.
    pub fn find_field(&self, owner: &str, name: &str) -> Option<(&TypeDecl, &FieldDecl)> {
        self.ancestors(owner)
            .find_map(|decl| decl.field(name).map(|field| (decl, field)))
    }

    /// First method on `owner` (then its superclasses) accepting `args`.
    ///
    /// Traits fall back to `java/lang/Object` like any other reference.
    pub fn find_method(
        &self,
        owner: &str,
        name: &str,
        args: &[Type],
    ) -> Option<(&TypeDecl, &MethodSig)> {
        self.ancestors(owner)
            .find_map(|decl| decl.find_method(name, args).map(|m| (decl, m)))
    }

    /// First trait implemented by `struct_name` that declares a matching
    /// method, probing traits in registration order.
    pub fn find_trait_method(
        &self,
        struct_name: &str,
        name: &str,
        args: &[Type],
    ) -> Option<(&TypeDecl, &MethodSig)> {
        self.trait_impls
            .traits_of(struct_name)
            .iter()
            .filter_map(|t| self.get(t))
            .find_map(|decl| decl.find_method(name, args).map(|m| (decl, m)))
    }

    /// The adapter class for `impl trait_name for struct_name`, if declared.
    pub fn adapter_for(&self, trait_name: &str, struct_name: &str) -> Option<&TypeDecl> {
        if !self.trait_impls.implements(struct_name, trait_name) {
            return None;
        }
        self.get(&adapter_name(trait_name, struct_name))
            .filter(|decl| decl.kind == TypeKind::TraitImpl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atypical_core::{OBJECT_CLASS, Span};

    fn builder() -> IndexBuilder {
        let mut builder = IndexBuilder::with_library();
        let dog = TypeDecl::new("zoo/Dog", TypeKind::Struct)
            .with_field(FieldDecl::new("name", Type::string(), Span::default()));
        let greeter = TypeDecl::new("zoo/Greeter", TypeKind::Trait).with_method(
            MethodSig::instance("greet", vec![], Type::string()).into_abstract(),
        );
        let mut adapter = TypeDecl::new(adapter_name("zoo/Greeter", "zoo/Dog"), TypeKind::TraitImpl);
        adapter.interfaces.push("zoo/Greeter".to_string());
        builder.register_type(dog).unwrap();
        builder.register_type(greeter).unwrap();
        builder.register_type(adapter).unwrap();
        builder.register_impl("zoo/Dog", "zoo/Greeter");
        builder
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = builder();
        let err = builder
            .register_type(TypeDecl::new("zoo/Dog", TypeKind::Module).with_span(Span::new(4, 1, 6)))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateType {
                name: "zoo.Dog".to_string(),
                span: Span::new(4, 1, 6),
            }
        );
    }

    #[test]
    fn colliding_hashes_keep_distinct_names() {
        let mut table = TypeTable::default();
        let hash = TypeHash::from_name("a/A");
        table.insert_hashed(hash, TypeDecl::new("a/A", TypeKind::Struct)).unwrap();
        table.insert_hashed(hash, TypeDecl::new("b/B", TypeKind::Struct)).unwrap();

        assert_eq!(table.find(hash, "b/B"), Some(1));
        assert_eq!(table.get("a/A").map(|d| d.name.as_str()), Some("a/A"));
        assert!(matches!(
            table.insert_hashed(hash, TypeDecl::new("b/B", TypeKind::Module)),
            Err(RegistrationError::DuplicateType { name, .. }) if name == "b.B"
        ));
    }

    #[test]
    fn emitted_skips_library_and_keeps_order() {
        let index = builder().build();
        let names: Vec<_> = index.emitted().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["zoo/Dog", "zoo/Greeter", "zoo/Greeter$zoo_Dog"]);
        assert!(index.contains(OBJECT_CLASS));
    }

    #[test]
    fn methods_are_found_through_superclasses() {
        let index = builder().build();
        let (owner, method) = index.find_method("zoo/Dog", "toString", &[]).unwrap();
        assert_eq!(owner.name, OBJECT_CLASS);
        assert_eq!(method.ret, Type::string());
        assert!(index.find_method("zoo/Dog", "greet", &[]).is_none());
        assert!(index.find_field("zoo/Dog", "name").is_some());
    }

    #[test]
    fn trait_methods_and_adapters() {
        let index = builder().build();
        let (owner, method) = index.find_trait_method("zoo/Dog", "greet", &[]).unwrap();
        assert_eq!(owner.name, "zoo/Greeter");
        assert!(method.is_abstract);

        let adapter = index.adapter_for("zoo/Greeter", "zoo/Dog").unwrap();
        assert_eq!(adapter.name, "zoo/Greeter$zoo_Dog");
        assert!(index.adapter_for("zoo/Greeter", OBJECT_CLASS).is_none());
    }

    #[test]
    fn decl_of_reads_object_types() {
        let index = builder().build();
        assert!(index.decl_of(&Type::from_qualified_name("zoo/Dog")).is_some());
        assert!(index.decl_of(&Type::Int).is_none());
        assert!(index.decl_of(&Type::from_qualified_name("zoo/Cat")).is_none());
    }
}
