//! Structural declarations: one [`TypeDecl`] per emitted (or library) class.

use atypical_core::{
    MethodDescriptor, OBJECT_CLASS, RegistrationError, Span, Type, TypeHash, VOID_MARKER_CLASS,
    to_binary_name,
};

/// Name of every constructor.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Name of the field holding the wrapped struct inside an adapter.
pub const WRAPPED_FIELD: &str = "wrapped";

/// What a declaration was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// `module` with its own fields and instance methods.
    Module,
    /// `struct`: fields only.
    Struct,
    /// `trait`: an interface with abstract methods.
    Trait,
    /// Adapter class synthesized for an `impl Trait for Struct`.
    TraitImpl,
    /// Per-file class holding the file's global functions.
    GlobalFunctionHolder,
    /// A runtime type that is referenced but never emitted.
    Library,
}

impl TypeKind {
    /// Whether classes of this kind are written out.
    pub fn is_emitted(self) -> bool {
        !matches!(self, TypeKind::Library)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Module => "module",
            TypeKind::Struct => "struct",
            TypeKind::Trait => "trait",
            TypeKind::TraitImpl => "impl",
            TypeKind::GlobalFunctionHolder => "globals",
            TypeKind::Library => "library",
        }
    }
}

/// A field, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
    pub span: Span,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: Type, span: Span) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            span,
        }
    }

    /// A static field (library types only; source types have none).
    pub fn new_static(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: true,
            span: Span::default(),
        }
    }
}

/// A method signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Type>,
    /// Parameter names; empty for synthesized and library methods.
    pub param_names: Vec<String>,
    pub ret: Type,
    pub is_static: bool,
    pub is_abstract: bool,
    pub span: Span,
}

impl MethodSig {
    /// A public instance method.
    pub fn instance(name: impl Into<String>, params: Vec<Type>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params,
            param_names: Vec::new(),
            ret,
            is_static: false,
            is_abstract: false,
            span: Span::default(),
        }
    }

    /// A public static method.
    pub fn static_method(name: impl Into<String>, params: Vec<Type>, ret: Type) -> Self {
        Self {
            is_static: true,
            ..Self::instance(name, params, ret)
        }
    }

    /// A constructor taking `params`.
    pub fn constructor(params: Vec<Type>) -> Self {
        Self::instance(CONSTRUCTOR_NAME, params, Type::Void)
    }

    pub fn with_param_names(mut self, names: Vec<String>) -> Self {
        self.param_names = names;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn into_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn descriptor(&self) -> MethodDescriptor {
        MethodDescriptor::new(self.params.clone(), self.ret.clone())
    }

    /// Parameters visible to callers.
    ///
    /// Constructors of structs and modules end in a `java/lang/Void`
    /// marker that callers never write; it is stripped here.
    pub fn source_params(&self) -> &[Type] {
        match self.params.last() {
            Some(Type::Object(name)) if self.is_constructor() && name == VOID_MARKER_CLASS => {
                &self.params[..self.params.len() - 1]
            }
            _ => &self.params,
        }
    }

    /// Whether the signature ends in the constructor marker parameter.
    pub fn has_marker(&self) -> bool {
        self.source_params().len() != self.params.len()
    }

    /// Same name and descriptor.
    pub fn same_signature(&self, other: &MethodSig) -> bool {
        self.name == other.name && self.params == other.params && self.ret == other.ret
    }
}

/// The trait and struct an adapter connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub trait_name: String,
    pub struct_name: String,
}

/// A class-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodSig>,
    /// Set for [`TypeKind::TraitImpl`].
    pub adapter: Option<AdapterInfo>,
    /// File the declaration came from.
    pub source_file: Option<String>,
    pub span: Span,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        let superclass = match kind {
            TypeKind::Library => None,
            _ => Some(OBJECT_CLASS.to_string()),
        };
        Self {
            name: name.into(),
            kind,
            superclass,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            adapter: None,
            source_file: None,
            span: Span::default(),
        }
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodSig) -> Self {
        self.methods.push(method);
        self
    }

    /// Append a field, rejecting a second field with the same name.
    pub fn add_field(&mut self, field: FieldDecl) -> Result<(), RegistrationError> {
        if self.field(&field.name).is_some() {
            return Err(RegistrationError::DuplicateField {
                owner: to_binary_name(&self.name),
                name: field.name,
                span: field.span,
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Append a method, rejecting a second method with the same descriptor.
    pub fn add_method(&mut self, method: MethodSig) -> Result<(), RegistrationError> {
        if self.methods.iter().any(|m| m.same_signature(&method)) {
            return Err(RegistrationError::DuplicateMethod {
                owner: to_binary_name(&self.name),
                descriptor: method.descriptor().to_string(),
                name: method.name,
                span: method.span,
            });
        }
        self.methods.push(method);
        Ok(())
    }

    pub fn type_hash(&self) -> TypeHash {
        TypeHash::from_name(&self.name)
    }

    /// The object type of this declaration.
    pub fn as_type(&self) -> Type {
        Type::from_qualified_name(self.name.clone())
    }

    /// Traits are interfaces on the target.
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Trait
    }

    pub fn is_trait(&self) -> bool {
        self.kind == TypeKind::Trait
    }

    /// Structs and modules can be instantiated and can implement traits.
    pub fn is_instantiable(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Module)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All methods named `name`, in declaration order.
    pub fn methods_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a MethodSig> + use<'a, 'n> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// First method named `name` whose parameters accept `args`.
    pub fn find_method(&self, name: &str, args: &[Type]) -> Option<&MethodSig> {
        self.methods_named(name)
            .find(|m| !m.is_constructor() && MethodDescriptor::matches(&m.params, args))
    }

    /// First constructor accepting `args` (marker parameter excluded).
    pub fn find_constructor(&self, args: &[Type]) -> Option<&MethodSig> {
        self.methods_named(CONSTRUCTOR_NAME)
            .find(|m| MethodDescriptor::matches(m.source_params(), args))
    }

    /// Method with exactly this name and descriptor.
    pub fn find_exact(&self, name: &str, descriptor: &MethodDescriptor) -> Option<&MethodSig> {
        self.methods_named(name)
            .find(|m| m.params == descriptor.params && m.ret == descriptor.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> TypeDecl {
        TypeDecl::new("geo/Point", TypeKind::Struct)
            .with_field(FieldDecl::new("x", Type::Int, Span::default()))
            .with_field(FieldDecl::new("y", Type::Int, Span::default()))
            .with_method(MethodSig::constructor(vec![
                Type::Int,
                Type::Int,
                Type::from_qualified_name(VOID_MARKER_CLASS),
            ]))
    }

    #[test]
    fn constructor_marker_is_hidden_from_callers() {
        let decl = point();
        let ctor = decl.find_constructor(&[Type::Int, Type::Int]).unwrap();
        assert!(ctor.has_marker());
        assert_eq!(ctor.source_params(), &[Type::Int, Type::Int]);
        assert_eq!(ctor.descriptor().to_string(), "(IILjava/lang/Void;)V");
        assert!(decl.find_constructor(&[Type::Int]).is_none());
    }

    #[test]
    fn find_method_takes_first_match() {
        let decl = TypeDecl::new("app/Log", TypeKind::Module)
            .with_method(MethodSig::instance("put", vec![Type::string()], Type::Void))
            .with_method(MethodSig::instance("put", vec![Type::object()], Type::Void));

        let found = decl.find_method("put", &[Type::Unknown]).unwrap();
        assert_eq!(found.params, vec![Type::string()]);

        let found = decl.find_method("put", &[Type::object()]).unwrap();
        assert_eq!(found.params, vec![Type::object()]);

        assert!(decl.find_method("put", &[Type::Int]).is_none());
    }

    #[test]
    fn lookups_outlive_the_name() {
        let decl = point();
        let ctor = {
            let name = String::from(CONSTRUCTOR_NAME);
            decl.methods_named(&name).next()
        };
        assert!(ctor.is_some_and(MethodSig::is_constructor));
    }

    #[test]
    fn fields_in_order() {
        let decl = point();
        let names: Vec<_> = decl.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(decl.field("y").map(|f| &f.ty), Some(&Type::Int));
        assert!(decl.field("z").is_none());
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut decl = point();
        let err = decl
            .add_field(FieldDecl::new("x", Type::Long, Span::new(3, 5, 1)))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateField { ref name, .. } if name == "x"));
        assert_eq!(err.span(), Span::new(3, 5, 1));

        decl.add_method(MethodSig::instance("len", vec![], Type::Int)).unwrap();
        decl.add_method(MethodSig::instance("len", vec![Type::Int], Type::Int))
            .unwrap();
        let err = decl
            .add_method(MethodSig::instance("len", vec![], Type::Int))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "at 0:0: duplicate method 'geo.Point.len()I'"
        );
    }

    #[test]
    fn library_types_have_no_implicit_superclass() {
        assert!(TypeDecl::new("java/lang/Object", TypeKind::Library).superclass.is_none());
        assert_eq!(
            TypeDecl::new("a/B", TypeKind::Struct).superclass.as_deref(),
            Some(OBJECT_CLASS)
        );
        assert!(!TypeKind::Library.is_emitted());
    }
}
