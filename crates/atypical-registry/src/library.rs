//! Runtime classes reachable from source code.
//!
//! These declarations describe the parts of the runtime library the language
//! can call into. They take part in lookups but are never emitted.

use atypical_core::{OBJECT_CLASS, STRING_CLASS, Type, VOID_MARKER_CLASS};

use crate::decl::{FieldDecl, MethodSig, TypeDecl, TypeKind};

pub const CLASS_CLASS: &str = "java/lang/Class";
pub const CONSTRUCTOR_CLASS: &str = "java/lang/reflect/Constructor";
pub const CHAR_SEQUENCE_CLASS: &str = "java/lang/CharSequence";
pub const PRINT_STREAM_CLASS: &str = "java/io/PrintStream";
pub const SYSTEM_CLASS: &str = "java/lang/System";
pub const INTEGER_CLASS: &str = "java/lang/Integer";
pub const MATH_CLASS: &str = "java/lang/Math";

fn obj(name: &str) -> Type {
    Type::from_qualified_name(name)
}

fn library(name: &str) -> TypeDecl {
    let decl = TypeDecl::new(name, TypeKind::Library);
    if name == OBJECT_CLASS {
        decl
    } else {
        decl.with_superclass(OBJECT_CLASS)
    }
}

/// Every library declaration, `java/lang/Object` first.
pub fn library_types() -> Vec<TypeDecl> {
    let string = Type::string;
    let class = || obj(CLASS_CLASS);

    vec![
        library(OBJECT_CLASS)
            .with_method(MethodSig::constructor(vec![]))
            .with_method(MethodSig::instance("toString", vec![], string()))
            .with_method(MethodSig::instance("equals", vec![Type::object()], Type::Boolean))
            .with_method(MethodSig::instance("hashCode", vec![], Type::Int))
            .with_method(MethodSig::instance("getClass", vec![], class())),
        library(STRING_CLASS)
            .with_method(MethodSig::instance("length", vec![], Type::Int))
            .with_method(MethodSig::instance("isEmpty", vec![], Type::Boolean))
            .with_method(MethodSig::instance("charAt", vec![Type::Int], Type::Char))
            .with_method(MethodSig::instance("concat", vec![string()], string()))
            .with_method(MethodSig::instance(
                "replace",
                vec![Type::Char, Type::Char],
                string(),
            ))
            .with_method(MethodSig::instance(
                "replace",
                vec![obj(CHAR_SEQUENCE_CLASS), obj(CHAR_SEQUENCE_CLASS)],
                string(),
            ))
            .with_method(MethodSig::static_method("valueOf", vec![Type::Int], string()))
            .with_method(MethodSig::static_method(
                "valueOf",
                vec![Type::object()],
                string(),
            )),
        library(CHAR_SEQUENCE_CLASS),
        library(SYSTEM_CLASS)
            .with_field(FieldDecl::new_static("out", obj(PRINT_STREAM_CLASS)))
            .with_field(FieldDecl::new_static("err", obj(PRINT_STREAM_CLASS))),
        print_stream(),
        library(INTEGER_CLASS)
            .with_method(MethodSig::static_method("toString", vec![Type::Int], string()))
            .with_method(MethodSig::static_method("parseInt", vec![string()], Type::Int)),
        library(MATH_CLASS)
            .with_method(MethodSig::static_method("abs", vec![Type::Int], Type::Int))
            .with_method(MethodSig::static_method("abs", vec![Type::Long], Type::Long))
            .with_method(MethodSig::static_method("abs", vec![Type::Double], Type::Double))
            .with_method(MethodSig::static_method(
                "max",
                vec![Type::Int, Type::Int],
                Type::Int,
            ))
            .with_method(MethodSig::static_method(
                "min",
                vec![Type::Int, Type::Int],
                Type::Int,
            )),
        library(VOID_MARKER_CLASS),
        library(CLASS_CLASS)
            .with_method(MethodSig::instance("getName", vec![], string()))
            .with_method(MethodSig::static_method("forName", vec![string()], class()))
            .with_method(MethodSig::instance(
                "getDeclaredConstructor",
                vec![Type::array_of(class())],
                obj(CONSTRUCTOR_CLASS),
            )),
        library(CONSTRUCTOR_CLASS).with_method(MethodSig::instance(
            "newInstance",
            vec![Type::array_of(Type::object())],
            Type::object(),
        )),
    ]
}

fn print_stream() -> TypeDecl {
    let mut decl = library(PRINT_STREAM_CLASS)
        .with_method(MethodSig::instance("println", vec![], Type::Void));
    for ty in [
        Type::string(),
        Type::Int,
        Type::Long,
        Type::Float,
        Type::Double,
        Type::Boolean,
        Type::Char,
        Type::object(),
    ] {
        decl = decl
            .with_method(MethodSig::instance("println", vec![ty.clone()], Type::Void))
            .with_method(MethodSig::instance("print", vec![ty], Type::Void));
    }
    decl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_comes_first_and_has_no_superclass() {
        let types = library_types();
        assert_eq!(types[0].name, OBJECT_CLASS);
        assert!(types[0].superclass.is_none());
        assert!(types[1..].iter().all(|t| t.superclass.as_deref() == Some(OBJECT_CLASS)));
    }

    #[test]
    fn println_prefers_string_for_null() {
        let stream = print_stream();
        let m = stream.find_method("println", &[Type::Unknown]).unwrap();
        assert_eq!(m.params, vec![Type::string()]);
        assert!(stream.find_method("println", &[Type::Int]).is_some());
        assert!(stream.find_method("println", &[Type::Short]).is_none());
    }

    #[test]
    fn system_out_is_static() {
        let types = library_types();
        let system = types.iter().find(|t| t.name == SYSTEM_CLASS).unwrap();
        let out = system.field("out").unwrap();
        assert!(out.is_static);
        assert_eq!(out.ty, obj(PRINT_STREAM_CLASS));
    }
}
