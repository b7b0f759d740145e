//! Method descriptors and signature matching.

use std::fmt;

use crate::error::DescriptorError;
use crate::ty::Type;

/// Parameter and return types of a method, printable as `(params)ret`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl MethodDescriptor {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }

    /// `()V`
    pub fn void() -> Self {
        Self::new(Vec::new(), Type::Void)
    }

    /// Parse a method descriptor such as `(ILjava/lang/String;)V`.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let invalid = |reason: &str| DescriptorError::Invalid {
            descriptor: descriptor.to_string(),
            reason: reason.to_string(),
        };
        let mut rest = descriptor
            .strip_prefix('(')
            .ok_or_else(|| invalid("missing '('"))?;
        let mut params = Vec::new();
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            if rest.is_empty() {
                return Err(invalid("missing ')'"));
            }
            let (ty, after) = Type::parse_prefix(rest)?;
            if ty.is_void() {
                return Err(invalid("void parameter"));
            }
            params.push(ty);
            rest = after;
        }
        let ret = Type::parse_descriptor(rest)?;
        Ok(Self { params, ret })
    }

    /// Number of local slots taken by the parameters (excluding `this`).
    pub fn param_slots(&self) -> u16 {
        self.params.iter().map(Type::slot_size).sum()
    }

    /// Whether `args` can be passed to a method with these parameters.
    pub fn accepts_args(&self, args: &[Type]) -> bool {
        Self::matches(&self.params, args)
    }

    /// Signature matching rule used by overload resolution.
    ///
    /// Same arity, and every argument either equals its parameter or is
    /// `unknown`. No conversions and no ranking.
    pub fn matches(candidate_params: &[Type], args: &[Type]) -> bool {
        candidate_params.len() == args.len()
            && candidate_params
                .iter()
                .zip(args)
                .all(|(param, arg)| arg.is_unknown() || param == arg)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::from("(");
        for param in &self.params {
            param.write_descriptor(&mut out);
        }
        out.push(')');
        self.ret.write_descriptor(&mut out);
        f.write_str(&out)
    }
}

/// Render argument types the way error messages show them: `(int, java.lang.String)`.
pub fn format_arg_types(args: &[Type]) -> String {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}
