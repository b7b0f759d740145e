//! Compiler configuration.

/// How `cast<Trait>(expr)` obtains an adapter for the operand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TraitCastMode {
    /// Always derive the adapter class name at runtime from the operand's
    /// class.
    #[default]
    Reflective,
    /// Construct the adapter directly when the operand's static type is a
    /// struct known to implement the trait; fall back to the runtime lookup
    /// otherwise.
    Static,
}

impl TraitCastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraitCastMode::Reflective => "reflective",
            TraitCastMode::Static => "static",
        }
    }
}

impl std::str::FromStr for TraitCastMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reflective" => Ok(TraitCastMode::Reflective),
            "static" => Ok(TraitCastMode::Static),
            other => Err(format!("unknown trait cast mode '{other}'")),
        }
    }
}

/// Options that affect generated code.
///
/// ```
/// use atypical_compiler::{CompilerOptions, TraitCastMode};
///
/// let options = CompilerOptions::default()
///     .with_trait_casts(TraitCastMode::Static)
///     .with_line_numbers(false);
/// assert_eq!(options.trait_casts, TraitCastMode::Static);
/// assert!(!options.line_numbers);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    pub trait_casts: TraitCastMode,
    /// Emit a line marker before each statement.
    pub line_numbers: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            trait_casts: TraitCastMode::Reflective,
            line_numbers: true,
        }
    }
}

impl CompilerOptions {
    pub fn with_trait_casts(mut self, mode: TraitCastMode) -> Self {
        self.trait_casts = mode;
        self
    }

    pub fn with_line_numbers(mut self, enabled: bool) -> Self {
        self.line_numbers = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CompilerOptions::default();
        assert_eq!(options.trait_casts, TraitCastMode::Reflective);
        assert!(options.line_numbers);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("static".parse::<TraitCastMode>(), Ok(TraitCastMode::Static));
        assert_eq!(
            "reflective".parse::<TraitCastMode>().map(|m| m.as_str()),
            Ok("reflective")
        );
        assert!("dynamic".parse::<TraitCastMode>().is_err());
    }
}
