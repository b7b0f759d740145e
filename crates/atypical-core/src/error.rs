//! Unified error types for the Atypical compiler.
//!
//! Every phase has its own error enum so callers can match precisely; the
//! driver wraps them in [`AtypicalError`] together with the file (or class)
//! they came from.
//!
//! ## Error Hierarchy
//!
//! ```text
//! AtypicalError (top-level wrapper, carries file context)
//! ├── LexError          - tokenization errors
//! ├── ParseErrors       - all parse errors of one file (ParseError + ParseErrorKind)
//! ├── RegistrationError - structural pass (duplicate types, invalid impls)
//! ├── CompilationError  - method body compilation (resolution, typing)
//! ├── EmitError         - class file serialization
//! └── DescriptorError   - malformed type / method descriptors
//! ```
//!
//! All errors are fatal: the first one aborts the run.

use std::path::PathBuf;

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during lexical analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A string literal was not properly terminated.
    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    /// A block comment was not properly terminated.
    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    /// Unknown `\x` escape inside a string literal.
    #[error("invalid escape sequence '\\{ch}' at {span}")]
    InvalidEscape { ch: char, span: Span },

    /// A numeric literal could not be parsed.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidEscape { span, .. } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type was expected.
    ExpectedType,
    /// A statement was expected.
    ExpectedStatement,
    /// A block was expected.
    ExpectedBlock,
    /// A top-level item was expected.
    ExpectedDeclaration,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// Missing semicolon.
    MissingSemicolon,
    /// A literal value could not be parsed.
    InvalidLiteral,
    /// Error reported by the lexer.
    Lexical,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedBlock => "expected block",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::MissingSemicolon => "missing semicolon",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::Lexical => "lexical error",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected token: {token}"),
        )
    }

    /// Create an "unexpected EOF" error.
    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(ParseErrorKind::UnexpectedEof, span, "unexpected end of file")
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// Create an "expected type" error.
    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }

    /// Format the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = String::new();
        let line = self.span.line;
        let column = self.span.col.max(1);

        output.push_str(&format!("Error at {}:{}: {}\n", line, column, self.kind));
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }

        if let Some(line_text) = line
            .checked_sub(1)
            .and_then(|idx| source.lines().nth(idx as usize))
        {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", line, line_text));
            let indent = " ".repeat(column as usize - 1);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {}{}\n", indent, pointer));
        }

        output
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lexical, err.span(), err.to_string())
    }
}

/// All parse errors of one source file.
///
/// The parser recovers at statement and item boundaries so that a single run
/// reports every syntax error it can find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Descriptor Errors
// ============================================================================

/// Malformed type or method descriptors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    #[error("invalid descriptor '{descriptor}': {reason}")]
    Invalid { descriptor: String, reason: String },

    /// `to_static_reference` applied to a static reference.
    #[error("'{descriptor}' is already a static type reference")]
    AlreadyStatic { descriptor: String },
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while building the structural index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// Two declarations share a qualified name.
    #[error("at {span}: duplicate type '{name}'")]
    DuplicateType { name: String, span: Span },

    /// Same name and descriptor declared twice on one type.
    #[error("at {span}: duplicate method '{owner}.{name}{descriptor}'")]
    DuplicateMethod {
        owner: String,
        name: String,
        descriptor: String,
        span: Span,
    },

    /// Same field name declared twice on one type.
    #[error("at {span}: duplicate field '{owner}.{name}'")]
    DuplicateField {
        owner: String,
        name: String,
        span: Span,
    },

    /// The type named in `impl X for S` is not a trait.
    #[error("at {span}: '{name}' is not a trait")]
    NotATrait { name: String, span: Span },

    /// The target of an impl is not a declared struct or module.
    #[error("at {span}: impl target '{name}' is not a declared struct or module")]
    UnknownImplTarget { name: String, span: Span },

    /// An impl does not provide one of the trait's methods.
    #[error(
        "at {span}: impl of '{trait_name}' for '{struct_name}' is missing method '{method}{descriptor}'"
    )]
    MissingTraitMethod {
        trait_name: String,
        struct_name: String,
        method: String,
        descriptor: String,
        span: Span,
    },
}

impl RegistrationError {
    pub fn span(&self) -> Span {
        match self {
            RegistrationError::DuplicateType { span, .. }
            | RegistrationError::DuplicateMethod { span, .. }
            | RegistrationError::DuplicateField { span, .. }
            | RegistrationError::NotATrait { span, .. }
            | RegistrationError::UnknownImplTarget { span, .. }
            | RegistrationError::MissingTraitMethod { span, .. } => *span,
        }
    }
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Errors that occur while compiling method bodies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// A bare name that is not a local, field or type.
    #[error("at {span}: unresolved name '{name}'")]
    UnresolvedName {
        /// The name as written.
        name: String,
        /// Where the name was referenced.
        span: Span,
    },

    /// A referenced type could not be found.
    #[error("at {span}: unknown type '{name}'")]
    UnknownType {
        /// The (qualified) type name that wasn't found.
        name: String,
        /// Where the type was referenced.
        span: Span,
    },

    /// A referenced field could not be found.
    #[error("at {span}: unknown field '{field}' on type '{type_name}'")]
    UnknownField {
        field: String,
        type_name: String,
        span: Span,
    },

    /// No method on the receiver (or its traits) accepts the arguments.
    #[error("at {span}: no applicable method {owner}.{name}{args}")]
    NoApplicableMethod {
        /// Receiver type.
        owner: String,
        /// Method name.
        name: String,
        /// Argument types, e.g. `(int, java.lang.String)`.
        args: String,
        span: Span,
    },

    /// No constructor accepts the arguments of a `new` expression.
    #[error("at {span}: no applicable constructor {type_name}{args}")]
    NoApplicableConstructor {
        type_name: String,
        args: String,
        span: Span,
    },

    /// A type mismatch was detected.
    #[error("at {span}: {message}")]
    TypeMismatch {
        /// Description of the mismatch.
        message: String,
        /// Where the mismatch occurred.
        span: Span,
    },

    /// Expression is not an lvalue (cannot be assigned to).
    #[error("at {span}: expression is not an lvalue")]
    NotAnLvalue { span: Span },

    /// `this` used inside a static method.
    #[error("at {span}: 'this' is not available in a static context")]
    ThisInStaticContext { span: Span },

    /// A non-void method can fall off the end of its body.
    #[error("at {span}: method '{method}' does not return a value on every path")]
    MissingReturn { method: String, span: Span },

    /// A cast between unrelated types.
    #[error("at {span}: cannot cast '{from}' to '{to}'")]
    InvalidCast { from: String, to: String, span: Span },

    /// A variable was redeclared in the same method.
    #[error("at {new_span}: variable '{name}' redeclared (originally declared at {original_span})")]
    VariableRedeclaration {
        name: String,
        original_span: Span,
        new_span: Span,
    },

    /// An operation that is valid syntax but has no meaning here.
    #[error("at {span}: {message}")]
    InvalidOperation { message: String, span: Span },

    /// Locals of one method need more than 65535 slots.
    #[error("at {span}: too many local variable slots")]
    TooManyLocals { span: Span },

    /// Internal compiler error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    /// Get the span where this error occurred.
    ///
    /// Internal errors have no location and report a default span.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::UnresolvedName { span, .. }
            | CompilationError::UnknownType { span, .. }
            | CompilationError::UnknownField { span, .. }
            | CompilationError::NoApplicableMethod { span, .. }
            | CompilationError::NoApplicableConstructor { span, .. }
            | CompilationError::TypeMismatch { span, .. }
            | CompilationError::NotAnLvalue { span }
            | CompilationError::ThisInStaticContext { span }
            | CompilationError::MissingReturn { span, .. }
            | CompilationError::InvalidCast { span, .. }
            | CompilationError::InvalidOperation { span, .. }
            | CompilationError::TooManyLocals { span } => *span,
            CompilationError::VariableRedeclaration { new_span, .. } => *new_span,
            CompilationError::Internal { .. } => Span::default(),
        }
    }

    /// Shorthand for a [`CompilationError::TypeMismatch`].
    pub fn mismatch(span: Span, message: impl Into<String>) -> Self {
        CompilationError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    pub fn invalid_operation(span: Span, message: impl Into<String>) -> Self {
        CompilationError::InvalidOperation {
            message: message.into(),
            span,
        }
    }

    /// Shorthand for a [`CompilationError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        CompilationError::Internal {
            message: message.into(),
        }
    }
}

impl From<DescriptorError> for CompilationError {
    fn from(err: DescriptorError) -> Self {
        CompilationError::internal(err.to_string())
    }
}

// ============================================================================
// Emit Errors
// ============================================================================

/// Errors raised while serializing a class.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmitError {
    /// A jump whose target does not fit in a signed 16-bit offset.
    #[error("{method}: branch offset {offset} out of range")]
    BranchOutOfRange { method: String, offset: i64 },

    /// Method code exceeds the 64 KiB limit.
    #[error("{method}: code too large ({size} bytes)")]
    CodeTooLarge { method: String, size: usize },

    /// The instruction stream pops more than it pushed.
    #[error("{method}: operand stack underflow at instruction {index}")]
    StackUnderflow { method: String, index: usize },

    /// Two paths reach one instruction with different stack depths.
    #[error("{method}: inconsistent stack depth at instruction {index} ({first} vs {second})")]
    StackMismatch {
        method: String,
        index: usize,
        first: u16,
        second: u16,
    },

    /// A jump to a label that was never placed.
    #[error("{method}: jump to unbound label L{label}")]
    UnboundLabel { method: String, label: u32 },

    /// The constant pool outgrew its 16-bit index space.
    #[error("constant pool overflow")]
    ConstantPoolOverflow,

    /// A string constant or name longer than 65535 bytes once encoded.
    #[error("constant too long ({length} bytes, limit 65535)")]
    ConstantTooLong { length: usize },

    /// A class file table with more entries than a `u16` count can hold.
    #[error("too many {what} ({count}, limit 65535)")]
    TooMany { what: &'static str, count: usize },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Top-level error type, wrapping each phase error with the file it came from.
///
/// ```ignore
/// use atypical::Unit;
///
/// let mut unit = Unit::new();
/// unit.add_source("main.atp", "fn main() { return 1; }");
/// let err = unit.compile().unwrap_err();
/// assert!(err.is_compilation());
/// ```
#[derive(Debug, Error)]
pub enum AtypicalError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{file}:\n{errors}")]
    Parse { file: String, errors: ParseErrors },

    #[error("{file}: {source}")]
    Registration {
        file: String,
        #[source]
        source: RegistrationError,
    },

    #[error("{file}: {source}")]
    Compilation {
        file: String,
        #[source]
        source: CompilationError,
    },

    #[error("class {class}: {source}")]
    Emit {
        class: String,
        #[source]
        source: EmitError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

impl AtypicalError {
    pub fn is_lex(&self) -> bool {
        matches!(self, AtypicalError::Lex(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, AtypicalError::Parse { .. })
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, AtypicalError::Registration { .. })
    }

    pub fn is_compilation(&self) -> bool {
        matches!(self, AtypicalError::Compilation { .. })
    }

    pub fn is_emit(&self) -> bool {
        matches!(self, AtypicalError::Emit { .. })
    }

    /// Source file the error belongs to, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            AtypicalError::Parse { file, .. }
            | AtypicalError::Registration { file, .. }
            | AtypicalError::Compilation { file, .. } => Some(file),
            _ => None,
        }
    }

    /// The wrapped compilation error, if this is one.
    pub fn as_compilation(&self) -> Option<&CompilationError> {
        match self {
            AtypicalError::Compilation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The wrapped registration error, if this is one.
    pub fn as_registration(&self) -> Option<&RegistrationError> {
        match self {
            AtypicalError::Registration { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::UnexpectedChar {
            ch: '@',
            span: Span::new(1, 5, 1),
        };
        assert_eq!(err.to_string(), "unexpected character '@' at 1:5");
        assert_eq!(err.span(), Span::new(1, 5, 1));
    }

    #[test]
    fn lex_error_converts_to_parse_error() {
        let err: ParseError = LexError::UnterminatedString {
            span: Span::new(2, 3, 4),
        }
        .into();
        assert_eq!(err.kind, ParseErrorKind::Lexical);
        assert_eq!(err.span, Span::new(2, 3, 4));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::expected_token(Span::new(10, 5, 1), "';'", "'}'");
        assert_eq!(err.to_string(), "expected token at 10:5: expected ';', found '}'");
    }

    #[test]
    fn parse_error_with_source() {
        let source = "fn main() {\n    let x = ;\n}";
        let err = ParseError::expected_expression(Span::new(2, 13, 1), "';'");
        let rendered = err.display_with_source(source);
        assert!(rendered.contains("  2 |     let x = ;"));
        assert!(rendered.contains("            ^"));
    }

    #[test]
    fn parse_errors_collection() {
        let mut errors = ParseErrors::new();
        assert!(errors.is_empty());
        errors.push(ParseError::unexpected_eof(Span::new(1, 1, 0)));
        errors.push(ParseError::expected_type(Span::new(2, 1, 1), "'+'"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().map(|e| e.kind), Some(ParseErrorKind::UnexpectedEof));
        assert_eq!(errors.to_string().lines().count(), 2);
    }

    #[test]
    fn registration_error_display() {
        let err = RegistrationError::DuplicateType {
            name: "geo/Point".to_string(),
            span: Span::new(3, 1, 6),
        };
        assert_eq!(err.to_string(), "at 3:1: duplicate type 'geo/Point'");
        assert_eq!(err.span(), Span::new(3, 1, 6));
    }

    #[test]
    fn compilation_error_display() {
        let err = CompilationError::NoApplicableMethod {
            owner: "Dog".to_string(),
            name: "bark".to_string(),
            args: "(int)".to_string(),
            span: Span::new(4, 9, 4),
        };
        assert_eq!(err.to_string(), "at 4:9: no applicable method Dog.bark(int)");
    }

    #[test]
    fn compilation_error_span() {
        let err = CompilationError::VariableRedeclaration {
            name: "x".to_string(),
            original_span: Span::new(1, 1, 1),
            new_span: Span::new(2, 1, 1),
        };
        assert_eq!(err.span(), Span::new(2, 1, 1));
        assert_eq!(CompilationError::internal("boom").span(), Span::default());
    }

    #[test]
    fn top_level_error_carries_file() {
        let err = AtypicalError::Compilation {
            file: "main.atp".to_string(),
            source: CompilationError::NotAnLvalue {
                span: Span::new(1, 2, 3),
            },
        };
        assert!(err.is_compilation());
        assert!(!err.is_parse());
        assert_eq!(err.file(), Some("main.atp"));
        assert_eq!(err.to_string(), "main.atp: at 1:2: expression is not an lvalue");
    }

    #[test]
    fn top_level_error_from_lex_is_transparent() {
        let lex = LexError::UnterminatedComment {
            span: Span::new(1, 1, 2),
        };
        let err: AtypicalError = lex.clone().into();
        assert!(err.is_lex());
        assert_eq!(err.to_string(), lex.to_string());
    }

    #[test]
    fn parse_error_kind_as_str() {
        assert_eq!(ParseErrorKind::ExpectedToken.as_str(), "expected token");
        assert_eq!(ParseErrorKind::MissingSemicolon.to_string(), "missing semicolon");
    }
}
