//! Codec errors for compilation and (de)serialisation
//!
//! Errors fall into four families that callers can tell apart:
//!
//! - [`CompileError`]: a descriptor cannot be compiled. Collected in batch,
//!   so one failed compilation reports every problem at once
//! - [`SerialiseError`]: a value does not match the descriptor it is being
//!   written as
//! - [`DeserialiseError`]: wire data does not match the target type. Always
//!   fatal to the enclosing call
//! - [`InternalError`]: a broken invariant inside the codec graph. Never
//!   caused by input bytes

use packwright_types::{TypeDescriptor, TypeName};
use thiserror::Error;

use crate::path::{FieldPath, PathSegment};
use crate::wire::WireFormat;

/// A single compile failure and the chain of types that led to it
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{} → {error}", render_chain(.chain))]
pub struct Diagnostic {
    /// Descriptors from the requested root down to the failing type
    pub chain: Vec<TypeDescriptor>,
    pub error: CompileError,
}

fn render_chain(chain: &[TypeDescriptor]) -> String {
    chain.iter().map(ToString::to_string).collect::<Vec<_>>().join(" → ")
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}) {d}", i + 1))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Compile-time failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    /// No registered provider accepts the descriptor
    #[error("Unsupported type {descriptor}: no registered provider can encode it")]
    UnsupportedType { descriptor: TypeDescriptor },

    /// A record descriptor names a record missing from the catalog
    #[error("Unknown record {name}: declare it in the type catalog before compiling")]
    UnknownRecord { name: TypeName },

    /// A field default is not a complete value of the field's type
    #[error(
        "Record {record} field \"{field}\" has a default that is not a valid {expected} value"
    )]
    InvalidDefault {
        record: TypeName,
        field: String,
        expected: TypeDescriptor,
    },

    /// The type contains itself with no sequence, mapping, nullable or union
    /// in between, so no finite value of it exists
    #[error(
        "Unresolvable recursive type {descriptor}: {} contains itself without an indirection point",
        render_chain(.chain)
    )]
    UnresolvableRecursiveType {
        descriptor: TypeDescriptor,
        chain: Vec<TypeDescriptor>,
    },

    /// Nesting of distinct types exceeds the configured compile depth
    #[error("Compile depth limit {limit} exceeded at {descriptor}")]
    DepthLimitExceeded { descriptor: TypeDescriptor, limit: usize },

    /// Several nested types failed; every one is listed
    #[error(
        "Unable to compile {descriptor}: {} problems: {}",
        .diagnostics.len(),
        render_diagnostics(.diagnostics)
    )]
    Composition {
        descriptor: TypeDescriptor,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileError {
    pub fn unsupported(descriptor: &TypeDescriptor) -> Self {
        Self::UnsupportedType { descriptor: descriptor.clone() }
    }

    /// Diagnostics carried by this error; a lone error counts as one
    pub fn diagnostics(&self) -> Vec<&CompileError> {
        match self {
            CompileError::Composition { diagnostics, .. } => {
                diagnostics.iter().map(|d| &d.error).collect()
            }
            other => vec![other],
        }
    }
}

/// What went wrong while reading wire data
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeserialiseErrorKind {
    #[error("Unexpected MsgPack format: expected {expected}, got {actual}")]
    UnexpectedFormat { expected: &'static str, actual: WireFormat },

    #[error("Expecting tuple data to be encoded as array, got {actual}")]
    ExpectedArrayEncoding { actual: WireFormat },

    #[error("Received array must have length {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: u32 },

    #[error("Union values must be encoded as an array, got {actual}")]
    ExpectedUnionArray { actual: WireFormat },

    #[error("Union array should have 2 elements, not {actual}")]
    UnionArityMismatch { actual: u32 },

    #[error("Unable to read union type tag: expected String, got {actual}")]
    UnionTagNotString { actual: WireFormat },

    #[error("No union alternative matches received tag \"{received}\"")]
    UnmatchedUnionTag { received: String },

    #[error("Unable to parse \"{input}\": {reason}")]
    ParseFailure { input: String, reason: String },

    #[error("Complex types must be encoded as a map, got {actual}")]
    ExpectedMapEncoding { actual: WireFormat },

    #[error("Encountered unexpected field \"{field}\"")]
    UnexpectedField { field: String },

    #[error("Encountered duplicate field \"{field}\"")]
    DuplicateField { field: String },

    #[error("Missing required field \"{field}\"")]
    MissingField { field: String },

    #[error("Integer does not fit in {target}")]
    IntegerOutOfRange { target: &'static str },

    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Malformed MsgPack data: {reason}")]
    Malformed { reason: String },

    #[error("{remaining} bytes remain after the value")]
    TrailingBytes { remaining: usize },

    #[error("Nesting depth limit {limit} exceeded")]
    DepthLimitExceeded { limit: usize },
}

/// Wire data does not match the expected shape of the target type
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Cannot deserialise \"{name}\" as {target} at {path}: {kind}")]
pub struct DeserialiseError {
    /// Field or value name the failing routine was reading
    pub name: String,
    /// Type the failing routine was producing
    pub target: TypeDescriptor,
    pub path: FieldPath,
    pub kind: DeserialiseErrorKind,
}

impl DeserialiseError {
    pub fn new(
        name: impl Into<String>,
        target: TypeDescriptor,
        kind: DeserialiseErrorKind,
    ) -> Self {
        Self { name: name.into(), target, path: FieldPath::root(), kind }
    }

    /// Prepend the segment leading to the failing value
    pub fn at(mut self, segment: PathSegment) -> Self {
        self.path.push_outer(segment);
        self
    }
}

/// What went wrong while writing a value
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SerialiseErrorKind {
    #[error("expected a value of type {expected}, found {found}")]
    ValueMismatch { expected: TypeDescriptor, found: &'static str },

    #[error("tuple {expected} has {} items, value has {actual}", .expected.type_arguments().len())]
    TupleArity { expected: TypeDescriptor, actual: usize },

    #[error("record {record} value is missing field \"{field}\"")]
    MissingField { record: TypeName, field: String },

    #[error("record {record} does not declare field \"{field}\"")]
    UnexpectedField { record: TypeName, field: String },

    #[error("value of type {expected} has no canonical encoding: {reason}")]
    InvalidValue { expected: TypeDescriptor, reason: String },

    #[error("collection of {len} items exceeds the MsgPack length limit")]
    LengthOverflow { len: usize },

    #[error("write failed: {reason}")]
    Write { reason: String },
}

/// A value cannot be written as the descriptor it was given
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Cannot serialise value at {path}: {kind}")]
pub struct SerialiseError {
    pub path: FieldPath,
    pub kind: SerialiseErrorKind,
}

impl SerialiseError {
    pub fn new(kind: SerialiseErrorKind) -> Self {
        Self { path: FieldPath::root(), kind }
    }

    pub fn mismatch(expected: &TypeDescriptor, found: &packwright_types::Value) -> Self {
        Self::new(SerialiseErrorKind::ValueMismatch {
            expected: expected.clone(),
            found: found.kind(),
        })
    }

    pub fn at(mut self, segment: PathSegment) -> Self {
        self.path.push_outer(segment);
        self
    }
}

impl From<std::io::Error> for SerialiseError {
    fn from(err: std::io::Error) -> Self {
        Self::new(SerialiseErrorKind::Write { reason: err.to_string() })
    }
}

/// Broken invariants inside the compiled codec graph
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InternalError {
    /// The union value holds an alternative its descriptor does not declare
    #[error("No match on union type: {union} does not declare alternative {alternative}")]
    UnionAlternativeNotDeclared {
        union: TypeDescriptor,
        alternative: TypeDescriptor,
    },

    /// A deferred self-reference was invoked before its codec was published
    #[error("Deferred codec for {descriptor} was invoked before compilation finished")]
    UnresolvedDeferredCodec { descriptor: TypeDescriptor },

    /// A routine from a failed compilation was invoked
    #[error("Routine for {descriptor} belongs to a failed compilation")]
    PoisonedRoutine { descriptor: TypeDescriptor },
}

/// Any failure surfaced by the codec
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Serialise(#[from] SerialiseError),

    #[error(transparent)]
    Deserialise(#[from] DeserialiseError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl CodecError {
    /// Prepend a path segment to data errors; other families carry no path
    pub fn at(self, segment: PathSegment) -> Self {
        match self {
            CodecError::Serialise(err) => CodecError::Serialise(err.at(segment)),
            CodecError::Deserialise(err) => CodecError::Deserialise(err.at(segment)),
            other => other,
        }
    }

    /// Caused by the value or the wire data rather than by the codec itself
    pub fn is_data_error(&self) -> bool {
        matches!(self, CodecError::Serialise(_) | CodecError::Deserialise(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CodecError::Internal(_))
    }

    pub fn as_deserialise(&self) -> Option<&DeserialiseError> {
        match self {
            CodecError::Deserialise(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_serialise(&self) -> Option<&SerialiseError> {
        match self {
            CodecError::Serialise(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Serialise(err.into())
    }
}

/// Result type for compilation
pub type CompileResult<T> = std::result::Result<T, CompileError>;

/// Result type for (de)serialisation
pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialise_error_formatting() {
        let err = DeserialiseError::new(
            "Item2",
            TypeDescriptor::i32(),
            DeserialiseErrorKind::UnexpectedFormat {
                expected: "Integer",
                actual: WireFormat::String,
            },
        )
        .at(PathSegment::field("Item2"))
        .at(PathSegment::field("pair"));

        let display = err.to_string();
        assert!(display.contains("\"Item2\""));
        assert!(display.contains("as i32"));
        assert!(display.contains("$.pair.Item2"));
        assert!(display.contains("expected Integer, got String"));
    }

    #[test]
    fn test_composition_lists_every_problem() {
        let root = TypeDescriptor::record("Acme.Order");
        let err = CompileError::Composition {
            descriptor: root.clone(),
            diagnostics: vec![
                Diagnostic {
                    chain: vec![root.clone(), TypeDescriptor::Tuple(Vec::new())],
                    error: CompileError::unsupported(&TypeDescriptor::Tuple(Vec::new())),
                },
                Diagnostic {
                    chain: vec![root.clone(), TypeDescriptor::record("Acme.Missing")],
                    error: CompileError::UnknownRecord { name: TypeName::new("Acme.Missing") },
                },
            ],
        };

        let display = err.to_string();
        assert!(display.contains("2 problems"));
        assert!(display.contains("1) Acme.Order → ()"));
        assert!(display.contains("2) Acme.Order → Acme.Missing"));
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_error_families_are_distinguishable() {
        let data: CodecError = DeserialiseError::new(
            "value",
            TypeDescriptor::Bytes,
            DeserialiseErrorKind::InvalidUtf8,
        )
        .into();
        let internal: CodecError =
            InternalError::PoisonedRoutine { descriptor: TypeDescriptor::Bytes }.into();

        assert!(data.is_data_error());
        assert!(!data.is_internal());
        assert!(internal.is_internal());
        assert!(!internal.is_data_error());
    }

    #[test]
    fn test_path_only_applies_to_data_errors() {
        let internal: CodecError =
            InternalError::UnresolvedDeferredCodec { descriptor: TypeDescriptor::Version }.into();
        assert_eq!(internal.clone().at(PathSegment::Index(1)), internal);

        let mismatch =
            SerialiseError::mismatch(&TypeDescriptor::Version, &packwright_types::Value::Null);
        let serialise = CodecError::from(mismatch);
        let moved = serialise.at(PathSegment::Index(1));
        assert_eq!(moved.as_serialise().unwrap().path.to_string(), "$[1]");
    }
}
