//! Opaque values carried as their canonical string form
//!
//! Any type with a lossless `to_string`/`parse` pair can be encoded this way
//! by implementing [`CanonicalString`]; [`Version`] is the built-in example.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use packwright_types::{TypeCatalog, TypeDescriptor, Value, Version};

use super::TypeProvider;
use crate::codec::{deserialiser, serialiser, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{CompileResult, DeserialiseErrorKind, SerialiseError, SerialiseErrorKind};

/// A value type with a canonical string representation
pub trait CanonicalString: Sized + Send + Sync + 'static {
    type ParseError: fmt::Display;

    /// Provider name, also used in logs
    const NAME: &'static str;

    /// Descriptor this type is encoded for
    fn descriptor() -> TypeDescriptor;

    fn from_value(value: &Value) -> Option<&Self>;

    fn into_value(self) -> Value;

    fn to_canonical_string(&self) -> String;

    /// Reject values whose string form peers could not parse back
    fn validate(&self) -> Result<(), Self::ParseError> {
        Ok(())
    }

    fn parse_canonical(text: &str) -> Result<Self, Self::ParseError>;
}

impl CanonicalString for Version {
    type ParseError = packwright_types::VersionParseError;

    const NAME: &'static str = "Version";

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Version
    }

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Version(version) => Some(version),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Version(self)
    }

    fn to_canonical_string(&self) -> String {
        self.to_string()
    }

    fn validate(&self) -> Result<(), Self::ParseError> {
        self.check_range()
    }

    fn parse_canonical(text: &str) -> Result<Self, Self::ParseError> {
        Version::from_str(text)
    }
}

/// String-encoded provider for one [`CanonicalString`] type
pub struct OpaqueStringProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: CanonicalString> OpaqueStringProvider<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T: CanonicalString> Default for OpaqueStringProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CanonicalString> TypeProvider for OpaqueStringProvider<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        *descriptor == T::descriptor()
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        _composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let descriptor = descriptor.clone();
        Ok(serialiser(move |value, packer| {
            let Some(inner) = T::from_value(value) else {
                return Err(SerialiseError::mismatch(&descriptor, value).into());
            };
            inner.validate().map_err(|err| {
                SerialiseError::new(SerialiseErrorKind::InvalidValue {
                    expected: descriptor.clone(),
                    reason: err.to_string(),
                })
            })?;
            Ok(packer.write_string(&inner.to_canonical_string())?)
        }))
    }

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        _composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn> {
        let descriptor = descriptor.clone();
        Ok(deserialiser(move |unpacker, scope| {
            let actual = unpacker.peek_format();
            let Some(text) = unpacker.try_read_string() else {
                let kind = DeserialiseErrorKind::UnexpectedFormat { expected: "String", actual };
                return Err(scope.fail(&descriptor, kind));
            };

            T::parse_canonical(text).map(T::into_value).map_err(|err| {
                scope.fail(
                    &descriptor,
                    DeserialiseErrorKind::ParseFailure {
                        input: text.to_owned(),
                        reason: err.to_string(),
                    },
                )
            })
        }))
    }
}
