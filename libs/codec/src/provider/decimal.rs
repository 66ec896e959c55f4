//! Arbitrary-precision decimals as canonical strings
//!
//! The string form keeps every significant digit and the scale, so `1.50`
//! survives a round trip as `1.50` rather than being normalised to `1.5`.

use std::str::FromStr;

use packwright_types::{TypeCatalog, TypeDescriptor, Value};
use rust_decimal::Decimal;

use super::TypeProvider;
use crate::codec::{deserialiser, serialiser, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{CompileResult, DeserialiseErrorKind, SerialiseError};

pub struct DecimalProvider;

impl TypeProvider for DecimalProvider {
    fn name(&self) -> &'static str {
        "Decimal"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        matches!(descriptor, TypeDescriptor::Decimal)
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        _composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let descriptor = descriptor.clone();
        Ok(serialiser(move |value, packer| match value {
            Value::Decimal(decimal) => Ok(packer.write_string(&decimal.to_string())?),
            other => Err(SerialiseError::mismatch(&descriptor, other).into()),
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

            Decimal::from_str(text).map(Value::Decimal).map_err(|err| {
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
