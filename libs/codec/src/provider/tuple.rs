//! Positional tuples as fixed-length arrays
//!
//! Items are named `Item1` … `ItemN` in error paths. Tuples are never
//! implicitly nullable, so `Nullable(Tuple)` has no provider.

use packwright_types::{TypeCatalog, TypeDescriptor, Value};

use super::TypeProvider;
use crate::codec::{deserialiser, serialiser, CodecRef, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{
    CompileError, CompileResult, DeserialiseErrorKind, SerialiseError, SerialiseErrorKind,
};
use crate::path::PathSegment;

/// Largest tuple arity supported
pub const MAX_TUPLE_ARITY: usize = 7;

pub struct TupleProvider;

fn item_names(arity: usize) -> Vec<String> {
    (1..=arity).map(|i| format!("Item{i}")).collect()
}

fn items(descriptor: &TypeDescriptor) -> CompileResult<&[TypeDescriptor]> {
    match descriptor {
        TypeDescriptor::Tuple(items) => Ok(items),
        other => Err(CompileError::unsupported(other)),
    }
}

impl TupleProvider {
    fn elements(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<Vec<CodecRef>> {
        Ok(items(descriptor)?.iter().map(|item| composer.element(item)).collect())
    }
}

impl TypeProvider for TupleProvider {
    fn name(&self) -> &'static str {
        "Tuple"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        matches!(
            descriptor,
            TypeDescriptor::Tuple(items) if (1..=MAX_TUPLE_ARITY).contains(&items.len())
        )
    }

    fn uses_default_null_handling(&self, _descriptor: &TypeDescriptor) -> bool {
        false
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let elements = self.elements(descriptor, composer)?;
        let names = item_names(elements.len());
        let descriptor = descriptor.clone();

        Ok(serialiser(move |value, packer| {
            let Value::Tuple(values) = value else {
                return Err(SerialiseError::mismatch(&descriptor, value).into());
            };
            if values.len() != elements.len() {
                let kind = SerialiseErrorKind::TupleArity {
                    expected: descriptor.clone(),
                    actual: values.len(),
                };
                return Err(SerialiseError::new(kind).into());
            }

            packer.write_array_header(elements.len())?;
            for ((element, item), name) in elements.iter().zip(values).zip(&names) {
                element
                    .serialise(item, packer)
                    .map_err(|err| err.at(PathSegment::field(name.as_str())))?;
            }
            Ok(())
        }))
    }

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn> {
        let elements = self.elements(descriptor, composer)?;
        let names = item_names(elements.len());
        let descriptor = descriptor.clone();

        Ok(deserialiser(move |unpacker, scope| {
            let actual = unpacker.peek_format();
            let Some(count) = unpacker.try_read_array_header() else {
                let kind = DeserialiseErrorKind::ExpectedArrayEncoding { actual };
                return Err(scope.fail(&descriptor, kind));
            };
            if count as usize != elements.len() {
                return Err(scope.fail(
                    &descriptor,
                    DeserialiseErrorKind::ArityMismatch { expected: elements.len(), actual: count },
                ));
            }

            let mut values = Vec::with_capacity(elements.len());
            for (element, name) in elements.iter().zip(&names) {
                let value = element
                    .deserialise(unpacker, &scope.child(name))
                    .map_err(|err| err.at(PathSegment::field(name.as_str())))?;
                values.push(value);
            }
            Ok(Value::Tuple(values))
        }))
    }
}
