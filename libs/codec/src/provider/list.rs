//! Read-only sequences as MessagePack arrays

use packwright_types::{TypeCatalog, TypeDescriptor, Value};

use super::TypeProvider;
use crate::codec::{deserialiser, serialiser, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{CompileError, CompileResult, DeserialiseErrorKind, SerialiseError};
use crate::path::PathSegment;

pub struct ListProvider;

fn element_type(descriptor: &TypeDescriptor) -> CompileResult<&TypeDescriptor> {
    match descriptor {
        TypeDescriptor::List(element) => Ok(element),
        other => Err(CompileError::unsupported(other)),
    }
}

impl TypeProvider for ListProvider {
    fn name(&self) -> &'static str {
        "List"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        matches!(descriptor, TypeDescriptor::List(_))
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let element = composer.indirect_element(element_type(descriptor)?);
        let descriptor = descriptor.clone();

        Ok(serialiser(move |value, packer| {
            let Value::List(items) = value else {
                return Err(SerialiseError::mismatch(&descriptor, value).into());
            };
            packer.write_array_header(items.len())?;
            for (i, item) in items.iter().enumerate() {
                element.serialise(item, packer).map_err(|err| err.at(PathSegment::Index(i)))?;
            }
            Ok(())
        }))
    }

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn> {
        let element = composer.indirect_element(element_type(descriptor)?);
        let descriptor = descriptor.clone();

        Ok(deserialiser(move |unpacker, scope| {
            let actual = unpacker.peek_format();
            let Some(count) = unpacker.try_read_array_header() else {
                let kind = DeserialiseErrorKind::UnexpectedFormat { expected: "Array", actual };
                return Err(scope.fail(&descriptor, kind));
            };

            // every element takes at least one byte
            let mut items = Vec::with_capacity((count as usize).min(unpacker.remaining()));
            let child = scope.child(scope.name());
            for i in 0..count as usize {
                let item = element
                    .deserialise(unpacker, &child)
                    .map_err(|err| err.at(PathSegment::Index(i)))?;
                items.push(item);
            }
            Ok(Value::List(items))
        }))
    }
}
