//! Read-only mappings as MessagePack maps, entries in value order

use packwright_types::{TypeCatalog, TypeDescriptor, Value};

use super::TypeProvider;
use crate::codec::{deserialiser, serialiser, CodecRef, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{CompileError, CompileResult, DeserialiseErrorKind, SerialiseError};
use crate::path::PathSegment;

pub struct MapProvider;

impl MapProvider {
    fn entry_codecs(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<(CodecRef, CodecRef)> {
        match descriptor {
            TypeDescriptor::Map(key, value) => {
                Ok((composer.indirect_element(key), composer.indirect_element(value)))
            }
            other => Err(CompileError::unsupported(other)),
        }
    }
}

impl TypeProvider for MapProvider {
    fn name(&self) -> &'static str {
        "Map"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        matches!(descriptor, TypeDescriptor::Map(_, _))
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let (key_codec, value_codec) = self.entry_codecs(descriptor, composer)?;
        let descriptor = descriptor.clone();

        Ok(serialiser(move |value, packer| {
            let Value::Map(entries) = value else {
                return Err(SerialiseError::mismatch(&descriptor, value).into());
            };
            packer.write_map_header(entries.len())?;
            for (i, (key, value)) in entries.iter().enumerate() {
                key_codec.serialise(key, packer).map_err(|err| err.at(PathSegment::MapKey(i)))?;
                value_codec
                    .serialise(value, packer)
                    .map_err(|err| err.at(PathSegment::MapValue(i)))?;
            }
            Ok(())
        }))
    }

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn> {
        let (key_codec, value_codec) = self.entry_codecs(descriptor, composer)?;
        let descriptor = descriptor.clone();

        Ok(deserialiser(move |unpacker, scope| {
            let actual = unpacker.peek_format();
            let Some(count) = unpacker.try_read_map_header() else {
                let kind = DeserialiseErrorKind::UnexpectedFormat { expected: "Map", actual };
                return Err(scope.fail(&descriptor, kind));
            };

            let mut entries = Vec::with_capacity((count as usize).min(unpacker.remaining() / 2));
            let child = scope.child(scope.name());
            for i in 0..count as usize {
                let key = key_codec
                    .deserialise(unpacker, &child)
                    .map_err(|err| err.at(PathSegment::MapKey(i)))?;
                let value = value_codec
                    .deserialise(unpacker, &child)
                    .map_err(|err| err.at(PathSegment::MapValue(i)))?;
                entries.push((key, value));
            }
            Ok(Value::Map(entries))
        }))
    }
}
