//! Byte segments as MessagePack binary blobs

use bytes::Bytes;
use packwright_types::{TypeCatalog, TypeDescriptor, Value};

use super::TypeProvider;
use crate::codec::{deserialiser, serialiser, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{CompileResult, DeserialiseErrorKind, SerialiseError};

pub struct BufferProvider;

impl TypeProvider for BufferProvider {
    fn name(&self) -> &'static str {
        "Buffer"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        matches!(descriptor, TypeDescriptor::Bytes)
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        _composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let descriptor = descriptor.clone();
        Ok(serialiser(move |value, packer| match value {
            Value::Bytes(segment) => Ok(packer.write_binary(segment)?),
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
            match unpacker.try_read_binary() {
                Some(segment) => Ok(Value::Bytes(Bytes::copy_from_slice(segment))),
                None => Err(scope.fail(
                    &descriptor,
                    DeserialiseErrorKind::UnexpectedFormat { expected: "byte segment", actual },
                )),
            }
        }))
    }
}
