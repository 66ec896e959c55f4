//! MessagePack scalars
//!
//! Integers are written in their most compact encoding and accepted from any
//! integer encoding whose value fits the target width.

use packwright_types::{PrimitiveType, TypeCatalog, TypeDescriptor, Value};

use super::TypeProvider;
use crate::codec::{deserialiser, serialiser, DeserialiseFn, ReadScope, SerialiseFn};
use crate::compose::Composer;
use crate::error::{CodecResult, CompileResult, DeserialiseErrorKind, SerialiseError};
use crate::wire::{Unpacker, WireFormat};

pub struct PrimitiveProvider;

fn expect_primitive(descriptor: &TypeDescriptor) -> CompileResult<PrimitiveType> {
    match descriptor {
        TypeDescriptor::Primitive(primitive) => Ok(*primitive),
        other => Err(crate::error::CompileError::unsupported(other)),
    }
}

impl TypeProvider for PrimitiveProvider {
    fn name(&self) -> &'static str {
        "Primitive"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        matches!(descriptor, TypeDescriptor::Primitive(_))
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        _composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let primitive = expect_primitive(descriptor)?;
        let descriptor = descriptor.clone();

        Ok(serialiser(move |value, packer| {
            match (primitive, value) {
                (PrimitiveType::Bool, Value::Bool(v)) => packer.write_bool(*v)?,
                (PrimitiveType::U8, Value::U8(v)) => packer.write_uint(u64::from(*v))?,
                (PrimitiveType::U16, Value::U16(v)) => packer.write_uint(u64::from(*v))?,
                (PrimitiveType::U32, Value::U32(v)) => packer.write_uint(u64::from(*v))?,
                (PrimitiveType::U64, Value::U64(v)) => packer.write_uint(*v)?,
                (PrimitiveType::I8, Value::I8(v)) => packer.write_int(i64::from(*v))?,
                (PrimitiveType::I16, Value::I16(v)) => packer.write_int(i64::from(*v))?,
                (PrimitiveType::I32, Value::I32(v)) => packer.write_int(i64::from(*v))?,
                (PrimitiveType::I64, Value::I64(v)) => packer.write_int(*v)?,
                (PrimitiveType::F32, Value::F32(v)) => packer.write_f32(*v)?,
                (PrimitiveType::F64, Value::F64(v)) => packer.write_f64(*v)?,
                (PrimitiveType::String, Value::String(v)) => packer.write_string(v)?,
                (_, other) => return Err(SerialiseError::mismatch(&descriptor, other).into()),
            }
            Ok(())
        }))
    }

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        _composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn> {
        let primitive = expect_primitive(descriptor)?;
        let descriptor = descriptor.clone();

        Ok(deserialiser(move |unpacker, scope| {
            read_primitive(primitive, &descriptor, unpacker, scope)
        }))
    }
}

fn read_primitive(
    primitive: PrimitiveType,
    descriptor: &TypeDescriptor,
    unpacker: &mut Unpacker<'_>,
    scope: &ReadScope<'_>,
) -> CodecResult<Value> {
    let format = unpacker.peek_format();
    let wrong_format = |expected: &'static str| {
        scope.fail(descriptor, DeserialiseErrorKind::UnexpectedFormat { expected, actual: format })
    };
    let out_of_range = || {
        let kind = DeserialiseErrorKind::IntegerOutOfRange { target: primitive.name() };
        scope.fail(descriptor, kind)
    };

    macro_rules! signed {
        ($variant:ident, $ty:ty) => {{
            let raw = match unpacker.try_read_i64() {
                Some(raw) => raw,
                None if format == WireFormat::Integer => return Err(out_of_range()),
                None => return Err(wrong_format("Integer")),
            };
            <$ty>::try_from(raw).map(Value::$variant).map_err(|_| out_of_range())
        }};
    }

    macro_rules! unsigned {
        ($variant:ident, $ty:ty) => {{
            let raw = match unpacker.try_read_u64() {
                Some(raw) => raw,
                None if format == WireFormat::Integer => return Err(out_of_range()),
                None => return Err(wrong_format("Integer")),
            };
            <$ty>::try_from(raw).map(Value::$variant).map_err(|_| out_of_range())
        }};
    }

    match primitive {
        PrimitiveType::Bool => {
            unpacker.try_read_bool().map(Value::Bool).ok_or_else(|| wrong_format("Boolean"))
        }
        PrimitiveType::I8 => signed!(I8, i8),
        PrimitiveType::I16 => signed!(I16, i16),
        PrimitiveType::I32 => signed!(I32, i32),
        PrimitiveType::I64 => signed!(I64, i64),
        PrimitiveType::U8 => unsigned!(U8, u8),
        PrimitiveType::U16 => unsigned!(U16, u16),
        PrimitiveType::U32 => unsigned!(U32, u32),
        PrimitiveType::U64 => unsigned!(U64, u64),
        PrimitiveType::F32 => {
            unpacker.try_read_f32().map(Value::F32).ok_or_else(|| wrong_format("Float"))
        }
        PrimitiveType::F64 => unpacker
            .try_read_f64()
            .or_else(|| unpacker.try_read_f32().map(f64::from))
            .map(Value::F64)
            .ok_or_else(|| wrong_format("Float")),
        PrimitiveType::String => match unpacker.try_read_string() {
            Some(s) => Ok(Value::String(s.to_owned())),
            None if format == WireFormat::String => {
                Err(scope.fail(descriptor, DeserialiseErrorKind::InvalidUtf8))
            }
            None => Err(wrong_format("String")),
        },
    }
}
