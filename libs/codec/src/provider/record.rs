//! # Record Provider
//!
//! Records declared in the [`TypeCatalog`] travel as a MessagePack map of
//! field name to value, written in declaration order:
//!
//! ```text
//! Acme.Point { x: i32, y: i32 }   →   { "x": 1, "y": 2 }
//! ```
//!
//! Readers match fields by name, so field order on the wire is free. Schema
//! evolution rules:
//!
//! - a field missing from the payload takes its declared default; nullable
//!   fields default to null; any other missing field is an error
//! - defaults apply to reads only: a record value being written must carry
//!   every declared field, so what is read back equals what was written
//! - a declared default must be a complete value of the field's type,
//!   records nested inside it included, or the record fails to compile
//! - a field present on the wire but not declared is governed by the
//!   read's [`UnexpectedFieldBehaviour`]
//! - a field named twice is always an error

use std::collections::HashMap;

use packwright_types::{RecordValue, TypeCatalog, TypeDescriptor, TypeName, Value};
use tracing::warn;

use super::TypeProvider;
use crate::behaviour::UnexpectedFieldBehaviour;
use crate::codec::{deserialiser, serialiser, CodecRef, DeserialiseFn, SerialiseFn};
use crate::compose::Composer;
use crate::error::{
    CompileError, CompileResult, DeserialiseErrorKind, SerialiseError, SerialiseErrorKind,
};
use crate::path::PathSegment;

pub struct RecordProvider;

struct FieldCodec {
    name: String,
    codec: CodecRef,
    default: Option<Value>,
}

/// Record name plus the compiled codec of every declared field
struct RecordLayout {
    name: TypeName,
    fields: Vec<FieldCodec>,
}

impl RecordLayout {
    fn emit(descriptor: &TypeDescriptor, composer: &mut Composer<'_>) -> CompileResult<Self> {
        let TypeDescriptor::Record(name) = descriptor else {
            return Err(CompileError::unsupported(descriptor));
        };
        let record = composer
            .catalog()
            .record(name)
            .ok_or_else(|| CompileError::UnknownRecord { name: name.clone() })?;

        let catalog = composer.catalog();
        let mut fields = Vec::with_capacity(record.fields().len());
        for field in record.fields() {
            let default = match field.default() {
                Some(default) if !field.ty().admits_in(catalog, default) => {
                    composer.report(CompileError::InvalidDefault {
                        record: name.clone(),
                        field: field.name().to_owned(),
                        expected: field.ty().clone(),
                    });
                    None
                }
                Some(default) => Some(default.clone()),
                None if field.ty().is_nullable() => Some(Value::Null),
                None => None,
            };
            fields.push(FieldCodec {
                name: field.name().to_owned(),
                codec: composer.element(field.ty()),
                default,
            });
        }

        Ok(Self { name: name.clone(), fields })
    }
}

impl TypeProvider for RecordProvider {
    fn name(&self) -> &'static str {
        "Record"
    }

    /// Any record name; names missing from the catalog fail at emission with
    /// a precise error
    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        matches!(descriptor, TypeDescriptor::Record(_))
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let layout = RecordLayout::emit(descriptor, composer)?;
        let descriptor = descriptor.clone();

        Ok(serialiser(move |value, packer| {
            let Value::Record(record) = value else {
                return Err(SerialiseError::mismatch(&descriptor, value).into());
            };

            let declared = |name: &str| layout.fields.iter().any(|f| f.name == name);
            if let Some(undeclared) = record.names().find(|n| !declared(*n)) {
                let kind = SerialiseErrorKind::UnexpectedField {
                    record: layout.name.clone(),
                    field: undeclared.to_owned(),
                };
                return Err(SerialiseError::new(kind).into());
            }

            packer.write_map_header(layout.fields.len())?;
            for field in &layout.fields {
                let Some(field_value) = record.get(&field.name) else {
                    let kind = SerialiseErrorKind::MissingField {
                        record: layout.name.clone(),
                        field: field.name.clone(),
                    };
                    return Err(SerialiseError::new(kind).into());
                };
                packer.write_string(&field.name)?;
                field
                    .codec
                    .serialise(field_value, packer)
                    .map_err(|err| err.at(PathSegment::field(field.name.as_str())))?;
            }
            Ok(())
        }))
    }

    fn emit_deserialiser(
        &self,
        descriptor: &TypeDescriptor,
        composer: &mut Composer<'_>,
    ) -> CompileResult<DeserialiseFn> {
        let layout = RecordLayout::emit(descriptor, composer)?;
        let index: HashMap<String, usize> =
            layout.fields.iter().enumerate().map(|(i, field)| (field.name.clone(), i)).collect();
        let descriptor = descriptor.clone();

        Ok(deserialiser(move |unpacker, scope| {
            let actual = unpacker.peek_format();
            let Some(count) = unpacker.try_read_map_header() else {
                let kind = DeserialiseErrorKind::ExpectedMapEncoding { actual };
                return Err(scope.fail(&descriptor, kind));
            };

            let mut slots: Vec<Option<Value>> = vec![None; layout.fields.len()];
            for _ in 0..count {
                let actual = unpacker.peek_format();
                let Some(key) = unpacker.try_read_string() else {
                    let kind =
                        DeserialiseErrorKind::UnexpectedFormat { expected: "field name", actual };
                    return Err(scope.fail(&descriptor, kind));
                };

                let Some(&i) = index.get(key) else {
                    if scope.behaviour() == UnexpectedFieldBehaviour::Throw {
                        return Err(scope.fail(
                            &descriptor,
                            DeserialiseErrorKind::UnexpectedField { field: key.to_owned() },
                        ));
                    }
                    warn!(record = %layout.name, field = key, "Ignoring unexpected field");
                    unpacker.skip_value().map_err(|err| {
                        let kind = DeserialiseErrorKind::Malformed { reason: err.to_string() };
                        scope.fail(&descriptor, kind)
                    })?;
                    continue;
                };

                if slots[i].is_some() {
                    let kind = DeserialiseErrorKind::DuplicateField { field: key.to_owned() };
                    return Err(scope.fail(&descriptor, kind));
                }
                let field = &layout.fields[i];
                let value = field
                    .codec
                    .deserialise(unpacker, &scope.child(&field.name))
                    .map_err(|err| err.at(PathSegment::field(field.name.as_str())))?;
                slots[i] = Some(value);
            }

            let mut record = RecordValue::new();
            for (field, slot) in layout.fields.iter().zip(slots) {
                let Some(value) = slot.or_else(|| field.default.clone()) else {
                    return Err(scope.fail(
                        &descriptor,
                        DeserialiseErrorKind::MissingField { field: field.name.clone() },
                    ));
                };
                record.insert(field.name.as_str(), value);
            }
            Ok(Value::Record(record))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Packer;
    use crate::CodecContext;
    use packwright_types::RecordDefinition;

    fn point_context() -> CodecContext {
        let catalog = TypeCatalog::new()
            .with_record(
                RecordDefinition::new("Acme.Point")
                    .field("x", TypeDescriptor::i32())
                    .field_with_default("y", TypeDescriptor::i32(), 0i32)
                    .field("label", TypeDescriptor::nullable(TypeDescriptor::string())),
            )
            .unwrap();
        CodecContext::new(catalog)
    }

    fn point() -> TypeDescriptor {
        TypeDescriptor::record("Acme.Point")
    }

    #[test]
    fn test_fields_written_in_declaration_order() {
        let context = point_context();
        let codec = context.codec(&point()).unwrap();
        let value = RecordValue::new().with("label", "p").with("y", 2i32).with("x", 1i32);

        let bytes = codec.serialise_to_vec(&value.clone().into()).unwrap();
        let mut expected = Packer::new();
        expected.write_map_header(3).unwrap();
        expected.write_string("x").unwrap();
        expected.write_int(1).unwrap();
        expected.write_string("y").unwrap();
        expected.write_int(2).unwrap();
        expected.write_string("label").unwrap();
        expected.write_string("p").unwrap();
        assert_eq!(bytes, expected.into_bytes());
        assert_eq!(codec.deserialise_slice(&bytes).unwrap(), Value::Record(value));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let context = point_context();
        let codec = context.codec(&point()).unwrap();

        let mut packer = Packer::new();
        packer.write_map_header(1).unwrap();
        packer.write_string("x").unwrap();
        packer.write_int(5).unwrap();

        let value = codec.deserialise_slice(packer.as_bytes()).unwrap();
        let record = value.as_record().unwrap();
        assert_eq!(record.get("y"), Some(&Value::I32(0)));
        assert_eq!(record.get("label"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_required_field() {
        let context = point_context();
        let codec = context.codec(&point()).unwrap();

        let err = codec.deserialise_slice(&[0x80]).unwrap_err();
        assert_eq!(
            err.as_deserialise().map(|e| &e.kind),
            Some(&DeserialiseErrorKind::MissingField { field: "x".to_string() })
        );
    }

    #[test]
    fn test_duplicate_field() {
        let context = point_context();
        let codec = context.codec(&point()).unwrap();

        let mut packer = Packer::new();
        packer.write_map_header(2).unwrap();
        for _ in 0..2 {
            packer.write_string("x").unwrap();
            packer.write_int(5).unwrap();
        }

        let err = codec.deserialise_slice(packer.as_bytes()).unwrap_err();
        assert_eq!(
            err.as_deserialise().map(|e| &e.kind),
            Some(&DeserialiseErrorKind::DuplicateField { field: "x".to_string() })
        );
    }

    #[test]
    fn test_array_is_not_a_record() {
        let context = point_context();
        let codec = context.codec(&point()).unwrap();
        let err = codec.deserialise_slice(&[0x90]).unwrap_err();
        assert!(matches!(
            err.as_deserialise().map(|e| &e.kind),
            Some(DeserialiseErrorKind::ExpectedMapEncoding { .. })
        ));
    }

    #[test]
    fn test_serialise_rejects_undeclared_field() {
        let context = point_context();
        let codec = context.codec(&point()).unwrap();
        let value = RecordValue::new().with("x", 1i32).with("z", 3i32);

        let err = codec.serialise_to_vec(&value.into()).unwrap_err();
        assert!(matches!(
            err.as_serialise().map(|e| &e.kind),
            Some(SerialiseErrorKind::UnexpectedField { field, .. }) if field == "z"
        ));
    }

    #[test]
    fn test_serialise_requires_every_field() {
        let context = point_context();
        let codec = context.codec(&point()).unwrap();

        // y has a default and label is nullable, but neither is filled in on write
        let value = RecordValue::new().with("x", 1i32);
        let err = codec.serialise_to_vec(&value.into()).unwrap_err();
        assert_eq!(
            err.as_serialise().map(|e| &e.kind),
            Some(&SerialiseErrorKind::MissingField {
                record: TypeName::new("Acme.Point"),
                field: "y".to_string(),
            })
        );
    }

    fn inner_catalog() -> TypeCatalog {
        TypeCatalog::new()
            .with_record(RecordDefinition::new("Acme.Inner").field("x", TypeDescriptor::i32()))
            .unwrap()
    }

    #[test]
    fn test_nested_record_default_must_be_complete() {
        let outer = RecordDefinition::new("Acme.Outer").field_with_default(
            "inner",
            TypeDescriptor::record("Acme.Inner"),
            RecordValue::new().with("bogus", "oops"),
        );
        let context = CodecContext::new(inner_catalog().with_record(outer).unwrap());

        let err = context.codec(&TypeDescriptor::record("Acme.Outer")).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidDefault {
                record: TypeName::new("Acme.Outer"),
                field: "inner".to_string(),
                expected: TypeDescriptor::record("Acme.Inner"),
            }
        );
        assert_eq!(context.compiled_count(), 0);
    }

    #[test]
    fn test_every_invalid_default_is_reported() {
        let inner = TypeDescriptor::record("Acme.Inner");
        let outer = RecordDefinition::new("Acme.Outer")
            .field_with_default("first", inner.clone(), RecordValue::new())
            .field_with_default(
                "rest",
                TypeDescriptor::list(inner),
                Value::list([RecordValue::new().with("x", "one").into()]),
            );
        let context = CodecContext::new(inner_catalog().with_record(outer).unwrap());

        let err = context.codec(&TypeDescriptor::record("Acme.Outer")).unwrap_err();
        let fields: Vec<_> = err
            .diagnostics()
            .into_iter()
            .filter_map(|e| match e {
                CompileError::InvalidDefault { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["first", "rest"]);
    }

    #[test]
    fn test_complete_nested_default_round_trips() {
        let inner = TypeDescriptor::record("Acme.Inner");
        let seven: Value = RecordValue::new().with("x", 7i32).into();
        let outer = RecordDefinition::new("Acme.Outer")
            .field_with_default("inner", inner.clone(), seven.clone())
            .field_with_default("rest", TypeDescriptor::list(inner), Value::list([seven.clone()]));
        let context = CodecContext::new(inner_catalog().with_record(outer).unwrap());
        let codec = context.codec(&TypeDescriptor::record("Acme.Outer")).unwrap();

        let value = codec.deserialise_slice(&[0x80]).unwrap();
        let expected: Value = RecordValue::new()
            .with("inner", seven.clone())
            .with("rest", Value::list([seven]))
            .into();
        assert_eq!(value, expected);

        let bytes = codec.serialise_to_vec(&value).unwrap();
        assert_eq!(codec.deserialise_slice(&bytes).unwrap(), value);
    }

    #[test]
    fn test_unknown_record() {
        let context = CodecContext::new(TypeCatalog::new());
        let err = context.codec(&TypeDescriptor::record("Acme.Ghost")).unwrap_err();
        assert_eq!(err, CompileError::UnknownRecord { name: TypeName::new("Acme.Ghost") });
    }
}
