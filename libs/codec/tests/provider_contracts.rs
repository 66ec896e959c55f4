//! Contract tests for provider wire shapes and failure reporting

use packwright_codec::{
    deserialiser, serialiser, CodecContext, CodecError, CompileError, CompileResult, Composer,
    DeserialiseErrorKind, DeserialiseFn, Packer, ProviderRegistry, SerialiseError, SerialiseFn,
    TypeProvider, UnexpectedFieldBehaviour, WireFormat,
};
use packwright_types::{RecordDefinition, RecordValue, TypeCatalog, TypeDescriptor, Value};

fn int_or_string() -> TypeDescriptor {
    TypeDescriptor::union([TypeDescriptor::i32(), TypeDescriptor::string()])
}

fn read_error(descriptor: &TypeDescriptor, bytes: &[u8]) -> CodecError {
    let context = CodecContext::new(TypeCatalog::new());
    context.codec(descriptor).unwrap().deserialise_slice(bytes).unwrap_err()
}

#[test]
fn test_union_wire_shape_is_tag_then_value() {
    let context = CodecContext::new(TypeCatalog::new());
    let codec = context.get_or_compile(&int_or_string(), UnexpectedFieldBehaviour::Throw).unwrap();

    let bytes = codec.serialise_to_vec(&Value::union(TypeDescriptor::i32(), 7i32)).unwrap();
    assert_eq!(bytes, vec![0x92, 0xa5, b'I', b'n', b't', b'3', b'2', 0x07]);

    let bytes = codec.serialise_to_vec(&Value::union(TypeDescriptor::string(), "hi")).unwrap();
    assert_eq!(bytes, vec![0x92, 0xa6, b'S', b't', b'r', b'i', b'n', b'g', 0xa2, b'h', b'i']);
}

#[test]
fn test_unmatched_union_tag() {
    let mut packer = Packer::new();
    packer.write_array_header(2).unwrap();
    packer.write_string("Boolean").unwrap();
    packer.write_bool(true).unwrap();

    let err = read_error(&int_or_string(), packer.as_bytes());
    let err = err.as_deserialise().unwrap();
    assert_eq!(
        err.kind,
        DeserialiseErrorKind::UnmatchedUnionTag { received: "Boolean".to_string() }
    );
    assert_eq!(err.target, int_or_string());
}

#[test]
fn test_unmatched_tag_on_non_nullable_union_fails_even_when_ignoring() {
    let context = CodecContext::new(TypeCatalog::new());
    let codec = context.get_or_compile(&int_or_string(), UnexpectedFieldBehaviour::Ignore).unwrap();

    let mut packer = Packer::new();
    packer.write_array_header(2).unwrap();
    packer.write_string("Boolean").unwrap();
    packer.write_bool(true).unwrap();

    let err = codec.deserialise_slice(packer.as_bytes()).unwrap_err();
    assert!(matches!(
        err.as_deserialise().map(|e| &e.kind),
        Some(DeserialiseErrorKind::UnmatchedUnionTag { .. })
    ));
}

#[test]
fn test_union_value_error_names_the_alternative() {
    let mut packer = Packer::new();
    packer.write_array_header(2).unwrap();
    packer.write_string("Int32").unwrap();
    packer.write_string("seven").unwrap();

    let err = read_error(&int_or_string(), packer.as_bytes());
    let err = err.as_deserialise().unwrap();
    assert_eq!(err.path.to_string(), "$<Int32>");
    assert_eq!(err.target, TypeDescriptor::i32());
    assert!(matches!(
        err.kind,
        DeserialiseErrorKind::UnexpectedFormat { actual: WireFormat::String, .. }
    ));
}

#[test]
fn test_tuple_arity_is_checked_before_items() {
    let pair = TypeDescriptor::tuple([TypeDescriptor::i32(), TypeDescriptor::string()]);

    // three items, the second of which would also be wrong
    let err = read_error(&pair, &[0x93, 0x01, 0x02, 0x03]);
    assert_eq!(
        err.as_deserialise().map(|e| &e.kind),
        Some(&DeserialiseErrorKind::ArityMismatch { expected: 2, actual: 3 })
    );

    let err = read_error(&pair, &[0x92, 0x01, 0x02]);
    let err = err.as_deserialise().unwrap();
    assert_eq!(err.name, "Item2");
    assert_eq!(err.target, TypeDescriptor::string());
    assert_eq!(
        err.kind,
        DeserialiseErrorKind::UnexpectedFormat { expected: "String", actual: WireFormat::Integer }
    );
}

#[test]
fn test_nested_error_path() {
    let catalog = TypeCatalog::new()
        .with_record(
            RecordDefinition::new("Acme.Reading")
                .field("sensor", TypeDescriptor::string())
                .field(
                    "samples",
                    TypeDescriptor::list(TypeDescriptor::tuple([
                        TypeDescriptor::u32(),
                        TypeDescriptor::f64(),
                    ])),
                ),
        )
        .unwrap();
    let context = CodecContext::new(catalog);
    let codec = context.codec(&TypeDescriptor::record("Acme.Reading")).unwrap();

    let mut packer = Packer::new();
    packer.write_map_header(2).unwrap();
    packer.write_string("sensor").unwrap();
    packer.write_string("t1").unwrap();
    packer.write_string("samples").unwrap();
    packer.write_array_header(2).unwrap();
    packer.write_array_header(2).unwrap();
    packer.write_uint(1).unwrap();
    packer.write_f64(20.5).unwrap();
    packer.write_array_header(2).unwrap();
    packer.write_int(-1).unwrap();
    packer.write_f64(21.0).unwrap();

    let err = codec.deserialise_slice(packer.as_bytes()).unwrap_err();
    let err = err.as_deserialise().unwrap();
    assert_eq!(err.path.to_string(), "$.samples[1].Item1");
    assert_eq!(err.kind, DeserialiseErrorKind::IntegerOutOfRange { target: "u32" });
}

#[test]
fn test_serialise_mismatch_reports_path() {
    let ty =
        TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::list(TypeDescriptor::i32()));
    let context = CodecContext::new(TypeCatalog::new());
    let codec = context.codec(&ty).unwrap();

    let samples = Value::list([Value::I32(1), Value::from("two")]);
    let value = Value::Map(vec![(Value::from("a"), samples)]);
    let err = codec.serialise_to_vec(&value).unwrap_err();
    let err = err.as_serialise().unwrap();
    assert_eq!(err.path.to_string(), "$[0].value[1]");
}

#[test]
fn test_every_problem_is_reported_at_once() {
    let ty = TypeDescriptor::tuple([
        TypeDescriptor::nullable(TypeDescriptor::tuple([TypeDescriptor::i32()])),
        TypeDescriptor::record("Acme.Ghost"),
    ]);
    let context = CodecContext::new(TypeCatalog::new());

    let err = context.codec(&ty).unwrap_err();
    let CompileError::Composition { descriptor, diagnostics } = &err else {
        panic!("expected a composition error, got {err}");
    };
    assert_eq!(descriptor, &ty);
    assert_eq!(diagnostics.len(), 2);
    assert!(err.diagnostics().iter().any(|e| matches!(e, CompileError::UnsupportedType { .. })));
    assert!(err.diagnostics().iter().any(|e| matches!(e, CompileError::UnknownRecord { .. })));
    assert_eq!(diagnostics[0].chain.first(), Some(&ty));
}

#[test]
fn test_failed_compilation_publishes_nothing() {
    let ty = TypeDescriptor::tuple([TypeDescriptor::i32(), TypeDescriptor::record("Acme.Ghost")]);
    let context = CodecContext::new(TypeCatalog::new());

    assert!(context.codec(&ty).is_err());
    assert!(!context.is_compiled(&TypeDescriptor::i32()));
    assert_eq!(context.compiled_count(), 0);
    assert_eq!(context.statistics().failed_compilations, 1);

    // the healthy part still compiles on its own
    assert!(context.codec(&TypeDescriptor::i32()).is_ok());
    assert_eq!(context.compiled_count(), 1);
}

#[test]
fn test_single_problem_is_reported_directly() {
    let context = CodecContext::new(TypeCatalog::new());
    let lone = TypeDescriptor::union([TypeDescriptor::i32()]);

    let err = context.codec(&TypeDescriptor::list(lone.clone())).unwrap_err();
    assert_eq!(err, CompileError::UnsupportedType { descriptor: lone });
}

/// Temperatures travel as a bare float instead of a field map
struct CelsiusProvider;

impl TypeProvider for CelsiusProvider {
    fn name(&self) -> &'static str {
        "Celsius"
    }

    fn can_provide(&self, descriptor: &TypeDescriptor, _catalog: &TypeCatalog) -> bool {
        descriptor == &TypeDescriptor::record("Acme.Celsius")
    }

    fn emit_serialiser(
        &self,
        descriptor: &TypeDescriptor,
        _composer: &mut Composer<'_>,
    ) -> CompileResult<SerialiseFn> {
        let descriptor = descriptor.clone();
        Ok(serialiser(move |value, packer| match value {
            Value::F64(degrees) => Ok(packer.write_f64(*degrees)?),
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
            unpacker.try_read_f64().map(Value::F64).ok_or_else(|| {
                let kind = DeserialiseErrorKind::UnexpectedFormat { expected: "Double", actual };
                scope.fail(&descriptor, kind)
            })
        }))
    }
}

#[test]
fn test_custom_provider_takes_priority() {
    let catalog = TypeCatalog::new()
        .with_record(RecordDefinition::new("Acme.Celsius").field("degrees", TypeDescriptor::f64()))
        .unwrap();
    let registry = ProviderRegistry::builder().with_provider(CelsiusProvider).build();
    assert_eq!(registry.names().first(), Some(&"Celsius"));

    let context = CodecContext::builder().catalog(catalog).registry(registry).build();
    let ty = TypeDescriptor::list(TypeDescriptor::record("Acme.Celsius"));
    let codec = context.codec(&ty).unwrap();

    let value = Value::list([Value::F64(21.5), Value::F64(-3.0)]);
    let bytes = codec.serialise_to_vec(&value).unwrap();
    assert_eq!(bytes[0], 0x92);
    assert_eq!(bytes[1], 0xcb);
    assert_eq!(codec.deserialise_slice(&bytes).unwrap(), value);

    let record = context.codec(&TypeDescriptor::record("Acme.Celsius")).unwrap();
    assert_eq!(record.provider(), "Celsius");
    assert!(record.serialise_to_vec(&RecordValue::new().with("degrees", 1.0f64).into()).is_err());
}

#[test]
fn test_registry_without_builtins() {
    let registry =
        ProviderRegistry::builder().with_provider(CelsiusProvider).without_builtins().build();
    let context = CodecContext::builder().registry(registry).build();

    assert_eq!(
        context.codec(&TypeDescriptor::i32()).unwrap_err(),
        CompileError::UnsupportedType { descriptor: TypeDescriptor::i32() }
    );
}
