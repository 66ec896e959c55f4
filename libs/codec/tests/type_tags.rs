//! Canonical type tags as they appear in union payloads

use packwright_codec::{type_tag, CodecContext, Packer};
use packwright_types::{RecordDefinition, TypeCatalog, TypeDescriptor, Value};

#[test]
fn test_collection_tags() {
    assert_eq!(type_tag(&TypeDescriptor::list(TypeDescriptor::i32())), "[Int32]");
    assert_eq!(
        type_tag(&TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::i32())),
        "(String=>Int32)"
    );
    assert_eq!(
        type_tag(&TypeDescriptor::list(TypeDescriptor::list(TypeDescriptor::u8()))),
        "[[Byte]]"
    );
}

#[test]
fn test_generic_tags() {
    assert_eq!(
        type_tag(&TypeDescriptor::union([TypeDescriptor::i32(), TypeDescriptor::string()])),
        "Union<Int32,String>"
    );
    assert_eq!(
        type_tag(&TypeDescriptor::tuple([TypeDescriptor::bool(), TypeDescriptor::f64()])),
        "System.Tuple<Boolean,Double>"
    );
    assert_eq!(
        type_tag(&TypeDescriptor::nullable(TypeDescriptor::i64())),
        "System.Nullable<Int64>"
    );
    assert_eq!(type_tag(&TypeDescriptor::Bytes), "System.ArraySegment<Byte>");
}

#[test]
fn test_opaque_string_tags() {
    assert_eq!(type_tag(&TypeDescriptor::Decimal), "Decimal");
    assert_eq!(type_tag(&TypeDescriptor::Version), "Version");
}

#[test]
fn test_record_tags_use_qualified_name() {
    assert_eq!(type_tag(&TypeDescriptor::record("Acme.Shapes.Circle")), "Acme.Shapes.Circle");
    assert_eq!(type_tag(&TypeDescriptor::record("System.DateTime")), "DateTime");
}

#[test]
fn test_union_payload_carries_structured_tag() {
    let catalog = TypeCatalog::new()
        .with_record(RecordDefinition::new("Acme.Empty"))
        .unwrap();
    let context = CodecContext::new(catalog);
    let ints = TypeDescriptor::list(TypeDescriptor::i32());
    let ty = TypeDescriptor::union([ints.clone(), TypeDescriptor::record("Acme.Empty")]);
    let codec = context.codec(&ty).unwrap();

    let value = Value::union(ints, Value::list([Value::I32(1)]));
    let bytes = codec.serialise_to_vec(&value).unwrap();

    let mut expected = Packer::new();
    expected.write_array_header(2).unwrap();
    expected.write_string("[Int32]").unwrap();
    expected.write_array_header(1).unwrap();
    expected.write_int(1).unwrap();
    assert_eq!(bytes, expected.into_bytes());
    assert_eq!(codec.deserialise_slice(&bytes).unwrap(), value);
}
