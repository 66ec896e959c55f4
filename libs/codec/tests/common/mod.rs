//! Shared fixtures for integration tests

#![allow(dead_code)]

use packwright_codec::CodecContext;
use packwright_types::{RecordDefinition, RecordValue, TypeCatalog, TypeDescriptor, Value};

/// Route tracing output through the test harness; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn node() -> TypeDescriptor {
    TypeDescriptor::record("Acme.Node")
}

/// `Acme.Node { value: i32, children: list<Acme.Node> }`
pub fn tree_catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with_record(
            RecordDefinition::new("Acme.Node")
                .field("value", TypeDescriptor::i32())
                .field("children", TypeDescriptor::list(node())),
        )
        .expect("catalog")
}

pub fn tree_context() -> CodecContext {
    CodecContext::new(tree_catalog())
}

/// Node with `depth` levels below it, each level holding one child
pub fn chain_of_nodes(depth: i32) -> Value {
    let children = if depth == 0 { Vec::new() } else { vec![chain_of_nodes(depth - 1)] };
    RecordValue::new()
        .with("value", depth)
        .with("children", Value::List(children))
        .into()
}
