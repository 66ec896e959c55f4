//! # Canonical Type Tags
//!
//! ## Purpose
//!
//! Union values travel as `[tag, value]`, so the tag string of every
//! alternative is part of the wire contract and must be reproduced exactly by
//! any peer implementation:
//!
//! ```text
//! i32                        → Int32
//! list<i32>                  → [Int32]
//! map<string, i32>           → (String=>Int32)
//! (i32, string)              → System.Tuple<Int32,String>
//! union<i32, string>         → Union<Int32,String>
//! i64?                       → System.Nullable<Int64>
//! bytes                      → System.ArraySegment<Byte>
//! Acme.Node                  → Acme.Node
//! ```
//!
//! Non-generic types use their fully qualified name, except members of the
//! `System` namespace which use their short name. Generic arguments are
//! tagged recursively and joined by `,` with no spaces.

use packwright_types::{PrimitiveType, TypeDescriptor};

const SYSTEM_NAMESPACE: &str = "System";

/// Short name of a primitive as it appears in tags
pub fn primitive_tag(primitive: PrimitiveType) -> &'static str {
    match primitive {
        PrimitiveType::Bool => "Boolean",
        PrimitiveType::U8 => "Byte",
        PrimitiveType::I8 => "SByte",
        PrimitiveType::I16 => "Int16",
        PrimitiveType::U16 => "UInt16",
        PrimitiveType::I32 => "Int32",
        PrimitiveType::U32 => "UInt32",
        PrimitiveType::I64 => "Int64",
        PrimitiveType::U64 => "UInt64",
        PrimitiveType::F32 => "Single",
        PrimitiveType::F64 => "Double",
        PrimitiveType::String => "String",
    }
}

/// Canonical tag string for `descriptor`
pub fn type_tag(descriptor: &TypeDescriptor) -> String {
    let mut tag = String::new();
    write_tag(&mut tag, descriptor);
    tag
}

fn write_tag(out: &mut String, descriptor: &TypeDescriptor) {
    match descriptor {
        TypeDescriptor::Primitive(p) => out.push_str(primitive_tag(*p)),
        TypeDescriptor::Decimal => out.push_str("Decimal"),
        TypeDescriptor::Version => out.push_str("Version"),
        TypeDescriptor::Bytes => out.push_str("System.ArraySegment<Byte>"),
        TypeDescriptor::Record(name) => {
            if name.namespace() == Some(SYSTEM_NAMESPACE) {
                out.push_str(name.simple_name());
            } else {
                out.push_str(name.as_str());
            }
        }
        TypeDescriptor::List(element) => {
            out.push('[');
            write_tag(out, element);
            out.push(']');
        }
        TypeDescriptor::Map(key, value) => {
            out.push('(');
            write_tag(out, key);
            out.push_str("=>");
            write_tag(out, value);
            out.push(')');
        }
        TypeDescriptor::Tuple(items) => write_generic(out, "System.Tuple", items.iter()),
        TypeDescriptor::Union(items) => write_generic(out, "Union", items.iter()),
        TypeDescriptor::Nullable(inner) => {
            write_generic(out, "System.Nullable", std::iter::once(inner.as_ref()))
        }
    }
}

fn write_generic<'d>(
    out: &mut String,
    base: &str,
    arguments: impl Iterator<Item = &'d TypeDescriptor>,
) {
    out.push_str(base);
    out.push('<');
    for (i, argument) in arguments.enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_tag(out, argument);
    }
    out.push('>');
}
