//! # Type Descriptors
//!
//! ## Purpose
//!
//! Structural identity for every shape the codec compiler can encode. A
//! [`TypeDescriptor`] is immutable once built and compares structurally: two
//! descriptors denoting the same instantiation are equal and hash equally,
//! which is what lets the compilation context use them as cache keys.
//!
//! Nominal record types are referenced by [`TypeName`] only. Their fields live
//! in the [`TypeCatalog`](crate::TypeCatalog), which is how a record can refer
//! to itself without the descriptor becoming an infinite tree.

use std::fmt;

use crate::catalog::{RecordDefinition, TypeCatalog};
use crate::value::{RecordValue, Value};

/// Scalar types with a direct MessagePack encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Bool,
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    String,
}

impl PrimitiveType {
    /// Every primitive, in declaration order
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Bool,
        PrimitiveType::U8,
        PrimitiveType::I8,
        PrimitiveType::I16,
        PrimitiveType::U16,
        PrimitiveType::I32,
        PrimitiveType::U32,
        PrimitiveType::I64,
        PrimitiveType::U64,
        PrimitiveType::F32,
        PrimitiveType::F64,
        PrimitiveType::String,
    ];

    /// Rust-style spelling used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::U8 => "u8",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::U16 => "u16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::U32 => "u32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::U64 => "u64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::String => "string",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            PrimitiveType::Bool | PrimitiveType::F32 | PrimitiveType::F64 | PrimitiveType::String
        )
    }
}

/// Fully qualified name of a nominal type, e.g. `Acme.Inventory.Item`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace portion, if the name is qualified
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(ns, _)| ns)
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Structural description of an encodable type
///
/// Composite variants own their element descriptors; records are nominal and
/// resolved through the catalog at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// MessagePack scalar
    Primitive(PrimitiveType),
    /// Contiguous segment of bytes
    Bytes,
    /// Arbitrary-precision decimal
    Decimal,
    /// `major.minor[.build[.revision]]` version value
    Version,
    /// Positional, fixed-arity product
    Tuple(Vec<TypeDescriptor>),
    /// Tagged union over the declared alternatives
    Union(Vec<TypeDescriptor>),
    /// Read-only sequence
    List(Box<TypeDescriptor>),
    /// Read-only mapping
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// Inner type or null
    Nullable(Box<TypeDescriptor>),
    /// Named record declared in the catalog
    Record(TypeName),
}

impl TypeDescriptor {
    pub fn bool() -> Self {
        Self::Primitive(PrimitiveType::Bool)
    }

    pub fn u8() -> Self {
        Self::Primitive(PrimitiveType::U8)
    }

    pub fn i16() -> Self {
        Self::Primitive(PrimitiveType::I16)
    }

    pub fn i32() -> Self {
        Self::Primitive(PrimitiveType::I32)
    }

    pub fn u32() -> Self {
        Self::Primitive(PrimitiveType::U32)
    }

    pub fn i64() -> Self {
        Self::Primitive(PrimitiveType::I64)
    }

    pub fn u64() -> Self {
        Self::Primitive(PrimitiveType::U64)
    }

    pub fn f32() -> Self {
        Self::Primitive(PrimitiveType::F32)
    }

    pub fn f64() -> Self {
        Self::Primitive(PrimitiveType::F64)
    }

    pub fn string() -> Self {
        Self::Primitive(PrimitiveType::String)
    }

    pub fn list(element: TypeDescriptor) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn nullable(inner: TypeDescriptor) -> Self {
        Self::Nullable(Box::new(inner))
    }

    pub fn tuple(elements: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self::Tuple(elements.into_iter().collect())
    }

    pub fn union(alternatives: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        Self::Union(alternatives.into_iter().collect())
    }

    pub fn record(name: impl Into<TypeName>) -> Self {
        Self::Record(name.into())
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, TypeDescriptor::Tuple(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self, TypeDescriptor::Union(_))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeDescriptor::Nullable(_))
    }

    /// Generic arguments in declaration order; empty for non-generic shapes
    pub fn type_arguments(&self) -> Vec<&TypeDescriptor> {
        match self {
            TypeDescriptor::Tuple(items) | TypeDescriptor::Union(items) => items.iter().collect(),
            TypeDescriptor::List(element) | TypeDescriptor::Nullable(element) => {
                vec![element.as_ref()]
            }
            TypeDescriptor::Map(key, value) => vec![key.as_ref(), value.as_ref()],
            TypeDescriptor::Primitive(_)
            | TypeDescriptor::Bytes
            | TypeDescriptor::Decimal
            | TypeDescriptor::Version
            | TypeDescriptor::Record(_) => Vec::new(),
        }
    }

    /// Whether `value` has the shape this descriptor encodes
    ///
    /// Records are checked nominally shallow: any record value is admitted,
    /// since record fields are resolved through the catalog. Use
    /// [`admits_in`](Self::admits_in) once the catalog is complete.
    pub fn admits(&self, value: &Value) -> bool {
        self.conforms(None, value)
    }

    /// Whether `value` is a complete value of this descriptor, checking
    /// record values field by field against `catalog`
    ///
    /// A record value must carry every declared field and nothing else, and
    /// must name a record the catalog declares.
    pub fn admits_in(&self, catalog: &TypeCatalog, value: &Value) -> bool {
        self.conforms(Some(catalog), value)
    }

    fn conforms(&self, catalog: Option<&TypeCatalog>, value: &Value) -> bool {
        match (self, value) {
            (TypeDescriptor::Nullable(_), Value::Null) => true,
            (TypeDescriptor::Nullable(inner), value) => inner.conforms(catalog, value),
            (TypeDescriptor::Primitive(p), value) => primitive_admits(*p, value),
            (TypeDescriptor::Bytes, Value::Bytes(_))
            | (TypeDescriptor::Decimal, Value::Decimal(_))
            | (TypeDescriptor::Version, Value::Version(_)) => true,
            (TypeDescriptor::Record(name), Value::Record(record)) => match catalog {
                None => true,
                Some(catalog) => catalog
                    .record(name)
                    .is_some_and(|definition| record_conforms(catalog, definition, record)),
            },
            (TypeDescriptor::Tuple(types), Value::Tuple(values)) => {
                types.len() == values.len()
                    && types.iter().zip(values).all(|(ty, value)| ty.conforms(catalog, value))
            }
            (TypeDescriptor::Union(alternatives), Value::Union(union)) => {
                let alternative = union.alternative();
                alternatives.contains(alternative) && alternative.conforms(catalog, union.value())
            }
            (TypeDescriptor::List(element), Value::List(values)) => {
                values.iter().all(|value| element.conforms(catalog, value))
            }
            (TypeDescriptor::Map(key, value), Value::Map(entries)) => entries
                .iter()
                .all(|(k, v)| key.conforms(catalog, k) && value.conforms(catalog, v)),
            _ => false,
        }
    }
}

fn record_conforms(
    catalog: &TypeCatalog,
    definition: &RecordDefinition,
    record: &RecordValue,
) -> bool {
    record.names().all(|name| definition.find_field(name).is_some())
        && definition.fields().iter().all(|field| {
            record
                .get(field.name())
                .is_some_and(|value| field.ty().conforms(Some(catalog), value))
        })
}

fn primitive_admits(primitive: PrimitiveType, value: &Value) -> bool {
    matches!(
        (primitive, value),
        (PrimitiveType::Bool, Value::Bool(_))
            | (PrimitiveType::U8, Value::U8(_))
            | (PrimitiveType::I8, Value::I8(_))
            | (PrimitiveType::I16, Value::I16(_))
            | (PrimitiveType::U16, Value::U16(_))
            | (PrimitiveType::I32, Value::I32(_))
            | (PrimitiveType::U32, Value::U32(_))
            | (PrimitiveType::I64, Value::I64(_))
            | (PrimitiveType::U64, Value::U64(_))
            | (PrimitiveType::F32, Value::F32(_))
            | (PrimitiveType::F64, Value::F64(_))
            | (PrimitiveType::String, Value::String(_))
    )
}

impl From<PrimitiveType> for TypeDescriptor {
    fn from(primitive: PrimitiveType) -> Self {
        TypeDescriptor::Primitive(primitive)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => f.write_str(p.name()),
            TypeDescriptor::Bytes => f.write_str("bytes"),
            TypeDescriptor::Decimal => f.write_str("decimal"),
            TypeDescriptor::Version => f.write_str("version"),
            TypeDescriptor::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            TypeDescriptor::Union(items) => {
                f.write_str("union<")?;
                write_joined(f, items)?;
                f.write_str(">")
            }
            TypeDescriptor::List(element) => write!(f, "list<{element}>"),
            TypeDescriptor::Map(key, value) => write!(f, "map<{key}, {value}>"),
            TypeDescriptor::Nullable(inner) => write!(f, "{inner}?"),
            TypeDescriptor::Record(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let ints = TypeDescriptor::list(TypeDescriptor::i32());
        let a = TypeDescriptor::map(TypeDescriptor::string(), ints.clone());
        let b = TypeDescriptor::map(TypeDescriptor::string(), ints);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&TypeDescriptor::list(TypeDescriptor::i32())));
    }

    #[test]
    fn test_display() {
        let ty = TypeDescriptor::tuple([
            TypeDescriptor::i32(),
            TypeDescriptor::nullable(TypeDescriptor::string()),
            TypeDescriptor::record("Acme.Node"),
        ]);
        assert_eq!(ty.to_string(), "(i32, string?, Acme.Node)");
        assert_eq!(TypeDescriptor::tuple([TypeDescriptor::Bytes]).to_string(), "(bytes,)");
        assert_eq!(
            TypeDescriptor::union([TypeDescriptor::i32(), TypeDescriptor::Version]).to_string(),
            "union<i32, version>"
        );
    }

    #[test]
    fn test_type_name_segments() {
        let name = TypeName::new("Acme.Inventory.Item");
        assert_eq!(name.namespace(), Some("Acme.Inventory"));
        assert_eq!(name.simple_name(), "Item");

        let bare = TypeName::new("Item");
        assert_eq!(bare.namespace(), None);
        assert_eq!(bare.simple_name(), "Item");
    }

    #[test]
    fn test_type_arguments() {
        let map = TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::i64());
        assert_eq!(map.type_arguments(), vec![&TypeDescriptor::string(), &TypeDescriptor::i64()]);
        assert!(TypeDescriptor::Decimal.type_arguments().is_empty());
    }

    #[test]
    fn test_admits_matches_value_shape() {
        assert!(TypeDescriptor::i32().admits(&Value::I32(7)));
        assert!(!TypeDescriptor::i32().admits(&Value::I64(7)));
        assert!(!TypeDescriptor::i32().admits(&Value::from("oops")));
        assert!(!TypeDescriptor::i32().admits(&Value::Null));

        let maybe = TypeDescriptor::nullable(TypeDescriptor::list(TypeDescriptor::string()));
        assert!(maybe.admits(&Value::Null));
        assert!(maybe.admits(&Value::list([Value::from("a")])));
        assert!(!maybe.admits(&Value::list([Value::Bool(true)])));

        let pair = TypeDescriptor::tuple([TypeDescriptor::i32(), TypeDescriptor::string()]);
        assert!(pair.admits(&Value::tuple([Value::I32(1), Value::from("a")])));
        assert!(!pair.admits(&Value::tuple([Value::I32(1)])));

        let either = TypeDescriptor::union([TypeDescriptor::i32(), TypeDescriptor::string()]);
        assert!(either.admits(&Value::union(TypeDescriptor::string(), "a")));
        assert!(!either.admits(&Value::union(TypeDescriptor::bool(), true)));
        assert!(!either.admits(&Value::union(TypeDescriptor::i32(), "a")));
    }

    #[test]
    fn test_admits_in_checks_record_fields() {
        let catalog = TypeCatalog::new()
            .with_record(RecordDefinition::new("Acme.Inner").field("x", TypeDescriptor::i32()))
            .unwrap();
        let inner = TypeDescriptor::record("Acme.Inner");
        let good = Value::from(RecordValue::new().with("x", 1i32));
        let undeclared = Value::from(RecordValue::new().with("x", 1i32).with("bogus", "oops"));
        let missing = Value::from(RecordValue::new());
        let mistyped = Value::from(RecordValue::new().with("x", "one"));

        assert!(inner.admits_in(&catalog, &good));
        assert!(!inner.admits_in(&catalog, &undeclared));
        assert!(!inner.admits_in(&catalog, &missing));
        assert!(!inner.admits_in(&catalog, &mistyped));
        // the shallow check cannot tell them apart
        assert!(inner.admits(&undeclared));

        let nested = TypeDescriptor::list(TypeDescriptor::nullable(inner));
        assert!(nested.admits_in(&catalog, &Value::list([good.clone(), Value::Null])));
        assert!(!nested.admits_in(&catalog, &Value::list([good, mistyped])));
        assert!(!TypeDescriptor::record("Acme.Ghost").admits_in(&catalog, &missing));
    }
}
