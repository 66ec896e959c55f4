//! # Dynamic Values
//!
//! ## Purpose
//!
//! The value model compiled codecs read and write. Every [`TypeDescriptor`]
//! has exactly one matching [`Value`] shape; the codec checks the pairing at
//! serialise time and produces only matching shapes at deserialise time.
//!
//! Equality is structural, so `deserialise(serialise(v)) == v` is a plain
//! `assert_eq!` in tests.

use std::collections::BTreeMap;

use bytes::Bytes;
use rust_decimal::Decimal;

use crate::descriptor::TypeDescriptor;
use crate::version::Version;

/// A value of some described type
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    U8(u8),
    I8(i8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    Decimal(Decimal),
    Version(Version),
    Tuple(Vec<Value>),
    Union(Box<UnionValue>),
    List(Vec<Value>),
    /// Entries in wire order
    Map(Vec<(Value, Value)>),
    Record(RecordValue),
}

impl Value {
    /// Short name of the value's shape, used in mismatch diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Decimal(_) => "decimal",
            Value::Version(_) => "version",
            Value::Tuple(_) => "tuple",
            Value::Union(_) => "union",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Wrap `value` as the `alternative` member of a union
    pub fn union(alternative: TypeDescriptor, value: impl Into<Value>) -> Self {
        Value::Union(Box::new(UnionValue::new(alternative, value)))
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// One alternative held by a tagged union
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
    alternative: TypeDescriptor,
    value: Value,
}

impl UnionValue {
    pub fn new(alternative: TypeDescriptor, value: impl Into<Value>) -> Self {
        Self { alternative, value: value.into() }
    }

    /// Descriptor of the alternative currently held
    pub fn alternative(&self) -> &TypeDescriptor {
        &self.alternative
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (TypeDescriptor, Value) {
        (self.alternative, self.value)
    }
}

/// Field values of a record, keyed by field name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordValue {
    fields: BTreeMap<String, Value>,
}

impl RecordValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<RecordValue> for Value {
    fn from(record: RecordValue) -> Self {
        Value::Record(record)
    }
}

impl From<UnionValue> for Value {
    fn from(union: UnionValue) -> Self {
        Value::Union(Box::new(union))
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    u8 => U8,
    i8 => I8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    Bytes => Bytes,
    Decimal => Decimal,
    Version => Version,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_equality_ignores_insertion_order() {
        let a = RecordValue::new().with("x", 1i32).with("y", "two");
        let b = RecordValue::new().with("y", "two").with("x", 1i32);
        assert_eq!(Value::from(a), Value::from(b));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(7i32)), Value::I32(7));
    }

    #[test]
    fn test_union_parts() {
        let value = Value::union(TypeDescriptor::i32(), 7i32);
        match value {
            Value::Union(union) => {
                assert_eq!(union.alternative(), &TypeDescriptor::i32());
                assert_eq!(union.value(), &Value::I32(7));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }
}
