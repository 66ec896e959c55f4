//! # Record Catalog
//!
//! Registry of the nominal record shapes a consumer wants to encode. The
//! catalog is filled once, before a codec context is built, and is read-only
//! afterwards.
//!
//! Records evolve by adding fields: a field with a default tolerates payloads
//! written before it existed, and the unexpected-field policy decides what
//! happens to payloads written after a field was removed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{TypeDescriptor, TypeName};
use crate::error::CatalogError;
use crate::value::Value;

/// One declared field of a record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    name: String,
    ty: TypeDescriptor,
    default: Option<Value>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self { name: name.into(), ty, default: None }
    }

    /// Value used when a payload omits this field
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Nominal record shape: a name and its fields in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefinition {
    name: TypeName,
    fields: Vec<FieldDefinition>,
}

impl RecordDefinition {
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.fields.push(FieldDefinition::new(name, ty));
        self
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        ty: TypeDescriptor,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldDefinition::new(name, ty).with_default(default));
        self
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn find_field(&self, name: &str) -> Option<(usize, &FieldDefinition)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Descriptor referring to this record
    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::Record(self.name.clone())
    }
}

/// Immutable set of record definitions, keyed by name
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    records: HashMap<TypeName, Arc<RecordDefinition>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a record
    ///
    /// Rejects duplicate names, duplicate fields and defaults that do not
    /// conform to their field's type.
    pub fn declare(&mut self, record: RecordDefinition) -> Result<&mut Self, CatalogError> {
        if self.records.contains_key(&record.name) {
            return Err(CatalogError::DuplicateRecord { name: record.name });
        }

        for (i, field) in record.fields.iter().enumerate() {
            if record.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CatalogError::DuplicateField {
                    record: record.name.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(default) = field.default.as_ref().filter(|d| !field.ty.admits(d)) {
                return Err(CatalogError::DefaultTypeMismatch {
                    record: record.name.clone(),
                    field: field.name.clone(),
                    expected: field.ty.clone(),
                    found: default.kind(),
                });
            }
        }

        self.records.insert(record.name.clone(), Arc::new(record));
        Ok(self)
    }

    /// Builder-style [`declare`](Self::declare)
    pub fn with_record(mut self, record: RecordDefinition) -> Result<Self, CatalogError> {
        self.declare(record)?;
        Ok(self)
    }

    pub fn record(&self, name: &TypeName) -> Option<&Arc<RecordDefinition>> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
