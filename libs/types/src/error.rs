//! Errors raised while building descriptors, catalogs and opaque values

use thiserror::Error;

use crate::descriptor::{TypeDescriptor, TypeName};

/// Failure to parse the canonical string form of a [`Version`](crate::Version)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("Version \"{input}\" has {count} components, expected between 2 and 4")]
    ComponentCount { input: String, count: usize },

    #[error("Version \"{input}\" has invalid component \"{component}\"")]
    InvalidComponent { input: String, component: String },

    #[error("Version \"{input}\" has component {component} above 2147483647")]
    ComponentOutOfRange { input: String, component: u32 },
}

/// Catalog construction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Record {name} is already declared in this catalog")]
    DuplicateRecord { name: TypeName },

    #[error("Record {record} declares field \"{field}\" more than once")]
    DuplicateField { record: TypeName, field: String },

    #[error("Record {record} field \"{field}\" of type {expected} has a {found} default")]
    DefaultTypeMismatch {
        record: TypeName,
        field: String,
        expected: TypeDescriptor,
        found: &'static str,
    },
}
