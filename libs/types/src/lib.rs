//! # Packwright Types Library
//!
//! Pure data structures shared by every layer of the Packwright codec
//! compiler.
//!
//! ## Design Philosophy
//!
//! - **Structural identity**: [`TypeDescriptor`] equality is structural, so it
//!   doubles as a cache key for compiled codecs
//! - **Nominal records**: records are referenced by [`TypeName`] and defined
//!   once in a [`TypeCatalog`], which is what makes self-reference possible
//! - **No rules here**: wire formats, type tags and provider selection belong
//!   to `packwright-codec`
//!
//! ## Quick Start
//!
//! ```rust
//! use packwright_types::{RecordDefinition, RecordValue, TypeCatalog, TypeDescriptor, Value};
//!
//! let catalog = TypeCatalog::new()
//!     .with_record(
//!         RecordDefinition::new("Acme.Node")
//!             .field("value", TypeDescriptor::i32())
//!             .field("children", TypeDescriptor::list(TypeDescriptor::record("Acme.Node"))),
//!     )
//!     .unwrap();
//!
//! let leaf = RecordValue::new().with("value", 3i32).with("children", Value::list([]));
//! assert!(catalog.contains(&"Acme.Node".into()));
//! assert_eq!(leaf.len(), 2);
//! ```
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → libs/codec
//!     ↑            ↓
//! Descriptors   Providers, composition,
//! Values        compiled-codec cache
//! Catalog
//! ```

pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod value;
pub mod version;

pub use catalog::{FieldDefinition, RecordDefinition, TypeCatalog};
pub use descriptor::{PrimitiveType, TypeDescriptor, TypeName};
pub use error::{CatalogError, VersionParseError};
pub use value::{RecordValue, UnionValue, Value};
pub use version::Version;

pub use bytes::Bytes;
pub use rust_decimal::Decimal;
