//! # Packwright Codec Compiler
//!
//! ## Purpose
//!
//! This crate is the "Rules" layer of Packwright. Given a static
//! [`TypeDescriptor`], it compiles a matched pair of routines that write
//! values of that type as MessagePack and read them back, without any
//! hand-written per-type code:
//!
//! - **Provider resolution**: an ordered, immutable [`ProviderRegistry`]
//!   maps each descriptor to one encoding strategy
//! - **Composition**: providers obtain nested routines from the [`Composer`],
//!   which handles null wrapping, recursion and batched diagnostics
//! - **Caching**: a [`CodecContext`] compiles each type once and shares the
//!   result across threads
//!
//! ## Quick Start
//!
//! ```rust
//! use packwright_codec::{CodecContext, UnexpectedFieldBehaviour};
//! use packwright_types::{TypeCatalog, TypeDescriptor, Value};
//!
//! let context = CodecContext::new(TypeCatalog::new());
//! let ty = TypeDescriptor::union([TypeDescriptor::i32(), TypeDescriptor::string()]);
//! let codec = context.get_or_compile(&ty, UnexpectedFieldBehaviour::Throw).unwrap();
//!
//! let value = Value::union(TypeDescriptor::i32(), 7i32);
//! let bytes = codec.serialise_to_vec(&value).unwrap();
//! assert_eq!(bytes, b"\x92\xa5Int32\x07");
//! assert_eq!(codec.deserialise_slice(&bytes).unwrap(), value);
//! ```
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec compiler] → callers
//!     ↑               ↓               ↓
//! Descriptors    Providers        Codec handles
//! Values         Composer         Packer/Unpacker
//! Catalog        CodecContext     byte buffers
//! ```
//!
//! ## Wire Contract
//!
//! | Type | MessagePack shape |
//! |------|-------------------|
//! | primitives | native scalar encodings |
//! | byte segment | `bin` |
//! | decimal, version | canonical `str` |
//! | tuple of N | `array(N)` |
//! | union | `array(2)`: canonical type tag, value |
//! | list | `array(n)` |
//! | map | `map(n)` |
//! | record | `map(fields)` keyed by field name |
//! | nullable | `nil` or the inner encoding |
//!
//! ## What This Crate Does NOT Contain
//! - Transport, framing or schema negotiation
//! - Raw data structure definitions (belongs in libs/types)

pub mod behaviour;
pub mod codec;
pub mod compose;
pub mod config;
pub mod context;
pub mod error;
pub mod path;
pub mod provider;
pub mod tag;
pub mod wire;

pub use behaviour::UnexpectedFieldBehaviour;
pub use codec::{
    deserialiser, serialiser, Codec, CodecRef, CompiledCodec, DeserialiseFn, ReadScope, SerialiseFn,
};
pub use compose::Composer;
pub use config::CodecConfig;
pub use context::{CodecContext, CodecContextBuilder, CompileStatistics};
pub use error::{
    CodecError, CodecResult, CompileError, CompileResult, DeserialiseError, DeserialiseErrorKind,
    Diagnostic, InternalError, SerialiseError, SerialiseErrorKind,
};
pub use path::{FieldPath, PathSegment};
pub use provider::{
    builtin_providers, BufferProvider, CanonicalString, DecimalProvider, ListProvider, MapProvider,
    OpaqueStringProvider, PrimitiveProvider, ProviderRegistry, ProviderRegistryBuilder,
    RecordProvider, TupleProvider, TypeProvider, UnionProvider,
};
pub use tag::type_tag;
pub use wire::{Packer, Unpacker, WireError, WireFormat};

// Re-export the data model so callers need one import path
pub use packwright_types::{TypeCatalog, TypeDescriptor, Value};
