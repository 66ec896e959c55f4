//! # MessagePack Wire Layer
//!
//! ## Purpose
//!
//! Thin, allocation-aware adapters over `rmp` that compiled routines write to
//! and read from. The packer appends to an owned buffer; the unpacker walks a
//! borrowed slice and never consumes input on a failed read, so a routine can
//! probe for one format and report a precise error when it is absent.
//!
//! ## Format Classes
//!
//! Routines reason about the wire in terms of [`WireFormat`], the coarse class
//! of the next value (integer, string, array, …), rather than raw markers.

mod packer;
mod unpacker;

pub use packer::Packer;
pub use unpacker::Unpacker;

use std::fmt;

use rmp::Marker;
use thiserror::Error;

/// Coarse class of the next MessagePack value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Binary,
    Array,
    Map,
    Extension,
    /// The never-used `0xc1` marker
    Reserved,
    EndOfInput,
}

impl WireFormat {
    pub fn of_marker(marker: Marker) -> Self {
        match marker {
            Marker::Null => WireFormat::Nil,
            Marker::True | Marker::False => WireFormat::Boolean,
            Marker::FixPos(_)
            | Marker::FixNeg(_)
            | Marker::U8
            | Marker::U16
            | Marker::U32
            | Marker::U64
            | Marker::I8
            | Marker::I16
            | Marker::I32
            | Marker::I64 => WireFormat::Integer,
            Marker::F32 | Marker::F64 => WireFormat::Float,
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => WireFormat::String,
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => WireFormat::Binary,
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => WireFormat::Array,
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => WireFormat::Map,
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => WireFormat::Extension,
            Marker::Reserved => WireFormat::Reserved,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WireFormat::Nil => "Nil",
            WireFormat::Boolean => "Boolean",
            WireFormat::Integer => "Integer",
            WireFormat::Float => "Float",
            WireFormat::String => "String",
            WireFormat::Binary => "Binary",
            WireFormat::Array => "Array",
            WireFormat::Map => "Map",
            WireFormat::Extension => "Extension",
            WireFormat::Reserved => "Reserved",
            WireFormat::EndOfInput => "end of input",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural damage found while skipping a value
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("input ends inside a value starting at offset {position}")]
    Truncated { position: usize },

    #[error("reserved marker 0xc1 at offset {position}")]
    ReservedMarker { position: usize },
}
