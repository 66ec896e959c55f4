//! Borrowing MessagePack reader
//!
//! Every `try_read_*` either consumes exactly one value of the requested
//! format or leaves the cursor untouched and returns `None`.

use rmp::decode;
use rmp::Marker;

use super::{WireError, WireFormat};

/// Cursor over a borrowed input slice
#[derive(Debug, Clone)]
pub struct Unpacker<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Unpacker<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    /// Run `read` on a copy of the cursor, committing only on success
    fn attempt<T, E>(&mut self, read: impl FnOnce(&mut &'a [u8]) -> Result<T, E>) -> Option<T> {
        let mut cursor: &'a [u8] = &self.input[self.position..];
        let value = read(&mut cursor).ok()?;
        self.position = self.input.len() - cursor.len();
        Some(value)
    }

    fn take_bytes(cursor: &mut &'a [u8], len: usize) -> Result<&'a [u8], ()> {
        if cursor.len() < len {
            return Err(());
        }
        let (head, rest) = cursor.split_at(len);
        *cursor = rest;
        Ok(head)
    }

    /// Format class of the next value, without consuming it
    pub fn peek_format(&self) -> WireFormat {
        match self.input.get(self.position) {
            Some(&byte) => WireFormat::of_marker(Marker::from_u8(byte)),
            None => WireFormat::EndOfInput,
        }
    }

    pub fn try_read_nil(&mut self) -> bool {
        self.attempt(|cursor| decode::read_nil(cursor)).is_some()
    }

    pub fn try_read_bool(&mut self) -> Option<bool> {
        self.attempt(|cursor| decode::read_bool(cursor))
    }

    /// Any integer encoding whose value fits in `i64`
    pub fn try_read_i64(&mut self) -> Option<i64> {
        self.attempt(|cursor| decode::read_int::<i64, _>(cursor))
    }

    /// Any integer encoding whose value fits in `u64`
    pub fn try_read_u64(&mut self) -> Option<u64> {
        self.attempt(|cursor| decode::read_int::<u64, _>(cursor))
    }

    pub fn try_read_f32(&mut self) -> Option<f32> {
        self.attempt(|cursor| decode::read_f32(cursor))
    }

    pub fn try_read_f64(&mut self) -> Option<f64> {
        self.attempt(|cursor| decode::read_f64(cursor))
    }

    /// UTF-8 string payload, borrowed from the input
    pub fn try_read_string(&mut self) -> Option<&'a str> {
        self.attempt(|cursor| {
            let len = decode::read_str_len(cursor).map_err(drop)? as usize;
            let raw = Self::take_bytes(cursor, len)?;
            std::str::from_utf8(raw).map_err(drop)
        })
    }

    /// Binary payload, borrowed from the input
    pub fn try_read_binary(&mut self) -> Option<&'a [u8]> {
        self.attempt(|cursor| {
            let len = decode::read_bin_len(cursor).map_err(drop)? as usize;
            Self::take_bytes(cursor, len)
        })
    }

    pub fn try_read_array_header(&mut self) -> Option<u32> {
        self.attempt(|cursor| decode::read_array_len(cursor))
    }

    pub fn try_read_map_header(&mut self) -> Option<u32> {
        self.attempt(|cursor| decode::read_map_len(cursor))
    }

    fn advance(&mut self, len: usize) -> Result<(), ()> {
        if self.remaining() < len {
            return Err(());
        }
        self.position += len;
        Ok(())
    }

    fn read_length(&mut self, width: usize) -> Result<usize, ()> {
        let start = self.position;
        self.advance(width)?;
        let len = self.input[start..self.position]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        Ok(len)
    }

    /// Consume one complete value of any format, including nested containers
    ///
    /// Walks containers with a pending-value counter instead of recursion, so
    /// hostile nesting cannot exhaust the stack. Each step consumes at least
    /// one byte, which bounds the walk by the input length.
    pub fn skip_value(&mut self) -> Result<(), WireError> {
        let start = self.position;
        let mut pending: u64 = 1;

        while pending > 0 {
            pending -= 1;
            let offset = self.position;
            let step = self.skip_one(&mut pending);
            match step {
                Ok(()) => {}
                Err(SkipFailure::Truncated) => {
                    self.position = start;
                    return Err(WireError::Truncated { position: offset });
                }
                Err(SkipFailure::Reserved) => {
                    self.position = start;
                    return Err(WireError::ReservedMarker { position: offset });
                }
            }
        }
        Ok(())
    }

    fn skip_one(&mut self, pending: &mut u64) -> Result<(), SkipFailure> {
        let truncated = |_: ()| SkipFailure::Truncated;
        let byte = *self.input.get(self.position).ok_or(SkipFailure::Truncated)?;
        self.position += 1;

        match Marker::from_u8(byte) {
            Marker::FixPos(_)
            | Marker::FixNeg(_)
            | Marker::Null
            | Marker::True
            | Marker::False => {}
            Marker::U8 | Marker::I8 => self.advance(1).map_err(truncated)?,
            Marker::U16 | Marker::I16 => self.advance(2).map_err(truncated)?,
            Marker::U32 | Marker::I32 | Marker::F32 => self.advance(4).map_err(truncated)?,
            Marker::U64 | Marker::I64 | Marker::F64 => self.advance(8).map_err(truncated)?,
            Marker::FixStr(len) => self.advance(usize::from(len)).map_err(truncated)?,
            Marker::Str8 | Marker::Bin8 => {
                let len = self.read_length(1).map_err(truncated)?;
                self.advance(len).map_err(truncated)?
            }
            Marker::Str16 | Marker::Bin16 => {
                let len = self.read_length(2).map_err(truncated)?;
                self.advance(len).map_err(truncated)?
            }
            Marker::Str32 | Marker::Bin32 => {
                let len = self.read_length(4).map_err(truncated)?;
                self.advance(len).map_err(truncated)?
            }
            Marker::FixArray(len) => *pending += u64::from(len),
            Marker::Array16 => *pending += self.read_length(2).map_err(truncated)? as u64,
            Marker::Array32 => *pending += self.read_length(4).map_err(truncated)? as u64,
            Marker::FixMap(len) => *pending += 2 * u64::from(len),
            Marker::Map16 => *pending += 2 * self.read_length(2).map_err(truncated)? as u64,
            Marker::Map32 => *pending += 2 * self.read_length(4).map_err(truncated)? as u64,
            // ext payloads carry one type byte ahead of the data
            Marker::FixExt1 => self.advance(2).map_err(truncated)?,
            Marker::FixExt2 => self.advance(3).map_err(truncated)?,
            Marker::FixExt4 => self.advance(5).map_err(truncated)?,
            Marker::FixExt8 => self.advance(9).map_err(truncated)?,
            Marker::FixExt16 => self.advance(17).map_err(truncated)?,
            Marker::Ext8 => {
                let len = self.read_length(1).map_err(truncated)?;
                self.advance(len + 1).map_err(truncated)?
            }
            Marker::Ext16 => {
                let len = self.read_length(2).map_err(truncated)?;
                self.advance(len + 1).map_err(truncated)?
            }
            Marker::Ext32 => {
                let len = self.read_length(4).map_err(truncated)?;
                self.advance(len + 1).map_err(truncated)?
            }
            Marker::Reserved => return Err(SkipFailure::Reserved),
        }
        Ok(())
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

enum SkipFailure {
    Truncated,
    Reserved,
}
