//! Append-only MessagePack writer

use rmp::encode;

use crate::error::{SerialiseError, SerialiseErrorKind};

fn wire_length(len: usize) -> Result<u32, SerialiseError> {
    u32::try_from(len).map_err(|_| SerialiseError::new(SerialiseErrorKind::LengthOverflow { len }))
}

/// Owned output buffer for compiled serialise routines
#[derive(Debug, Default, Clone)]
pub struct Packer {
    buffer: Vec<u8>,
}

impl Packer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: Vec::with_capacity(capacity) }
    }

    pub fn write_array_header(&mut self, len: usize) -> Result<(), SerialiseError> {
        encode::write_array_len(&mut self.buffer, wire_length(len)?).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn write_map_header(&mut self, len: usize) -> Result<(), SerialiseError> {
        encode::write_map_len(&mut self.buffer, wire_length(len)?).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn write_binary(&mut self, data: &[u8]) -> Result<(), SerialiseError> {
        wire_length(data.len())?;
        encode::write_bin(&mut self.buffer, data).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn write_string(&mut self, data: &str) -> Result<(), SerialiseError> {
        wire_length(data.len())?;
        encode::write_str(&mut self.buffer, data).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn write_nil(&mut self) -> Result<(), SerialiseError> {
        encode::write_nil(&mut self.buffer)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), SerialiseError> {
        encode::write_bool(&mut self.buffer, value)?;
        Ok(())
    }

    /// Smallest encoding that holds `value`
    pub fn write_int(&mut self, value: i64) -> Result<(), SerialiseError> {
        encode::write_sint(&mut self.buffer, value).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn write_uint(&mut self, value: u64) -> Result<(), SerialiseError> {
        encode::write_uint(&mut self.buffer, value).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), SerialiseError> {
        encode::write_f32(&mut self.buffer, value).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), SerialiseError> {
        encode::write_f64(&mut self.buffer, value).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Reset for reuse, keeping the allocation
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
