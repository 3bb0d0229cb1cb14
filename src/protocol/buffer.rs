//! Fixed-size record buffers for the call container.
//!
//! Every scalar parameter and the flat part of every structure or table row
//! lives in a `RecordBuffer` whose size is the metadata's byte length for the
//! active encoding. Fields are addressed by offset and length.

use crate::error::{Error, Result};
use bytes::BytesMut;

/// A zero-initialized, fixed-size byte buffer with checked slot access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBuffer {
    data: BytesMut,
}

impl RecordBuffer {
    /// Create a buffer of `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: BytesMut::zeroed(len),
        }
    }

    /// Get the length of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer contents as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[track_caller]
    fn check(&self, offset: usize, len: usize) -> Result<()> {
        let end = offset.checked_add(len).unwrap_or(usize::MAX);
        if end > self.data.len() {
            return Err(Error::BufferTooSmall {
                needed: end,
                available: self.data.len(),
                location: std::panic::Location::caller(),
            });
        }
        Ok(())
    }

    /// Borrow `len` bytes at `offset`.
    #[track_caller]
    pub fn slot(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.check(offset, len)?;
        Ok(&self.data[offset..offset + len])
    }

    /// Mutably borrow `len` bytes at `offset`.
    #[track_caller]
    pub fn slot_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        self.check(offset, len)?;
        Ok(&mut self.data[offset..offset + len])
    }

    #[track_caller]
    fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.slot(offset, N)?);
        Ok(bytes)
    }

    /// Read a single byte.
    #[track_caller]
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.read_array::<1>(offset)?[0])
    }

    /// Read a little-endian i16.
    #[track_caller]
    pub fn read_i16_le(&self, offset: usize) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array(offset)?))
    }

    /// Read a little-endian i32.
    #[track_caller]
    pub fn read_i32_le(&self, offset: usize) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array(offset)?))
    }

    /// Read a little-endian i64.
    #[track_caller]
    pub fn read_i64_le(&self, offset: usize) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array(offset)?))
    }

    /// Read a little-endian f64.
    #[track_caller]
    pub fn read_f64_le(&self, offset: usize) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array(offset)?))
    }

    /// Write raw bytes at `offset`.
    #[track_caller]
    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.slot_mut(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Write a single byte.
    #[track_caller]
    pub fn write_u8(&mut self, offset: usize, val: u8) -> Result<()> {
        self.write_bytes(offset, &[val])
    }

    /// Write a little-endian i16.
    #[track_caller]
    pub fn write_i16_le(&mut self, offset: usize, val: i16) -> Result<()> {
        self.write_bytes(offset, &val.to_le_bytes())
    }

    /// Write a little-endian i32.
    #[track_caller]
    pub fn write_i32_le(&mut self, offset: usize, val: i32) -> Result<()> {
        self.write_bytes(offset, &val.to_le_bytes())
    }

    /// Write a little-endian i64.
    #[track_caller]
    pub fn write_i64_le(&mut self, offset: usize, val: i64) -> Result<()> {
        self.write_bytes(offset, &val.to_le_bytes())
    }

    /// Write a little-endian f64.
    #[track_caller]
    pub fn write_f64_le(&mut self, offset: usize, val: f64) -> Result<()> {
        self.write_bytes(offset, &val.to_le_bytes())
    }

    /// Write padding zeros.
    #[track_caller]
    pub fn write_zeros(&mut self, offset: usize, count: usize) -> Result<()> {
        self.slot_mut(offset, count)?.fill(0);
        Ok(())
    }
}
