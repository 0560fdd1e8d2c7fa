//! Memory model primitives and data-access policies.

/// `LD`/`ST` bounds-check policy helpers.
pub mod access;

pub use access::{validate_word_access, BoundsCheck, WORD_ACCESS_BYTES};

use std::ops::Range;

use thiserror::Error;

use crate::SimError;

/// Default memory capacity in bytes (16 MiB).
pub const DEFAULT_MEMORY_BYTES: u32 = 16 * 1024 * 1024;

/// Raw access that does not fit inside the memory buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("access of {len} bytes at {addr} exceeds memory of {capacity} bytes")]
pub struct OutOfRange {
    /// First byte of the attempted access.
    pub addr: u32,
    /// Access width in bytes.
    pub len: u32,
    /// Memory capacity in bytes.
    pub capacity: u32,
}

impl From<OutOfRange> for SimError {
    fn from(value: OutOfRange) -> Self {
        Self::AccessOutOfRange {
            addr: value.addr,
            capacity: value.capacity,
        }
    }
}

/// Flat, zero-initialized, fixed-capacity byte memory.
///
/// Words are stored most-significant byte first regardless of host order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    bytes: Box<[u8]>,
    capacity: u32,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_BYTES)
    }
}

impl Memory {
    /// Allocates `capacity` zeroed bytes.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            bytes: vec![0; capacity as usize].into_boxed_slice(),
            capacity,
        }
    }

    /// Capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Full memory contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn span(&self, addr: u32, len: u32) -> Result<Range<usize>, OutOfRange> {
        let start = addr as usize;
        match start.checked_add(len as usize) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(OutOfRange {
                addr,
                len,
                capacity: self.capacity,
            }),
        }
    }

    /// Reads a big-endian halfword.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] when either byte lies outside memory.
    pub fn read_u16_be(&self, addr: u32) -> Result<u16, OutOfRange> {
        let span = self.span(addr, 2)?;
        let bytes = &self.bytes[span];
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] when any of the four bytes lies outside memory.
    pub fn read_u32_be(&self, addr: u32) -> Result<u32, OutOfRange> {
        let span = self.span(addr, WORD_ACCESS_BYTES)?;
        let bytes = &self.bytes[span];
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Writes a big-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] when any of the four bytes lies outside memory;
    /// memory is left untouched in that case.
    pub fn write_u32_be(&mut self, addr: u32, value: u32) -> Result<(), OutOfRange> {
        let span = self.span(addr, WORD_ACCESS_BYTES)?;
        self.bytes[span].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Copies `data` into memory starting at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] when the block does not fit; nothing is copied.
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), OutOfRange> {
        let len = u32::try_from(data.len()).map_err(|_| OutOfRange {
            addr,
            len: u32::MAX,
            capacity: self.capacity,
        })?;
        let span = self.span(addr, len)?;
        self.bytes[span].copy_from_slice(data);
        Ok(())
    }
}
