//! # Codec Module
//!
//! Fixed-width, big-endian 32-bit integer encoding. Every length prefix,
//! count, and sparse-index offset in this crate's on-disk formats uses this
//! single encoding, so a dumped memtable or SSTable payload is portable
//! across processes regardless of native endianness.
//!
//! This is deliberately narrow — unlike a general-purpose serialization
//! layer, it knows about exactly one shape: `u32`, big-endian.

use thiserror::Error;

/// Errors produced while decoding fixed-width integers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer than 4 bytes remained where a `u32` was expected.
    #[error("short read decoding u32: need {needed} bytes, have {available}")]
    ShortRead { needed: usize, available: usize },
}

/// Appends `v` to `buf` as 4 big-endian bytes.
pub fn write_u32_be(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// Reads a big-endian `u32` from the front of `buf`, returning the value
/// and the number of bytes consumed (always 4 on success).
pub fn read_u32_be(buf: &[u8]) -> Result<(u32, usize), CodecError> {
    if buf.len() < 4 {
        return Err(CodecError::ShortRead {
            needed: 4,
            available: buf.len(),
        });
    }
    let v = u32::from_be_bytes(buf[..4].try_into().unwrap());
    Ok((v, 4))
}
