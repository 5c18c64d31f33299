//! # Key Module
//!
//! A polymorphic, self-describing key type used throughout the engine: the
//! memtable, the sparse index, and the SSTable payload all store the same
//! [`Key`] encoding side by side, so the wire format must identify its own
//! variant rather than relying on positional context.
//!
//! ## Wire format
//!
//! ```text
//! [type: u8][payload]
//! type 0x00 (U32)    -> payload = 4 bytes, big-endian
//! type 0x01 (String) -> payload = [len: u32 big-endian][utf-8 bytes]
//! ```
//!
//! ## Hashing
//!
//! [`Key::hash`] derives `n` independent-looking 32-bit hashes via double
//! hashing: `h(i) = h1 + i * h2`, where `h1`/`h2` are FNV-1a and FNV-1 over
//! the key's raw payload bytes. This is the scheme the Bloom filter relies
//! on for `k` hash functions from two underlying ones.

use std::cmp::Ordering;

use thiserror::Error;

/// Errors produced while comparing or parsing [`Key`] values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Two keys of different variants were compared. Comparison across
    /// kinds is undefined by design — this is a programmer
    /// error surfaced as a `TypeError` rather than a recoverable outcome.
    #[error("cannot compare keys of different variants")]
    TypeMismatch,

    /// The type byte at the start of an encoded key was not recognised.
    #[error("unknown key type byte: 0x{0:02x}")]
    UnknownType(u8),

    /// The buffer ended before a complete key could be parsed.
    #[error("short read while parsing key: need {needed} bytes, have {available}")]
    ShortRead { needed: usize, available: usize },

    /// A string key's payload was not valid UTF-8.
    #[error("invalid UTF-8 in string key: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

const TYPE_U32: u8 = 0x00;
const TYPE_STRING: u8 = 0x01;

/// A typed, comparable key over the variant set `{U32, String}`.
///
/// Keys of different variants are never compared against each other in a
/// single engine instance — mixing variants within one [`crate::tree::OrderedTree`]
/// is a programmer error (see [`KeyError::TypeMismatch`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// An unsigned 32-bit integer key.
    U32(u32),
    /// A UTF-8 string key.
    Str(String),
}

impl Key {
    /// Orders `self` relative to `other`.
    ///
    /// # Errors
    /// Returns [`KeyError::TypeMismatch`] if `self` and `other` are
    /// different variants; callers that already know both keys share a
    /// variant (e.g. code operating inside a single ordered tree) may
    /// `.expect()` this away as an invariant violation.
    pub fn compare(&self, other: &Key) -> Result<Ordering, KeyError> {
        match (self, other) {
            (Key::U32(a), Key::U32(b)) => Ok(a.cmp(b)),
            (Key::Str(a), Key::Str(b)) => Ok(a.cmp(b)),
            _ => Err(KeyError::TypeMismatch),
        }
    }

    /// Encodes this key into its self-describing byte representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Key::U32(v) => {
                buf.push(TYPE_U32);
                buf.extend_from_slice(&v.to_be_bytes());
            }
            Key::Str(s) => {
                buf.push(TYPE_STRING);
                buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
        buf
    }

    /// Parses a key from the front of `buf`, returning the key and the
    /// number of bytes consumed.
    pub fn parse(buf: &[u8]) -> Result<(Key, usize), KeyError> {
        let Some(&type_byte) = buf.first() else {
            return Err(KeyError::ShortRead {
                needed: 1,
                available: 0,
            });
        };

        match type_byte {
            TYPE_U32 => {
                let body = &buf[1..];
                if body.len() < 4 {
                    return Err(KeyError::ShortRead {
                        needed: 4,
                        available: body.len(),
                    });
                }
                let v = u32::from_be_bytes(body[..4].try_into().unwrap());
                Ok((Key::U32(v), 5))
            }
            TYPE_STRING => {
                let body = &buf[1..];
                if body.len() < 4 {
                    return Err(KeyError::ShortRead {
                        needed: 4,
                        available: body.len(),
                    });
                }
                let len = u32::from_be_bytes(body[..4].try_into().unwrap()) as usize;
                let str_body = &body[4..];
                if str_body.len() < len {
                    return Err(KeyError::ShortRead {
                        needed: len,
                        available: str_body.len(),
                    });
                }
                let s = String::from_utf8(str_body[..len].to_vec())?;
                Ok((Key::Str(s), 1 + 4 + len))
            }
            other => Err(KeyError::UnknownType(other)),
        }
    }

    /// Returns `n` double-hashed 32-bit values derived from this key's raw
    /// payload bytes: `h(i) = h1 + i * h2` (wrapping `u32` arithmetic).
    ///
    /// `h1` is FNV-1a and `h2` is FNV-1 over the payload — `U32` payloads
    /// hash their little-endian 4 bytes; `String` payloads hash their raw
    /// UTF-8 bytes.
    pub fn hash(&self, n: u32) -> Vec<u32> {
        let payload = self.hash_payload();
        let h1 = fnv1a_32(&payload);
        let h2 = fnv1_32(&payload);

        (0..n)
            .map(|i| h1.wrapping_add(i.wrapping_mul(h2)))
            .collect()
    }

    fn hash_payload(&self) -> Vec<u8> {
        match self {
            Key::U32(v) => v.to_le_bytes().to_vec(),
            Key::Str(s) => s.as_bytes().to_vec(),
        }
    }
}

const FNV_OFFSET_32: u32 = 0x811c_9dc5;
const FNV_PRIME_32: u32 = 0x0100_0193;

fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_32;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME_32);
    }
    hash
}

fn fnv1_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_32;
    for &b in bytes {
        hash = hash.wrapping_mul(FNV_PRIME_32);
        hash ^= b as u32;
    }
    hash
}
