//! # Collaborator Traits
//!
//! The engine never touches a filesystem directly: it is generic over
//! two small traits supplied by whatever embeds it — an HTTP server, a
//! CLI, a test harness. I/O stays at the edges; the core logic stays
//! pure, with the "edge" expressed as a trait boundary rather than a
//! concrete `std::fs`/`memmap2` implementation.
//!
//! - [`ByteSink`] accepts a freshly-dumped SSTable payload at flush time
//!   and returns an opaque `Location` the engine stores for later reads.
//! - [`ByteRangeReader`] reads back a bounded byte range from a
//!   previously-stored payload, given that same `Location`.
//!
//! A single concrete collaborator (see [`crate::memory::MemoryStore`])
//! typically implements both traits and shares one `Location` type, which
//! is why [`crate::engine::Engine`] is generic over one type parameter
//! bounded by both traits rather than two independent ones.

use thiserror::Error;

/// Errors a collaborator implementation may surface. The core treats
/// these as opaque I/O failures — it does not interpret `reason` beyond
/// logging and propagating it.
#[derive(Debug, Error)]
#[error("collaborator I/O error: {reason}")]
pub struct CollaboratorError {
    pub reason: String,
}

impl CollaboratorError {
    pub fn new(reason: impl Into<String>) -> Self {
        CollaboratorError {
            reason: reason.into(),
        }
    }
}

/// Accepts a dumped SSTable payload and stores it durably (or not — the
/// core does not care), returning a `Location` that later identifies it
/// to [`ByteRangeReader`].
pub trait ByteSink {
    /// Identifies a previously-stored payload for later range reads.
    type Location: Clone;

    /// Stores `bytes` under `sequence`, a monotonically increasing flush
    /// counter the engine maintains.
    fn store(&mut self, sequence: u64, bytes: &[u8]) -> Result<Self::Location, CollaboratorError>;
}

/// Reads back a bounded byte range from a payload previously returned by
/// [`ByteSink::store`].
pub trait ByteRangeReader: ByteSink {
    /// Reads `bytes[start..end)` of the payload at `location`.
    fn read_range(
        &self,
        location: &<Self as ByteSink>::Location,
        start: u32,
        end: u32,
    ) -> Result<Vec<u8>, CollaboratorError>;
}
