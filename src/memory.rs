//! # In-Memory Collaborator Reference Implementation
//!
//! A `Vec<Vec<u8>>`-backed [`ByteSink`]/[`ByteRangeReader`] pair. Real
//! on-disk storage is an external collaborator concern the engine never
//! touches directly, but every embedding needs *some* concrete
//! implementation, and the crate's own tests and benches need one that
//! doesn't touch a filesystem. Loosely mirrors an earlier prototype's
//! in-process buffer-backed table storage, generalized behind the
//! collaborator trait boundary.

use crate::collab::{ByteRangeReader, ByteSink, CollaboratorError};

/// An opaque handle identifying a payload stored in a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLocation(usize);

/// A process-local, in-memory collaborator: every flushed payload is
/// appended to an internal `Vec` and addressed by its index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Vec<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore { tables: Vec::new() }
    }

    /// Returns the full stored payload at `location`, for tests that
    /// want to inspect the raw bytes rather than read a sub-range.
    pub fn contents(&self, location: &MemoryLocation) -> Result<&[u8], CollaboratorError> {
        self.tables
            .get(location.0)
            .map(Vec::as_slice)
            .ok_or_else(|| CollaboratorError::new(format!("no table at index {}", location.0)))
    }

    /// Number of tables stored so far.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl ByteSink for MemoryStore {
    type Location = MemoryLocation;

    fn store(&mut self, _sequence: u64, bytes: &[u8]) -> Result<Self::Location, CollaboratorError> {
        self.tables.push(bytes.to_vec());
        Ok(MemoryLocation(self.tables.len() - 1))
    }
}

impl ByteRangeReader for MemoryStore {
    fn read_range(
        &self,
        location: &Self::Location,
        start: u32,
        end: u32,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let table = self.contents(location)?;
        let (start, end) = (start as usize, end as usize);
        if start > end || end > table.len() {
            return Err(CollaboratorError::new(format!(
                "range {start}..{end} out of bounds for table of length {}",
                table.len()
            )));
        }
        Ok(table[start..end].to_vec())
    }
}
