//! # SSTable Module
//!
//! An immutable sorted run produced by flushing a memtable. The Bloom
//! filter and sparse index live in memory; the payload blob itself is
//! read through the external [`ByteRangeReader`] collaborator, keeping
//! the core from ever holding a full table's bytes resident at once.

use thiserror::Error;
use tracing::trace;

use crate::codec::{self, CodecError};
use crate::collab::{ByteRangeReader, ByteSink, CollaboratorError};
use crate::key::{Key, KeyError};
use crate::tree::OrderedTree;
use crate::bloom::BloomFilter;

/// Errors arising while reading an SSTable.
#[derive(Debug, Error)]
pub enum SSTableError {
    #[error("failed parsing a key from payload: {0}")]
    Key(#[from] KeyError),

    #[error("failed decoding a length prefix from payload: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// The outcome of [`SSTable::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindResult {
    /// The key was not present in this table (Bloom miss, sparse-index
    /// miss, or not found in the scanned range).
    NotFound,
    /// The key was present with a live value.
    Found(Vec<u8>),
    /// The key was present but tombstoned in this table.
    Tombstoned,
}

/// An immutable flushed run: an in-memory Bloom filter and sparse index
/// over a payload addressed externally via `(location, length)`.
pub struct SSTable<C: ByteSink> {
    bloom: BloomFilter,
    sparse_index: OrderedTree<u32>,
    location: C::Location,
    payload_length: u32,
}

impl<C: ByteSink> SSTable<C> {
    pub fn new(
        bloom: BloomFilter,
        sparse_index: OrderedTree<u32>,
        location: C::Location,
        payload_length: u32,
    ) -> Self {
        SSTable {
            bloom,
            sparse_index,
            location,
            payload_length,
        }
    }
}

impl<C: ByteRangeReader> SSTable<C> {
    /// Looks up `key` in this table via Bloom filter, sparse-index
    /// bounding, and a bounded linear scan of the resulting byte range.
    pub fn find(&self, reader: &C, key: &Key) -> Result<FindResult, SSTableError> {
        if !self.bloom.contains(key) {
            return Ok(FindResult::NotFound);
        }

        let Some(&lower) = self.sparse_index.floor(key) else {
            // No sampled key is `<= key`: by construction, the first
            // sample sits at offset 4 (after the entry-count header),
            // so this means `key` is smaller than anything in the
            // table.
            return Ok(FindResult::NotFound);
        };

        let mut upper = match self.sparse_index.ceil(key) {
            Some(&v) => v,
            None => self.payload_length,
        };
        if lower >= upper {
            // `key` is itself a sparse sample (floor == ceil); extend to
            // the end of the payload.
            upper = self.payload_length;
        }

        trace!(lower, upper, "sstable scan range");
        let range = reader.read_range(&self.location, lower, upper)?;

        let mut offset = 0usize;
        while offset < range.len() {
            let (candidate, key_len) = Key::parse(&range[offset..])?;
            offset += key_len;
            let (value_len, n) = codec::read_u32_be(&range[offset..])?;
            offset += n;
            let value_len = value_len as usize;
            let value = &range[offset..offset + value_len];
            offset += value_len;

            if &candidate == key {
                return Ok(if value == crate::memtable::TOMBSTONE {
                    FindResult::Tombstoned
                } else {
                    FindResult::Found(value.to_vec())
                });
            }
        }

        Ok(FindResult::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::memtable::Memtable;

    fn build_table(
        entries: &[(u32, &[u8])],
        sparsity_factor: usize,
    ) -> (MemoryStore, SSTable<MemoryStore>) {
        let mut mt = Memtable::new();
        for (k, v) in entries {
            mt.put(Key::U32(*k), v.to_vec());
        }
        let mut store = MemoryStore::new();
        let (location, artifacts) = mt.dump(&mut store, 0, 0.01, sparsity_factor).unwrap();
        let table = SSTable::new(
            artifacts.bloom,
            artifacts.sparse_index,
            location,
            artifacts.payload_length,
        );
        (store, table)
    }

    #[test]
    fn finds_present_key() {
        let entries: Vec<(u32, &[u8])> = (0..20).map(|i| (i, b"v".as_slice())).collect();
        let (store, table) = build_table(&entries, 3);
        for i in 0..20u32 {
            let result = table.find(&store, &Key::U32(i)).unwrap();
            assert_eq!(result, FindResult::Found(b"v".to_vec()));
        }
    }

    #[test]
    fn reports_tombstone_for_deleted_key() {
        let mut mt = Memtable::new();
        mt.put(Key::U32(1), b"a".to_vec());
        mt.delete(Key::U32(2));
        mt.put(Key::U32(3), b"c".to_vec());

        let mut store = MemoryStore::new();
        let (location, artifacts) = mt.dump(&mut store, 0, 0.01, 1).unwrap();
        let table = SSTable::new(
            artifacts.bloom,
            artifacts.sparse_index,
            location,
            artifacts.payload_length,
        );

        assert_eq!(
            table.find(&store, &Key::U32(2)).unwrap(),
            FindResult::Tombstoned
        );
        assert_eq!(
            table.find(&store, &Key::U32(1)).unwrap(),
            FindResult::Found(b"a".to_vec())
        );
    }

    #[test]
    fn absent_key_not_in_bloom_is_not_found() {
        let entries: Vec<(u32, &[u8])> = vec![(1, b"a"), (2, b"b")];
        let (store, table) = build_table(&entries, 1);
        assert_eq!(
            table.find(&store, &Key::U32(9999)).unwrap(),
            FindResult::NotFound
        );
    }

    #[test]
    fn key_smaller_than_all_samples_is_not_found() {
        let entries: Vec<(u32, &[u8])> = (10..30).map(|i| (i, b"v".as_slice())).collect();
        let (store, table) = build_table(&entries, 5);
        // key 0 would pass bloom.contains only if it happens to collide;
        // use floor-miss logic directly by picking a key definitely
        // smaller than the first sample and not inserted.
        let result = table.find(&store, &Key::U32(0)).unwrap();
        assert_eq!(result, FindResult::NotFound);
    }
}
