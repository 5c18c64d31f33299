//! # Memtable Module
//!
//! A thin facade over [`OrderedTree`] that additionally knows how to dump
//! itself into the wire format an [`crate::sstable::SSTable`] reads back,
//! and how to reconstruct itself from bytes already read into memory
//! (used by tests exercising the dump/load round trip).
//!
//! ## Dump wire format
//!
//! ```text
//! [count: u32 BE]
//! repeated `count` times, in ascending key order:
//!   [key: Key::to_bytes()][value_len: u32 BE][value bytes]
//! ```
//!
//! Dumping also populates a [`BloomFilter`] (one [`BloomFilter::insert`]
//! per entry) and a sparse index (`crate::tree::OrderedTree<u32>` mapping
//! every `sparsity_factor`-th key to its byte offset within the payload),
//! both returned to the caller so they can be attached to the new
//! SSTable. The memtable's own tree is only cleared once the sink write
//! has succeeded — a flush failure must leave the memtable unchanged so
//! a caller can retry it.

use thiserror::Error;
use tracing::trace;

use crate::bloom::BloomFilter;
use crate::codec;
use crate::collab::{ByteSink, CollaboratorError};
use crate::key::{Key, KeyError};
use crate::tree::OrderedTree;

/// The sentinel value written in place of a deleted entry's bytes. Never
/// a legal user value.
pub const TOMBSTONE: &[u8] = &[0x7f];

/// Errors arising from memtable operations.
#[derive(Debug, Error)]
pub enum MemtableError {
    #[error("failed parsing key during load: {0}")]
    Key(#[from] KeyError),

    #[error("failed decoding length prefix during load: {0}")]
    Codec(#[from] codec::CodecError),

    #[error("buffer ended mid-record during load")]
    ShortRead,

    #[error(transparent)]
    Sink(#[from] CollaboratorError),
}

/// The outcome of a memtable lookup, distinguishing "not present" from
/// "present but tombstoned" so callers (the engine's newest-wins scan)
/// can stop searching lower layers on a tombstone hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetResult {
    Value(Vec<u8>),
    Tombstone,
    Absent,
}

/// The output of [`Memtable::dump`]: a populated Bloom filter and sparse
/// index ready to attach to a new SSTable.
pub struct DumpArtifacts {
    pub bloom: BloomFilter,
    pub sparse_index: OrderedTree<u32>,
    pub entry_count: usize,
    pub payload_length: u32,
}

/// An in-memory ordered key-value store, backing the engine's
/// most-recently-written layer.
pub struct Memtable {
    tree: OrderedTree<Vec<u8>>,
}

impl Default for Memtable {
    fn default() -> Self {
        Self::new()
    }
}

impl Memtable {
    pub fn new() -> Self {
        Memtable {
            tree: OrderedTree::new(),
        }
    }

    /// Inserts or overwrites `key`'s value.
    pub fn put(&mut self, key: Key, value: Vec<u8>) {
        trace!(?key, "memtable put");
        self.tree.put(key, value);
    }

    /// Looks up `key`, distinguishing a tombstone from true absence.
    pub fn get(&self, key: &Key) -> GetResult {
        match self.tree.get(key) {
            Some(v) if v.as_slice() == TOMBSTONE => GetResult::Tombstone,
            Some(v) => GetResult::Value(v.clone()),
            None => GetResult::Absent,
        }
    }

    /// Marks `key` as deleted by writing a tombstone entry.
    pub fn delete(&mut self, key: Key) {
        trace!(?key, "memtable delete (tombstone)");
        self.tree.put(key, TOMBSTONE.to_vec());
    }

    /// Number of entries, including tombstones.
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// All entries in ascending key order, including tombstones.
    pub fn enumerate(&self) -> Vec<(&Key, &Vec<u8>)> {
        self.tree.enumerate()
    }

    pub fn floor(&self, key: &Key) -> Option<&Vec<u8>> {
        self.tree.floor(key)
    }

    pub fn ceil(&self, key: &Key) -> Option<&Vec<u8>> {
        self.tree.ceil(key)
    }

    /// Serializes every entry into `sink` under `sequence`, building a
    /// Bloom filter and sparse index (every `sparsity_factor`-th entry,
    /// or no sparse entries at all when `sparsity_factor == 0`) as it
    /// goes. The tree is cleared only after `sink` accepts the write —
    /// a failed flush leaves the memtable untouched so the caller can
    /// retry.
    ///
    /// `bloom_false_positive_rate` sizes the returned filter for exactly
    /// this dump's entry count.
    pub fn dump<S: ByteSink>(
        &mut self,
        sink: &mut S,
        sequence: u64,
        bloom_false_positive_rate: f64,
        sparsity_factor: usize,
    ) -> Result<(S::Location, DumpArtifacts), MemtableError> {
        let entries = self.tree.enumerate();
        let entry_count = entries.len();

        let mut bloom = BloomFilter::new(entry_count.max(1) as u32, bloom_false_positive_rate)
            .expect("sizing parameters already validated at engine construction");
        let mut sparse_index = OrderedTree::new();

        let mut payload = Vec::new();
        codec::write_u32_be(&mut payload, entry_count as u32);

        for (i, (key, value)) in entries.iter().enumerate() {
            let offset = payload.len() as u32;
            bloom.insert(key);
            if sparsity_factor > 0 && i % sparsity_factor == 0 {
                sparse_index.put((*key).clone(), offset);
            }

            payload.extend_from_slice(&key.to_bytes());
            codec::write_u32_be(&mut payload, value.len() as u32);
            payload.extend_from_slice(value);
        }

        let payload_length = payload.len() as u32;
        let location = sink.store(sequence, &payload)?;
        self.tree.clear();

        trace!(entry_count, sequence, "memtable dumped");

        Ok((
            location,
            DumpArtifacts {
                bloom,
                sparse_index,
                entry_count,
                payload_length,
            },
        ))
    }

    /// Reconstructs a memtable from a buffer previously produced by
    /// [`Memtable::dump`]'s payload encoding (used by tests exercising
    /// the wire format directly rather than through a collaborator).
    pub fn load(buf: &[u8]) -> Result<Self, MemtableError> {
        let (count, mut offset) = codec::read_u32_be(buf)?;
        let mut tree = OrderedTree::new();

        for _ in 0..count {
            let (key, key_len) = Key::parse(&buf[offset..])?;
            offset += key_len;

            let (value_len, n) = codec::read_u32_be(&buf[offset..])?;
            offset += n;

            let value_len = value_len as usize;
            if buf.len() < offset + value_len {
                return Err(MemtableError::ShortRead);
            }
            let value = buf[offset..offset + value_len].to_vec();
            offset += value_len;

            tree.put(key, value);
        }

        Ok(Memtable { tree })
    }
}
