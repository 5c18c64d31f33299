//! # Engine Module
//!
//! Ties the memtable and SSTable stack together behind `put`/`get`/
//! `delete`, implementing the flush-before-insert policy and the
//! newest-wins read path that make this an LSM engine rather than just
//! an ordered tree.

use thiserror::Error;
use tracing::{error, info, trace};

use crate::bloom::BloomError;
use crate::collab::{ByteRangeReader, CollaboratorError};
use crate::key::Key;
use crate::memtable::{GetResult as MemtableGetResult, Memtable, MemtableError, TOMBSTONE};
use crate::sstable::{FindResult, SSTable, SSTableError};

/// Errors arising from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine configuration invalid: {0}")]
    Config(#[from] BloomError),

    #[error("threshold must be positive")]
    InvalidThreshold,

    #[error("sparsity_factor must be positive")]
    InvalidSparsityFactor,

    #[error("value equals the reserved tombstone sentinel")]
    ValueIsTombstoneSentinel,

    #[error(transparent)]
    Memtable(#[from] MemtableError),

    #[error(transparent)]
    SSTable(#[from] SSTableError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Tunable parameters for an [`Engine`] instance.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Memtable entry count at which a flush is triggered before the
    /// next insert.
    pub threshold: u32,
    /// Every `sparsity_factor`-th entry (by ascending key order) is
    /// recorded in a flushed table's sparse index.
    pub sparsity_factor: u32,
    /// Target false-positive rate for each flushed table's Bloom
    /// filter.
    pub false_positive_rate: f64,
}

/// The outcome of [`Engine::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetResult {
    Found(Vec<u8>),
    Absent,
}

/// The embeddable LSM engine: a memtable plus a stack of immutable
/// SSTables, generic over the collaborator `C` supplying durable storage
/// and range reads.
pub struct Engine<C: ByteRangeReader> {
    memtable: Memtable,
    tables: Vec<SSTable<C>>,
    collaborator: C,
    config: EngineConfig,
    next_sequence: u64,
}

impl<C: ByteRangeReader> Engine<C> {
    /// Builds a new, empty engine.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidThreshold`] /
    /// [`EngineError::InvalidSparsityFactor`] if either is zero, or
    /// [`EngineError::Config`] if `false_positive_rate` is outside
    /// `(0, 1)` (validated lazily, at the first flush, by attempting the
    /// smallest legal `BloomFilter` construction).
    pub fn new(collaborator: C, config: EngineConfig) -> Result<Self, EngineError> {
        if config.threshold == 0 {
            return Err(EngineError::InvalidThreshold);
        }
        if config.sparsity_factor == 0 {
            return Err(EngineError::InvalidSparsityFactor);
        }
        // Fail fast on a bad false-positive rate rather than waiting for
        // the first flush to discover it.
        crate::bloom::BloomFilter::new(1, config.false_positive_rate)?;

        Ok(Engine {
            memtable: Memtable::new(),
            tables: Vec::new(),
            collaborator,
            config,
            next_sequence: 0,
        })
    }

    /// Number of entries currently buffered in the memtable.
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Number of immutable SSTables flushed so far.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Inserts or overwrites `key`'s value, flushing the memtable first
    /// if it has reached `threshold`.
    ///
    /// # Errors
    /// Rejects a `value` equal to the reserved tombstone sentinel. On a
    /// flush error, the memtable is left unchanged so the caller may
    /// retry.
    pub fn put(&mut self, key: Key, value: Vec<u8>) -> Result<(), EngineError> {
        if value == TOMBSTONE {
            return Err(EngineError::ValueIsTombstoneSentinel);
        }

        self.maybe_flush()?;
        trace!(?key, "engine put");
        self.memtable.put(key, value);
        Ok(())
    }

    /// Marks `key` as deleted.
    ///
    /// The flush-before-insert policy applies identically to deletes: a
    /// tombstone write that fills the memtable still triggers a flush
    /// first.
    pub fn delete(&mut self, key: Key) -> Result<(), EngineError> {
        self.maybe_flush()?;
        trace!(?key, "engine delete");
        self.memtable.delete(key);
        Ok(())
    }

    /// Looks up `key`, consulting the memtable then the SSTable stack
    /// newest-to-oldest. A tombstone hit at any layer shadows all older
    /// layers.
    pub fn get(&self, key: &Key) -> Result<GetResult, EngineError> {
        match self.memtable.get(key) {
            MemtableGetResult::Value(v) => return Ok(GetResult::Found(v)),
            MemtableGetResult::Tombstone => return Ok(GetResult::Absent),
            MemtableGetResult::Absent => {}
        }

        for table in self.tables.iter().rev() {
            match table.find(&self.collaborator, key) {
                Ok(FindResult::Found(v)) => return Ok(GetResult::Found(v)),
                Ok(FindResult::Tombstoned) => return Ok(GetResult::Absent),
                Ok(FindResult::NotFound) => continue,
                Err(e) => {
                    error!(?key, error = %e, "sstable find failed");
                    return Err(e.into());
                }
            }
        }

        Ok(GetResult::Absent)
    }

    /// Flushes the memtable into a new SSTable if it has reached
    /// `threshold`, leaving the memtable untouched on failure.
    fn maybe_flush(&mut self) -> Result<(), EngineError> {
        if self.memtable.size() < self.config.threshold as usize {
            return Ok(());
        }

        let sequence = self.next_sequence;
        let (location, artifacts) = self.memtable.dump(
            &mut self.collaborator,
            sequence,
            self.config.false_positive_rate,
            self.config.sparsity_factor as usize,
        )?;

        self.next_sequence += 1;
        info!(
            sequence,
            entry_count = artifacts.entry_count,
            table_count = self.tables.len() + 1,
            "flushed memtable to sstable"
        );

        self.tables.push(SSTable::new(
            artifacts.bloom,
            artifacts.sparse_index,
            location,
            artifacts.payload_length,
        ));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn engine(threshold: u32, sparsity_factor: u32) -> Engine<MemoryStore> {
        Engine::new(
            MemoryStore::new(),
            EngineConfig {
                threshold,
                sparsity_factor,
                false_positive_rate: 0.01,
            },
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_threshold_or_sparsity_factor() {
        assert!(matches!(
            Engine::new(
                MemoryStore::new(),
                EngineConfig {
                    threshold: 0,
                    sparsity_factor: 1,
                    false_positive_rate: 0.01,
                },
            ),
            Err(EngineError::InvalidThreshold)
        ));
        assert!(matches!(
            Engine::new(
                MemoryStore::new(),
                EngineConfig {
                    threshold: 1,
                    sparsity_factor: 0,
                    false_positive_rate: 0.01,
                },
            ),
            Err(EngineError::InvalidSparsityFactor)
        ));
    }

    #[test]
    fn put_rejects_tombstone_sentinel_value() {
        let mut e = engine(10, 2);
        let err = e.put(Key::U32(1), vec![0x7f]).unwrap_err();
        assert!(matches!(err, EngineError::ValueIsTombstoneSentinel));
    }

    /// S1: put/get/delete a single key within one memtable.
    #[test]
    fn s1_put_get_delete_single_key() {
        let mut e = engine(10, 2);
        e.put(Key::Str("foo".into()), b"bar".to_vec()).unwrap();
        assert_eq!(
            e.get(&Key::Str("foo".into())).unwrap(),
            GetResult::Found(b"bar".to_vec())
        );
        e.delete(Key::Str("foo".into())).unwrap();
        assert_eq!(e.get(&Key::Str("foo".into())).unwrap(), GetResult::Absent);
    }

    /// S2: repeated puts to the same key within one memtable keep only
    /// the latest value.
    #[test]
    fn s2_latest_wins_within_one_memtable() {
        let mut e = engine(1000, 2);
        for i in 1..=50u32 {
            e.put(Key::Str("K".into()), format!("v_{i}").into_bytes())
                .unwrap();
        }
        assert_eq!(
            e.get(&Key::Str("K".into())).unwrap(),
            GetResult::Found(b"v_50".to_vec())
        );
    }

    /// S3: latest wins across multiple flushes.
    #[test]
    fn s3_latest_wins_across_flushes() {
        let mut e = engine(10, 2);
        for i in 0..100u32 {
            e.put(Key::Str(format!("key-{i}")), b"x".to_vec()).unwrap();
            if i % 10 == 4 {
                e.put(
                    Key::Str("test-key".into()),
                    format!("updated-value-{i}").into_bytes(),
                )
                .unwrap();
            }
        }
        assert_eq!(
            e.get(&Key::Str("test-key".into())).unwrap(),
            GetResult::Found(b"updated-value-94".to_vec())
        );
        assert!(e.table_count() > 0);
    }

    /// S5: mixed delete and survive across flushes.
    #[test]
    fn s5_mixed_delete_and_survive() {
        let mut e = engine(5, 3);
        for i in 0..20u32 {
            e.put(Key::U32(i), format!("v{i}").into_bytes()).unwrap();
        }
        for i in 0..10u32 {
            e.delete(Key::U32(i)).unwrap();
        }
        for i in 0..20u32 {
            let result = e.get(&Key::U32(i)).unwrap();
            if i < 10 {
                assert_eq!(result, GetResult::Absent, "key {i} should be deleted");
            } else {
                assert_eq!(
                    result,
                    GetResult::Found(format!("v{i}").into_bytes()),
                    "key {i} should survive"
                );
            }
        }
    }

    #[test]
    fn flush_keeps_each_table_at_exactly_threshold_entries() {
        let mut e = engine(10, 2);
        for i in 0..10u32 {
            e.put(Key::U32(i), b"v".to_vec()).unwrap();
        }
        // the 11th put triggers a flush of the prior 10 entries first
        e.put(Key::U32(10), b"v".to_vec()).unwrap();
        assert_eq!(e.table_count(), 1);
        assert_eq!(e.memtable_size(), 1);
    }
}
