//! # lsmcore
//!
//! An embeddable, ordered key-value storage core built on the
//! **log-structured merge-tree (LSM)** pattern: writes land in an
//! in-memory AVL-balanced tree (the memtable); once it reaches a
//! configured size it is flushed into an immutable, Bloom-filtered,
//! sparse-indexed [`SSTable`][sstable::SSTable]. Reads consult the
//! memtable first, then the SSTable stack newest-to-oldest, so the most
//! recent write for a key always wins.
//!
//! ## Scope
//!
//! This crate implements exactly three things well: the ordered store
//! (module [`tree`]), the SSTable binary format with its Bloom filter
//! and sparse index (modules [`bloom`], [`sstable`]), and the
//! read/write/flush protocol tying them together (module [`engine`]).
//! It deliberately does **not** implement a write-ahead log, crash
//! recovery, cross-table compaction, concurrent access, range scans, or
//! on-disk file discovery — those are the responsibility of whatever
//! embeds this crate. The core only asks its caller for two things: a
//! place to write a flushed payload ([`collab::ByteSink`]) and a way to
//! read back a byte range of one ([`collab::ByteRangeReader`]). A
//! ready-to-use in-memory implementation of both lives in [`memory`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`key`] | Polymorphic, self-describing comparable keys with double-hashing |
//! | [`codec`] | Fixed-width big-endian `u32` encoding |
//! | [`tree`] | AVL-balanced ordered map, shared by the memtable and sparse index |
//! | [`bloom`] | Packed-bitset Bloom filter sized from capacity and false-positive rate |
//! | [`memtable`] | Write-absorbing tree facade with dump/load to the SSTable wire format |
//! | [`sstable`] | Immutable flushed run: in-memory Bloom filter + sparse index over an external payload |
//! | [`collab`] | `ByteSink` / `ByteRangeReader` traits the engine is generic over |
//! | [`memory`] | Reference in-memory collaborator implementation |
//! | [`engine`] | `put`/`get`/`delete`, flush policy, newest-wins read path |
//!
//! ## Quick start
//!
//! ```rust
//! use lsmcore::engine::{Engine, EngineConfig};
//! use lsmcore::key::Key;
//! use lsmcore::memory::MemoryStore;
//!
//! let mut engine = Engine::new(
//!     MemoryStore::new(),
//!     EngineConfig {
//!         threshold: 100,
//!         sparsity_factor: 4,
//!         false_positive_rate: 0.01,
//!     },
//! )
//! .unwrap();
//!
//! engine.put(Key::Str("hello".into()), b"world".to_vec()).unwrap();
//! engine.delete(Key::Str("hello".into())).unwrap();
//! ```

pub mod bloom;
pub mod codec;
pub mod collab;
pub mod engine;
pub mod key;
pub mod memory;
pub mod memtable;
pub mod sstable;
pub mod tree;
