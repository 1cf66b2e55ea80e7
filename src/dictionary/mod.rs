// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Persistent dictionary seam: the store trait, the varint value
//! adapter, and point lookups.
//!
//! The store underneath is a generic key/value dictionary, assumed
//! correct and durable. Everything DocId-shaped stays on this side of
//! the boundary: values cross it as minimal varints and come back the
//! same way. [`MemoryStore`] is the reference store; a finished store
//! can be persisted with [`write_snapshot`] and served again after
//! [`read_snapshot`].

use std::io;

use crate::error::LookupError;
use crate::merge::MergeSink;
use crate::types::DocId;
use crate::varint::{decode_varint, encode_varint};

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{
    read_snapshot, write_snapshot, SnapshotInfo, END_MAGIC, MAGIC, MAX_SNAPSHOT_ENTRIES,
    MAX_VALUE_BYTES, VERSION,
};

/// Generic persistent key/value store receiving final entries and
/// serving point lookups.
pub trait DictionaryStore {
    /// Add one entry. The final merge sends keys deduplicated and in
    /// ascending order; stores may rely on neither.
    fn add_entry(&mut self, key: &[u8], value: &[u8]) -> io::Result<()>;

    /// Raw value bytes for `key`, `None` if absent.
    fn lookup(&self, key: &[u8]) -> io::Result<Option<Vec<u8>>>;
}

/// Varint adapter over a store: DocIds in, DocIds out.
///
/// The write half receives the final merge; the read half is the
/// public point-lookup surface. Both speak DocId and leave byte-level
/// value handling here.
#[derive(Debug, Default)]
pub struct KeyDictionary<S> {
    store: S,
    scratch: Vec<u8>,
    entries: u64,
}

impl<S: DictionaryStore> KeyDictionary<S> {
    pub fn new(store: S) -> Self {
        KeyDictionary {
            store,
            scratch: Vec::new(),
            entries: 0,
        }
    }

    /// Entries added through this adapter.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Add a final, deduplicated key with its varint-encoded DocId.
    pub fn insert(&mut self, key: &[u8], id: DocId) -> io::Result<()> {
        self.scratch.clear();
        encode_varint(u64::from(id.get()), &mut self.scratch);
        self.store.add_entry(key, &self.scratch)?;
        self.entries += 1;
        Ok(())
    }

    /// Point lookup. `Ok(None)` is an expected miss, not an error.
    ///
    /// An empty key never reaches the store; a value that does not
    /// decode as exactly one in-range varint is a store failure.
    pub fn lookup(&self, key: &[u8]) -> Result<Option<DocId>, LookupError> {
        if key.is_empty() {
            return Err(LookupError::InvalidKey);
        }
        let value = self
            .store
            .lookup(key)
            .map_err(|source| LookupError::Store { source })?;
        let Some(value) = value else {
            return Ok(None);
        };
        let (raw, consumed) =
            decode_varint(&value).map_err(|source| LookupError::Store { source })?;
        if consumed != value.len() {
            return Err(LookupError::Store {
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "dictionary value has {} trailing bytes after the doc id",
                        value.len() - consumed
                    ),
                ),
            });
        }
        if raw > u64::from(u32::MAX) {
            return Err(LookupError::Store {
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("stored doc id {raw} exceeds the u32 range"),
                ),
            });
        }
        Ok(Some(DocId(raw as u32)))
    }
}

impl<S: DictionaryStore> MergeSink for KeyDictionary<S> {
    fn push(&mut self, id: DocId, key: &[u8]) -> io::Result<()> {
        self.insert(key, id)
    }
}
