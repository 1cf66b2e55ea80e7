// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! In-memory reference store.

use std::collections::BTreeMap;
use std::io;

use super::DictionaryStore;

/// BTreeMap-backed store: the build target for tests and the loaded
/// form of a snapshot file. Lookups never fail; adds never fail.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Box<[u8]>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_ref(), value.as_slice()))
    }
}

impl DictionaryStore for MemoryStore {
    fn add_entry(&mut self, key: &[u8], value: &[u8]) -> io::Result<()> {
        self.entries.insert(key.into(), value.to_vec());
        Ok(())
    }

    fn lookup(&self, key: &[u8]) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }
}
