// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! In-memory sorted accumulator for (key, DocId) pairs.
//!
//! Keys arrive in scan order and leave in strictly ascending byte
//! order, which is what makes every flushed run sorted for free. The
//! accumulator also reports an approximate resident size so the build
//! driver can bound memory between flushes without asking the
//! allocator.

use std::collections::BTreeMap;
use std::mem;

use crate::types::DocId;

/// Fixed overhead charged per entry on top of the key bytes. Covers
/// the tree node, the boxed-slice header and the stored DocId.
const ENTRY_OVERHEAD: usize = 48;

/// Sorted key -> DocId map with insert-returns-previous semantics.
///
/// One accumulator "generation" is the set of entries between two
/// flushes; [`drain_sorted`](KeyAccumulator::drain_sorted) ends a
/// generation and leaves the accumulator empty for the next one.
#[derive(Debug, Default)]
pub struct KeyAccumulator {
    entries: BTreeMap<Box<[u8]>, DocId>,
    key_bytes: usize,
}

impl KeyAccumulator {
    pub fn new() -> Self {
        KeyAccumulator {
            entries: BTreeMap::new(),
            key_bytes: 0,
        }
    }

    /// Insert a key, returning the previously stored DocId if the key
    /// was already present. Re-insertion replaces the value in place,
    /// so within one generation the later document wins.
    pub fn insert(&mut self, key: &[u8], id: DocId) -> Option<DocId> {
        if let Some(slot) = self.entries.get_mut(key) {
            let previous = *slot;
            *slot = id;
            return Some(previous);
        }
        self.key_bytes += key.len();
        self.entries.insert(key.into(), id);
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Approximate resident bytes: key bytes plus a fixed per-entry
    /// overhead. An estimate, not an allocator measurement; it only
    /// has to be monotone in the real footprint.
    pub fn approx_bytes(&self) -> usize {
        self.key_bytes + self.entries.len() * ENTRY_OVERHEAD
    }

    /// Visit entries in strictly ascending key order without draining.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], DocId)> {
        self.entries.iter().map(|(key, &id)| (key.as_ref(), id))
    }

    /// Drain all entries in ascending key order, leaving the
    /// accumulator empty for the next generation.
    pub fn drain_sorted(&mut self) -> impl Iterator<Item = (Box<[u8]>, DocId)> {
        self.key_bytes = 0;
        mem::take(&mut self.entries).into_iter()
    }
}
