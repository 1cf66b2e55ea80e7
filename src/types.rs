// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Core identifier types and bounds shared across the build pipeline.

use std::fmt;

/// Dense document identifier, 1-based, assigned in scan order.
///
/// Ownership of the numbering lives with the document table; the
/// dictionary only stores the value it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct DocId(pub u32);

impl DocId {
    pub const fn new(id: u32) -> Self {
        DocId(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl From<DocId> for u32 {
    fn from(id: DocId) -> Self {
        id.0
    }
}

/// Maximum document-key length in bytes.
///
/// The run record codec stores key lengths in a u16 field, so longer
/// keys cannot be represented on disk and are rejected at the insert
/// boundary. Empty keys are rejected as well.
pub const MAX_KEY_BYTES: usize = u16::MAX as usize;

/// Counters reported by a completed build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Documents scanned from the source.
    pub documents: u32,
    /// Extra occurrences of already-seen keys. Duplicates are counted,
    /// never treated as errors.
    pub duplicate_keys: u64,
    /// Run files produced by accumulator flushes.
    pub runs_written: u32,
    /// Intermediate merge passes executed. The final merge into the
    /// dictionary is not counted as a pass.
    pub merge_passes: u32,
    /// Individual intermediate merges summed over all passes.
    pub intermediate_merges: u32,
    /// Entries added to the persistent dictionary.
    pub entries: u64,
}
