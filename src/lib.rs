// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! External-merge construction of document-key dictionaries.
//!
//! Maps externally supplied document keys (opaque byte strings, not
//! guaranteed unique) to the dense internal DocIds an index engine
//! uses. Keys accumulate in a bounded in-memory sorted map, spill to
//! sorted disk runs, and a width-bounded multi-pass k-way merge folds
//! the runs into a persistent dictionary, collapsing duplicate keys
//! along the way.
//!
//! ```text
//! ┌─────────────┐  flush   ┌─────────────┐  passes   ┌────────────┐
//! │ accumulator │─────────▶│ sorted runs │──────────▶│ dictionary │
//! └─────────────┘          └─────────────┘  + final  └────────────┘
//! ```
//!
//! The whole build is a synchronous, single-threaded batch step: one
//! call, all-or-nothing. Lookups run against the finished dictionary
//! for the life of the index.
//!
//! # Usage
//!
//! ```ignore
//! use keydex::{build_into_memory, BuildOptions, KeyDictionary};
//!
//! let (store, stats) = build_into_memory(&mut source, run_dir, BuildOptions::default())?;
//! let dictionary = KeyDictionary::new(store);
//! let id = dictionary.lookup(b"omim-104300")?;
//! ```

pub mod accumulator;
pub mod build;
pub mod dictionary;
pub mod error;
pub mod merge;
pub mod run;
pub mod testing;
pub mod types;
pub mod varint;

// Re-exports for the public API
pub use accumulator::KeyAccumulator;
pub use build::{
    build_dictionary, build_from_manifest, build_into_memory, BuildOptions, DocumentSource,
    KeyManifest, DEFAULT_MEMORY_LIMIT,
};
pub use dictionary::{
    read_snapshot, write_snapshot, DictionaryStore, KeyDictionary, MemoryStore, SnapshotInfo,
};
pub use error::{BuildError, LookupError};
pub use merge::{
    merge_runs, BuildContext, MergeLimits, MergeSink, RunHandle, DEFAULT_FAN_IN,
    DEFAULT_GROUP_BYTES,
};
pub use run::{run_path, RunReader, RunWriter, RECORD_FLAG};
pub use types::{BuildStats, DocId, MAX_KEY_BYTES};
