// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Build and lookup error types.
//!
//! A build is all-or-nothing: every variant of [`BuildError`] aborts the
//! whole run, nothing is retried, and temporary run files that were
//! already on disk stay there for the caller to remove. Duplicate keys
//! are deliberately absent from this taxonomy; they are counted in
//! [`BuildStats`](crate::types::BuildStats) and the build proceeds.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::types::{DocId, MAX_KEY_BYTES};

/// Fatal errors aborting a dictionary build.
#[derive(Debug)]
pub enum BuildError {
    /// Creating or appending a run file (or its directory) failed.
    RunWrite { path: PathBuf, source: io::Error },
    /// Reading a run back failed. Covers both plain I/O errors and a
    /// corrupt record stream; a clean end of file is not an error.
    RunRead { path: PathBuf, source: io::Error },
    /// Run-file management (rename, delete) failed during a merge.
    Merge { detail: String, source: io::Error },
    /// A merge pass finished without reducing the live run count.
    /// Indicates an internal inconsistency, not an I/O problem.
    NotConverging { runs: usize },
    /// The persistent dictionary rejected an entry.
    DictionaryAdd { source: io::Error },
    /// The document source failed to produce a key.
    Source { id: DocId, source: io::Error },
    /// A document key was empty or longer than [`MAX_KEY_BYTES`].
    InvalidKey { id: DocId, len: usize },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::RunWrite { path, source } => {
                write!(f, "run write failed at {}: {}", path.display(), source)
            }
            BuildError::RunRead { path, source } => {
                write!(f, "run read failed at {}: {}", path.display(), source)
            }
            BuildError::Merge { detail, source } => {
                write!(f, "merge failed ({detail}): {source}")
            }
            BuildError::NotConverging { runs } => {
                write!(f, "merge pass left {runs} runs without reducing the count")
            }
            BuildError::DictionaryAdd { source } => {
                write!(f, "dictionary add failed: {source}")
            }
            BuildError::Source { id, source } => {
                write!(f, "document source failed for doc {id}: {source}")
            }
            BuildError::InvalidKey { id, len } => {
                write!(
                    f,
                    "invalid key for doc {id}: length {len} outside 1..={MAX_KEY_BYTES}"
                )
            }
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BuildError::RunWrite { source, .. }
            | BuildError::RunRead { source, .. }
            | BuildError::Merge { source, .. }
            | BuildError::DictionaryAdd { source }
            | BuildError::Source { source, .. } => Some(source),
            BuildError::NotConverging { .. } | BuildError::InvalidKey { .. } => None,
        }
    }
}

/// Errors from point lookups.
///
/// A missing key is `Ok(None)`, never an error; this type covers the
/// cases where the question itself was malformed or the store could
/// not answer it.
#[derive(Debug)]
pub enum LookupError {
    /// The queried key was empty.
    InvalidKey,
    /// The underlying store failed, or a stored value failed to decode.
    Store { source: io::Error },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidKey => write!(f, "lookup key is empty"),
            LookupError::Store { source } => write!(f, "dictionary lookup failed: {source}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LookupError::InvalidKey => None,
            LookupError::Store { source } => Some(source),
        }
    }
}
