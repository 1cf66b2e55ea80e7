// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Build driver: scan documents, accumulate keys, flush runs, merge.
//!
//! ```text
//! source ──▶ accumulator ──flush──▶ runs ──passes──▶ runs' ──final──▶ dictionary
//! ```
//!
//! The driver owns the [`BuildContext`] and threads it through the
//! flush and merge paths; all counters end up in [`BuildStats`]. A
//! build is all-or-nothing, and run files left behind by a failed
//! build are the caller's to clean up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::accumulator::KeyAccumulator;
use crate::dictionary::{write_snapshot, DictionaryStore, KeyDictionary, MemoryStore};
use crate::error::BuildError;
use crate::merge::{merge_runs, BuildContext, MergeLimits};
use crate::types::{BuildStats, DocId, MAX_KEY_BYTES};

mod manifest;

pub use manifest::{KeyManifest, ManifestSource, MANIFEST_VERSION};

/// Default accumulator flush threshold, in approximate resident bytes.
pub const DEFAULT_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

/// Tunables for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Accumulator flush threshold in approximate resident bytes.
    pub memory_limit: usize,
    /// Merge fan-in and group byte caps.
    pub limits: MergeLimits,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            memory_limit: DEFAULT_MEMORY_LIMIT,
            limits: MergeLimits::default(),
        }
    }
}

/// Supplies document keys in increasing DocId order.
///
/// Document metadata is owned elsewhere; the build only ever asks for
/// the key of each document, once, from 1 to `doc_count`.
pub trait DocumentSource {
    /// Total documents. DocIds run 1..=count.
    fn doc_count(&self) -> u32;

    /// Key for `id`.
    fn document_key(&mut self, id: DocId) -> io::Result<Vec<u8>>;
}

/// Build the dictionary for every document in `source`, streaming
/// final entries into `dictionary`.
///
/// Temporary runs live under `run_dir` (created if missing). After a
/// successful build no run file remains; after a failed one, whatever
/// was on disk stays there.
pub fn build_dictionary<D, S>(
    source: &mut D,
    dictionary: &mut KeyDictionary<S>,
    run_dir: &Path,
    options: BuildOptions,
) -> Result<BuildStats, BuildError>
where
    D: DocumentSource + ?Sized,
    S: DictionaryStore,
{
    fs::create_dir_all(run_dir).map_err(|source| BuildError::RunWrite {
        path: run_dir.to_path_buf(),
        source,
    })?;

    let mut ctx = BuildContext::new(run_dir.to_path_buf());
    let mut acc = KeyAccumulator::new();
    let mut stats = BuildStats::default();
    let entries_before = dictionary.entries();

    let count = source.doc_count();
    for raw in 1..=count {
        let id = DocId(raw);
        let key = source
            .document_key(id)
            .map_err(|source| BuildError::Source { id, source })?;
        if key.is_empty() || key.len() > MAX_KEY_BYTES {
            return Err(BuildError::InvalidKey { id, len: key.len() });
        }
        if acc.insert(&key, id).is_some() {
            ctx.duplicate_keys += 1;
        }
        stats.documents += 1;
        if acc.approx_bytes() >= options.memory_limit {
            flush_run(&mut ctx, &mut acc)?;
        }
    }
    if !acc.is_empty() {
        flush_run(&mut ctx, &mut acc)?;
    }
    stats.runs_written = ctx.run_count() as u32;

    merge_runs(&mut ctx, options.limits, dictionary)?;

    stats.duplicate_keys = ctx.duplicate_keys;
    stats.merge_passes = ctx.merge_passes;
    stats.intermediate_merges = ctx.intermediate_merges;
    stats.entries = dictionary.entries() - entries_before;
    Ok(stats)
}

/// Build into a fresh in-memory store.
pub fn build_into_memory<D>(
    source: &mut D,
    run_dir: &Path,
    options: BuildOptions,
) -> Result<(MemoryStore, BuildStats), BuildError>
where
    D: DocumentSource + ?Sized,
{
    let mut dictionary = KeyDictionary::new(MemoryStore::new());
    let stats = build_dictionary(source, &mut dictionary, run_dir, options)?;
    Ok((dictionary.into_store(), stats))
}

/// Drain the accumulator into the next numbered run.
fn flush_run(ctx: &mut BuildContext, acc: &mut KeyAccumulator) -> Result<(), BuildError> {
    if acc.is_empty() {
        return Ok(());
    }
    let (number, mut writer) = ctx.create_run()?;
    let path = ctx.run_file_path(number);
    for (key, id) in acc.drain_sorted() {
        writer
            .write_record(id, &key)
            .map_err(|source| BuildError::RunWrite {
                path: path.clone(),
                source,
            })?;
    }
    let bytes = writer.finish().map_err(|source| BuildError::RunWrite {
        path: path.clone(),
        source,
    })?;
    ctx.register_run(number, bytes);
    Ok(())
}

/// CLI entry: read a key manifest, build, snapshot the dictionary to
/// `output`. Runs live in `run_dir` (default `<output>.runs`) until
/// the merge consumes them; the directory itself is removed once it is
/// empty.
pub fn build_from_manifest(
    input: &str,
    output: &str,
    run_dir: Option<&Path>,
    options: BuildOptions,
) -> Result<BuildStats, String> {
    let manifest = KeyManifest::from_file(Path::new(input))
        .map_err(|e| format!("failed to read manifest {input}: {e}"))?;
    let mut source = manifest.into_source();

    let run_dir = match run_dir {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(format!("{output}.runs")),
    };
    let (store, stats) = build_into_memory(&mut source, &run_dir, options)
        .map_err(|e| format!("build failed: {e}"))?;

    write_snapshot(&store, Path::new(output))
        .map_err(|e| format!("failed to write {output}: {e}"))?;
    let _ = fs::remove_dir(&run_dir);
    Ok(stats)
}
