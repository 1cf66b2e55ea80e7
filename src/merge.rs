// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Width-bounded multi-pass merge of sorted runs.
//!
//! The run list shrinks in passes. Each pass walks the list left to
//! right, closes groups under a fan-in width and a summed byte cap,
//! and k-way merges every group into a shadow file that atomically
//! replaces the group's first run. Once fewer runs remain than the
//! fan-in width, one final merge streams every surviving run straight
//! into the persistent dictionary sink.
//!
//! ```text
//! pass:   [r0 r1 r2 r3] [r4 r5 r6 r7] [r8 r9]   groups under caps
//!            │              │            │
//!            ▼              ▼            ▼
//!           r0'            r4'          r8'      shadows renamed over
//!                                                the first run of each
//! final:  [r0' r4' r8'] ──────▶ dictionary      group
//! ```
//!
//! Equal keys from different runs collapse to a single record; the
//! reader earliest in the group supplies the surviving DocId and every
//! other contributor bumps the duplicate counter. The fan-in width
//! exists to stay under OS file-descriptor limits: a merge step never
//! holds more than `fan_in` input handles plus one output handle.

use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::run::{run_path, RunReader, RunWriter};
use crate::types::DocId;

/// Descriptors left for stdio, the output handle and whatever else the
/// embedding process keeps open.
pub const FD_SAFETY_MARGIN: usize = 15;

/// Default fan-in width for a conservative 256-descriptor ceiling.
pub const DEFAULT_FAN_IN: usize = 256 - FD_SAFETY_MARGIN;

/// Default summed byte cap for one intermediate merge group.
pub const DEFAULT_GROUP_BYTES: u64 = 64 * 1024 * 1024;

/// Caps on one merge group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeLimits {
    /// Maximum runs merged in one step.
    pub fan_in: usize,
    /// Maximum summed input size of an intermediate group, in bytes.
    /// Checked once a group already holds two runs, so an oversized
    /// pair still merges rather than stalling the pass.
    pub group_bytes: u64,
}

impl Default for MergeLimits {
    fn default() -> Self {
        MergeLimits {
            fan_in: DEFAULT_FAN_IN,
            group_bytes: DEFAULT_GROUP_BYTES,
        }
    }
}

impl MergeLimits {
    /// Clamp unusable configurations; a k-way merge needs width >= 2.
    pub fn normalized(self) -> Self {
        MergeLimits {
            fan_in: self.fan_in.max(2),
            group_bytes: self.group_bytes.max(1),
        }
    }
}

/// One live run tracked by the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    /// Number baked into the file name.
    pub number: u32,
    /// File size in bytes, consulted by the group byte cap.
    pub bytes: u64,
}

// ============================================================================
// BUILD CONTEXT
// ============================================================================

/// Mutable build state threaded through the driver and the merge:
/// the run directory, the live-run list in creation order, the
/// monotonic run-number source and the counters the merge updates.
#[derive(Debug)]
pub struct BuildContext {
    dir: PathBuf,
    runs: Vec<RunHandle>,
    next_number: u32,
    /// Extra occurrences of already-seen keys, accumulated by both the
    /// driver (within one accumulator generation) and the merge
    /// (across runs).
    pub duplicate_keys: u64,
    /// Intermediate passes completed.
    pub merge_passes: u32,
    /// Intermediate merges executed across all passes.
    pub intermediate_merges: u32,
}

impl BuildContext {
    pub fn new(dir: PathBuf) -> Self {
        BuildContext {
            dir,
            runs: Vec::new(),
            next_number: 0,
            duplicate_keys: 0,
            merge_passes: 0,
            intermediate_merges: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Live runs in scan order.
    pub fn runs(&self) -> &[RunHandle] {
        &self.runs
    }

    /// Path of the file backing run `number`.
    pub fn run_file_path(&self, number: u32) -> PathBuf {
        run_path(&self.dir, number, false)
    }

    /// Open a writer on the next numbered run file. The number is
    /// consumed immediately, so an aborted write never reuses a name.
    /// Call [`register_run`](BuildContext::register_run) once the
    /// writer has finished.
    pub fn create_run(&mut self) -> Result<(u32, RunWriter), BuildError> {
        let number = self.next_number;
        self.next_number += 1;
        let path = self.run_file_path(number);
        let writer = RunWriter::create(&path)
            .map_err(|source| BuildError::RunWrite { path, source })?;
        Ok((number, writer))
    }

    /// Append a finished run to the live list.
    pub fn register_run(&mut self, number: u32, bytes: u64) {
        self.runs.push(RunHandle { number, bytes });
    }
}

// ============================================================================
// MERGE SINK
// ============================================================================

/// Output seam of the k-way loop. Intermediate merges push into the
/// shadow run; the final merge pushes dictionary entries.
pub trait MergeSink {
    fn push(&mut self, id: DocId, key: &[u8]) -> io::Result<()>;
}

impl MergeSink for RunWriter {
    fn push(&mut self, id: DocId, key: &[u8]) -> io::Result<()> {
        self.write_record(id, key)
    }
}

// ============================================================================
// PASS LOOP
// ============================================================================

/// Reduce the live runs with intermediate passes until fewer than
/// `fan_in` remain, then stream one final merge into `sink` and delete
/// the consumed run files. With an empty run list this is a no-op.
pub fn merge_runs<S: MergeSink + ?Sized>(
    ctx: &mut BuildContext,
    limits: MergeLimits,
    sink: &mut S,
) -> Result<(), BuildError> {
    let limits = limits.normalized();
    while ctx.run_count() >= limits.fan_in {
        let before = ctx.run_count();
        run_pass(ctx, limits)?;
        if ctx.run_count() >= before {
            return Err(BuildError::NotConverging {
                runs: ctx.run_count(),
            });
        }
        ctx.merge_passes += 1;
    }
    final_merge(ctx, sink)
}

/// One left-to-right pass over the run list. Every group of two or
/// more runs merges into a shadow that replaces its first run; a
/// trailing single run carries into the next pass unmerged.
fn run_pass(ctx: &mut BuildContext, limits: MergeLimits) -> Result<(), BuildError> {
    let runs = mem::take(&mut ctx.runs);
    let mut survivors = Vec::with_capacity(runs.len());
    let mut start = 0;
    while start < runs.len() {
        let end = group_end(&runs, start, limits);
        if end - start < 2 {
            survivors.push(runs[start].clone());
        } else {
            survivors.push(merge_group(ctx, &runs[start..end])?);
            ctx.intermediate_merges += 1;
        }
        start = end;
    }
    ctx.runs = survivors;
    Ok(())
}

/// Index one past the last run of the group starting at `start`.
///
/// A group closes on the fan-in width, on the byte cap, or at the end
/// of the list. The byte cap is only consulted once the group holds
/// two runs, so a group is never a singleton while a partner remains.
fn group_end(runs: &[RunHandle], start: usize, limits: MergeLimits) -> usize {
    let mut end = start + 1;
    let mut bytes = runs[start].bytes;
    while end < runs.len() && end - start < limits.fan_in {
        let next = runs[end].bytes;
        if end - start >= 2 && bytes.saturating_add(next) > limits.group_bytes {
            break;
        }
        bytes = bytes.saturating_add(next);
        end += 1;
    }
    end
}

// ============================================================================
// GROUP MERGES
// ============================================================================

/// k-way merge one group into a shadow file, rename the shadow over
/// the group's first run, delete the rest.
fn merge_group(ctx: &mut BuildContext, group: &[RunHandle]) -> Result<RunHandle, BuildError> {
    let target = group[0].number;
    let shadow_path = run_path(ctx.dir(), target, true);
    let mut out = RunWriter::create(&shadow_path).map_err(|source| BuildError::RunWrite {
        path: shadow_path.clone(),
        source,
    })?;

    let mut cursors = open_group(ctx, group)?;
    merge_cursors(&mut cursors, &mut out, &mut ctx.duplicate_keys).map_err(|e| match e {
        StepError::Read { path, source } => BuildError::RunRead { path, source },
        StepError::Sink { source } => BuildError::RunWrite {
            path: shadow_path.clone(),
            source,
        },
    })?;
    let bytes = out.finish().map_err(|source| BuildError::RunWrite {
        path: shadow_path.clone(),
        source,
    })?;

    // Close every input handle before touching its file
    drop(cursors);
    fs::rename(&shadow_path, ctx.run_file_path(target)).map_err(|source| BuildError::Merge {
        detail: format!("rename shadow over run {target}"),
        source,
    })?;
    for handle in &group[1..] {
        fs::remove_file(ctx.run_file_path(handle.number)).map_err(|source| BuildError::Merge {
            detail: format!("delete merged run {}", handle.number),
            source,
        })?;
    }
    Ok(RunHandle {
        number: target,
        bytes,
    })
}

/// Merge every remaining run straight into the dictionary sink, then
/// delete the consumed run files. After success no run file remains.
fn final_merge<S: MergeSink + ?Sized>(
    ctx: &mut BuildContext,
    sink: &mut S,
) -> Result<(), BuildError> {
    if ctx.runs.is_empty() {
        return Ok(());
    }
    let group = mem::take(&mut ctx.runs);
    let mut cursors = open_group(ctx, &group)?;
    merge_cursors(&mut cursors, sink, &mut ctx.duplicate_keys).map_err(|e| match e {
        StepError::Read { path, source } => BuildError::RunRead { path, source },
        StepError::Sink { source } => BuildError::DictionaryAdd { source },
    })?;
    drop(cursors);
    for handle in &group {
        fs::remove_file(ctx.run_file_path(handle.number)).map_err(|source| BuildError::Merge {
            detail: format!("delete merged run {}", handle.number),
            source,
        })?;
    }
    Ok(())
}

fn open_group(ctx: &BuildContext, group: &[RunHandle]) -> Result<Vec<Cursor>, BuildError> {
    let mut cursors = Vec::with_capacity(group.len());
    for handle in group {
        let path = ctx.run_file_path(handle.number);
        let cursor =
            Cursor::open(&path).map_err(|source| BuildError::RunRead { path, source })?;
        cursors.push(cursor);
    }
    Ok(cursors)
}

// ============================================================================
// K-WAY LOOP
// ============================================================================

/// One open reader plus its buffered current record.
struct Cursor {
    reader: RunReader,
    current: Option<(DocId, Vec<u8>)>,
}

impl Cursor {
    fn open(path: &Path) -> io::Result<Self> {
        let mut reader = RunReader::open(path)?;
        let current = reader.read_record()?;
        Ok(Cursor { reader, current })
    }

    fn advance(&mut self) -> io::Result<()> {
        self.current = self.reader.read_record()?;
        Ok(())
    }
}

/// What failed inside the k-way loop. The caller maps this onto the
/// build taxonomy; it alone knows whether the sink was a shadow run or
/// the dictionary.
enum StepError {
    Read { path: PathBuf, source: io::Error },
    Sink { source: io::Error },
}

/// Drain all cursors into `sink` in ascending key order, collapsing
/// equal keys into one record. The earliest cursor holding the minimal
/// key supplies the surviving DocId; every other contributor counts as
/// one duplicate. Contributing cursors all advance, so no key is
/// emitted twice.
fn merge_cursors<S: MergeSink + ?Sized>(
    cursors: &mut [Cursor],
    sink: &mut S,
    duplicates: &mut u64,
) -> Result<(), StepError> {
    let mut min_key: Vec<u8> = Vec::new();
    loop {
        // Smallest buffered key; strict compare keeps the earliest
        // cursor as the survivor on ties
        let mut survivor: Option<DocId> = None;
        min_key.clear();
        for cursor in cursors.iter() {
            if let Some((id, key)) = &cursor.current {
                if survivor.is_none() || key.as_slice() < min_key.as_slice() {
                    min_key.clear();
                    min_key.extend_from_slice(key);
                    survivor = Some(*id);
                }
            }
        }
        let Some(id) = survivor else {
            return Ok(());
        };

        sink.push(id, &min_key)
            .map_err(|source| StepError::Sink { source })?;

        // Refill every reader that held the emitted key
        let mut contributors: u64 = 0;
        for cursor in cursors.iter_mut() {
            let hit = matches!(
                &cursor.current,
                Some((_, key)) if key.as_slice() == min_key.as_slice()
            );
            if hit {
                contributors += 1;
                cursor.advance().map_err(|source| StepError::Read {
                    path: cursor.reader.path().to_path_buf(),
                    source,
                })?;
            }
        }
        *duplicates += contributors.saturating_sub(1);
    }
}
