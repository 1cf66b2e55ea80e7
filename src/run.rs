// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Numbered on-disk runs and their record codec.
//!
//! A run is an append-only file of (DocId, key) records written in
//! strictly ascending key order. Every record opens with a one-byte
//! sentinel so a desynchronized stream is caught at the next record
//! instead of producing garbage entries.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ byte    flag      RECORD_FLAG = 123           │
//! │ u32 BE  doc_id                                │
//! │ u16 BE  key_len                               │
//! │ bytes   key       (key_len, no terminator)    │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! End of file exactly at a record boundary is the normal end-of-run
//! signal and surfaces as `Ok(None)`. A file ending inside a record, a
//! flag mismatch or a zero key length are corruption and fail the
//! whole build.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::types::{DocId, MAX_KEY_BYTES};

/// Sentinel byte opening every record.
pub const RECORD_FLAG: u8 = 123;

/// Fixed bytes per record before the key: flag + doc id + key length.
pub const RECORD_HEADER_BYTES: u64 = 7;

// ============================================================================
// TEMP PATH NAMING
// ============================================================================

/// Deterministic path for run `number` under `dir`.
///
/// Shadow paths name the in-progress replacement an intermediate merge
/// writes before renaming it over the original run. Zero-padding keeps
/// directory listings in run order.
pub fn run_path(dir: &Path, number: u32, shadow: bool) -> PathBuf {
    if shadow {
        dir.join(format!("keyrun.{number:06}.shadow"))
    } else {
        dir.join(format!("keyrun.{number:06}"))
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// Buffered writer producing one run file.
#[derive(Debug)]
pub struct RunWriter {
    out: BufWriter<File>,
    records: u64,
    bytes: u64,
}

impl RunWriter {
    /// Create (or truncate) the run file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(RunWriter {
            out: BufWriter::new(file),
            records: 0,
            bytes: 0,
        })
    }

    /// Append one record. The caller guarantees ascending key order;
    /// this only enforces what the wire format can represent.
    pub fn write_record(&mut self, id: DocId, key: &[u8]) -> io::Result<()> {
        if key.is_empty() || key.len() > MAX_KEY_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record key length {} outside 1..={}", key.len(), MAX_KEY_BYTES),
            ));
        }
        self.out.write_all(&[RECORD_FLAG])?;
        self.out.write_all(&id.get().to_be_bytes())?;
        self.out.write_all(&(key.len() as u16).to_be_bytes())?;
        self.out.write_all(key)?;
        self.records += 1;
        self.bytes += RECORD_HEADER_BYTES + key.len() as u64;
        Ok(())
    }

    /// Records written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Bytes written so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Flush buffered output and close the file, returning the total
    /// byte size of the run.
    pub fn finish(mut self) -> io::Result<u64> {
        self.out.flush()?;
        Ok(self.bytes)
    }
}

// ============================================================================
// READER
// ============================================================================

/// Buffered reader streaming records back out of one run file.
#[derive(Debug)]
pub struct RunReader {
    input: BufReader<File>,
    path: PathBuf,
}

impl RunReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(RunReader {
            input: BufReader::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Path this reader was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the next record.
    ///
    /// `Ok(None)` means the file ended cleanly at a record boundary.
    /// Anything else mid-record (short read, flag mismatch, zero key
    /// length) is corruption and comes back as an error.
    pub fn read_record(&mut self) -> io::Result<Option<(DocId, Vec<u8>)>> {
        // Zero bytes available before a record starts is clean EOF
        if self.input.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let mut flag = [0u8; 1];
        self.input
            .read_exact(&mut flag)
            .map_err(|e| self.truncated("flag", e))?;
        if flag[0] != RECORD_FLAG {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "bad record flag {} in {} (expected {})",
                    flag[0],
                    self.path.display(),
                    RECORD_FLAG
                ),
            ));
        }

        let mut id_buf = [0u8; 4];
        self.input
            .read_exact(&mut id_buf)
            .map_err(|e| self.truncated("doc id", e))?;

        let mut len_buf = [0u8; 2];
        self.input
            .read_exact(&mut len_buf)
            .map_err(|e| self.truncated("key length", e))?;
        let key_len = u16::from_be_bytes(len_buf) as usize;
        if key_len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("zero-length key in {}", self.path.display()),
            ));
        }

        let mut key = vec![0u8; key_len];
        self.input
            .read_exact(&mut key)
            .map_err(|e| self.truncated("key bytes", e))?;

        Ok(Some((DocId(u32::from_be_bytes(id_buf)), key)))
    }

    fn truncated(&self, what: &str, source: io::Error) -> io::Error {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("run {} truncated reading {}", self.path.display(), what),
            )
        } else {
            source
        }
    }
}
