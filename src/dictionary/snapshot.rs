// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Durable snapshot of a finished dictionary.
//!
//! A snapshot is the one build artifact that outlives the process, so
//! it is the only place durability and integrity live: the file is
//! fsynced on write and carries a CRC32 over everything it frames.
//! Serving is load-then-serve; `read_snapshot` validates the whole
//! file and returns an in-memory store.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ HEADER (8 bytes)                            │
//! │   magic:    [u8; 4] = "KDEX"                │
//! │   version:  u8 = 1                          │
//! │   reserved: [u8; 3]                         │
//! ├─────────────────────────────────────────────┤
//! │ ENTRIES (entry_count times)                 │
//! │   key_len:   varint                         │
//! │   key:       key_len bytes                  │
//! │   value_len: varint                         │
//! │   value:     value_len bytes                │
//! ├─────────────────────────────────────────────┤
//! │ TRAILER (12 bytes)                          │
//! │   entry_count: u32 LE                       │
//! │   crc32:       u32 LE (all preceding bytes) │
//! │   end magic:   [u8; 4] = "XEDK"             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Security Considerations
//!
//! Snapshots may come from untrusted disks. Magic, version and the end
//! magic are checked before anything is parsed, the CRC before any
//! entry is materialized, and every length field is validated against
//! a MAX_* bound so a corrupt file cannot trigger huge allocations.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::types::MAX_KEY_BYTES;
use crate::varint::{decode_varint, encode_varint};

use super::{DictionaryStore, MemoryStore};

/// Magic bytes opening a snapshot file.
pub const MAGIC: [u8; 4] = *b"KDEX";

/// Magic bytes closing a snapshot file.
pub const END_MAGIC: [u8; 4] = *b"XEDK";

/// Current snapshot format version.
pub const VERSION: u8 = 1;

/// Upper bound on entries accepted from a snapshot.
pub const MAX_SNAPSHOT_ENTRIES: u32 = 100_000_000;

/// Upper bound on a stored value. A varint of a u32 fits in 5 bytes;
/// the headroom covers future value layouts without opening the door
/// to allocation attacks.
pub const MAX_VALUE_BYTES: usize = 64;

const HEADER_BYTES: usize = 8;
const TRAILER_BYTES: usize = 12;

/// Header and trailer facts surfaced by `inspect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub version: u8,
    pub entry_count: u32,
    pub file_bytes: u64,
    pub crc32: u32,
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Serialize `store` to `path` and fsync it.
pub fn write_snapshot(store: &MemoryStore, path: &Path) -> io::Result<()> {
    let count = u32::try_from(store.len())
        .ok()
        .filter(|&n| n <= MAX_SNAPSHOT_ENTRIES)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("store has {} entries, snapshot cap is {}", store.len(), MAX_SNAPSHOT_ENTRIES),
            )
        })?;

    let mut buf = Vec::new();
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&[0u8; 3]);

    for (key, value) in store.iter() {
        if key.is_empty() || key.len() > MAX_KEY_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("entry key length {} outside 1..={}", key.len(), MAX_KEY_BYTES),
            ));
        }
        if value.is_empty() || value.len() > MAX_VALUE_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("entry value length {} outside 1..={}", value.len(), MAX_VALUE_BYTES),
            ));
        }
        encode_varint(key.len() as u64, &mut buf);
        buf.extend_from_slice(key);
        encode_varint(value.len() as u64, &mut buf);
        buf.extend_from_slice(value);
    }

    buf.extend_from_slice(&count.to_le_bytes());
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf);
    buf.extend_from_slice(&hasher.finalize().to_le_bytes());
    buf.extend_from_slice(&END_MAGIC);

    let mut file = File::create(path)?;
    file.write_all(&buf)?;
    file.sync_all()?;
    Ok(())
}

/// Read and validate a snapshot, returning the loaded store and its
/// header facts. Every mismatch is `InvalidData`.
pub fn read_snapshot(path: &Path) -> io::Result<(MemoryStore, SnapshotInfo)> {
    let bytes = std::fs::read(path)?;
    if bytes.len() < HEADER_BYTES + TRAILER_BYTES {
        return Err(invalid(format!(
            "snapshot too small: {} bytes",
            bytes.len()
        )));
    }
    if bytes[0..4] != MAGIC {
        return Err(invalid("bad snapshot magic".to_string()));
    }
    let version = bytes[4];
    if version != VERSION {
        return Err(invalid(format!(
            "unsupported snapshot version {version} (expected {VERSION})"
        )));
    }

    let trailer_start = bytes.len() - TRAILER_BYTES;
    let trailer = &bytes[trailer_start..];
    if trailer[8..12] != END_MAGIC {
        return Err(invalid("bad snapshot end magic (truncated file?)".to_string()));
    }
    let entry_count = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let stored_crc = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes[..trailer_start + 4]);
    let computed = hasher.finalize();
    if computed != stored_crc {
        return Err(invalid(format!(
            "snapshot checksum mismatch: stored {stored_crc:08x}, computed {computed:08x}"
        )));
    }

    if entry_count > MAX_SNAPSHOT_ENTRIES {
        return Err(invalid(format!(
            "snapshot entry count {entry_count} exceeds cap {MAX_SNAPSHOT_ENTRIES}"
        )));
    }
    // Smallest possible entry is 4 bytes (two length varints, one byte
    // of key, one of value)
    let entries_len = trailer_start - HEADER_BYTES;
    if entry_count as u64 * 4 > entries_len as u64 {
        return Err(invalid(format!(
            "snapshot entry count {entry_count} exceeds available bytes {entries_len}"
        )));
    }

    let mut store = MemoryStore::new();
    let mut pos = HEADER_BYTES;
    for i in 0..entry_count {
        let (key_len, used) = decode_varint(&bytes[pos..trailer_start])
            .map_err(|e| invalid(format!("entry {i} key length: {e}")))?;
        pos += used;
        let key_len = usize::try_from(key_len)
            .ok()
            .filter(|n| (1..=MAX_KEY_BYTES).contains(n))
            .ok_or_else(|| invalid(format!("entry {i} key length {key_len} out of range")))?;
        let key_end = pos
            .checked_add(key_len)
            .filter(|&end| end <= trailer_start)
            .ok_or_else(|| invalid(format!("entry {i} key truncated")))?;
        let key = &bytes[pos..key_end];
        pos = key_end;

        let (value_len, used) = decode_varint(&bytes[pos..trailer_start])
            .map_err(|e| invalid(format!("entry {i} value length: {e}")))?;
        pos += used;
        let value_len = usize::try_from(value_len)
            .ok()
            .filter(|n| (1..=MAX_VALUE_BYTES).contains(n))
            .ok_or_else(|| invalid(format!("entry {i} value length {value_len} out of range")))?;
        let value_end = pos
            .checked_add(value_len)
            .filter(|&end| end <= trailer_start)
            .ok_or_else(|| invalid(format!("entry {i} value truncated")))?;
        store.add_entry(key, &bytes[pos..value_end])?;
        pos = value_end;
    }
    if pos != trailer_start {
        return Err(invalid(format!(
            "snapshot has {} trailing bytes after {entry_count} entries",
            trailer_start - pos
        )));
    }

    let info = SnapshotInfo {
        version,
        entry_count,
        file_bytes: bytes.len() as u64,
        crc32: stored_crc,
    };
    Ok((store, info))
}
