//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::Path;

use tempfile::TempDir;

use keydex::testing::VecSource;
use keydex::{
    build_into_memory, BuildOptions, BuildStats, DocId, DocumentSource, MemoryStore, MergeLimits,
};

pub fn temp_build_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Names of run files (shadows included) left under `dir`, sorted.
pub fn run_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("keyrun."))
        .collect();
    names.sort();
    names
}

/// Options with a tiny flush threshold: every document lands in its
/// own run.
pub fn one_run_per_doc(fan_in: usize) -> BuildOptions {
    BuildOptions {
        memory_limit: 1,
        limits: MergeLimits {
            fan_in,
            group_bytes: u64::MAX,
        },
    }
}

/// Build the given keys into a fresh memory store. The TempDir comes
/// back so callers can check what is left on disk before it drops.
pub fn build_keys(keys: &[&str], options: BuildOptions) -> (MemoryStore, BuildStats, TempDir) {
    let dir = temp_build_dir();
    let mut source = VecSource::new(keys.iter().map(|k| k.as_bytes().to_vec()));
    let (store, stats) =
        build_into_memory(&mut source, dir.path(), options).expect("build should succeed");
    (store, stats, dir)
}

/// Source that fails with an I/O error when asked for one document.
pub struct FailingSource {
    pub keys: Vec<Vec<u8>>,
    pub fail_at: u32,
}

impl DocumentSource for FailingSource {
    fn doc_count(&self) -> u32 {
        self.keys.len() as u32
    }

    fn document_key(&mut self, id: DocId) -> io::Result<Vec<u8>> {
        if id.get() == self.fail_at {
            return Err(io::Error::new(io::ErrorKind::Other, "source offline"));
        }
        Ok(self.keys[id.as_usize() - 1].clone())
    }
}

pub fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}
