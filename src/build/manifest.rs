// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! JSON manifest listing document keys for a CLI build.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::DocId;

use super::DocumentSource;

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;

/// Input manifest: position i (0-based) holds the key of DocId i+1.
///
/// ```json
/// { "version": 1, "keys": ["omim-104300", "omim-104310"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyManifest {
    pub version: u32,
    pub keys: Vec<String>,
}

impl KeyManifest {
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let manifest: KeyManifest = serde_json::from_str(&text).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("manifest parse error: {e}"),
            )
        })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "unsupported manifest version {} (expected {})",
                    manifest.version, MANIFEST_VERSION
                ),
            ));
        }
        Ok(manifest)
    }

    /// Wrap the manifest keys as a document source.
    pub fn into_source(self) -> ManifestSource {
        ManifestSource { keys: self.keys }
    }
}

/// [`DocumentSource`] over manifest keys.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    keys: Vec<String>,
}

impl DocumentSource for ManifestSource {
    fn doc_count(&self) -> u32 {
        self.keys.len() as u32
    }

    fn document_key(&mut self, id: DocId) -> io::Result<Vec<u8>> {
        match id.as_usize().checked_sub(1).and_then(|i| self.keys.get(i)) {
            Some(key) => Ok(key.clone().into_bytes()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no manifest key for doc {id}"),
            )),
        }
    }
}
