// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for tests and benchmarks.

#![doc(hidden)]

use std::io;

use crate::build::DocumentSource;
use crate::types::DocId;

/// Document source over a fixed key list; position i holds the key of
/// DocId i+1.
#[derive(Debug, Clone)]
pub struct VecSource {
    keys: Vec<Vec<u8>>,
}

impl VecSource {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Vec<u8>>,
    {
        VecSource {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl DocumentSource for VecSource {
    fn doc_count(&self) -> u32 {
        self.keys.len() as u32
    }

    fn document_key(&mut self, id: DocId) -> io::Result<Vec<u8>> {
        match id.as_usize().checked_sub(1).and_then(|i| self.keys.get(i)) {
            Some(key) => Ok(key.clone()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no key for doc {id}"),
            )),
        }
    }
}

/// `n` unique zero-padded keys, in ascending order.
pub fn numbered_keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("key-{i:06}").into_bytes()).collect()
}
