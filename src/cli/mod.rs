// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition.

use clap::{Parser, Subcommand};

use keydex::{DEFAULT_FAN_IN, DEFAULT_GROUP_BYTES, DEFAULT_MEMORY_LIMIT};

pub mod display;

#[derive(Parser)]
#[command(
    name = "keydex",
    about = "Build and query document-key dictionaries",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a dictionary snapshot from a key manifest
    Build {
        /// Path to the JSON key manifest
        #[arg(short, long)]
        input: String,

        /// Output snapshot path (.keydex)
        #[arg(short, long)]
        output: String,

        /// Accumulator flush threshold in bytes
        #[arg(long, default_value_t = DEFAULT_MEMORY_LIMIT)]
        memory_limit: usize,

        /// Maximum runs merged at once
        #[arg(long, default_value_t = DEFAULT_FAN_IN)]
        fan_in: usize,

        /// Byte cap for one intermediate merge group
        #[arg(long, default_value_t = DEFAULT_GROUP_BYTES)]
        group_bytes: u64,

        /// Directory for temporary run files (default: <output>.runs)
        #[arg(long)]
        build_dir: Option<String>,
    },

    /// Look up one document key in a snapshot
    Lookup {
        /// Snapshot file
        file: String,

        /// Document key to resolve
        key: String,
    },

    /// Show snapshot structure and integrity status
    Inspect {
        /// Snapshot file
        file: String,
    },
}
