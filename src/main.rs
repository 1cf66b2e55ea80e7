// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;
use std::process;
use std::time::Instant;

use clap::Parser;

use keydex::{build_from_manifest, read_snapshot, BuildOptions, KeyDictionary, MergeLimits};

mod cli;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            input,
            output,
            memory_limit,
            fan_in,
            group_bytes,
            build_dir,
        } => {
            let options = BuildOptions {
                memory_limit,
                limits: MergeLimits {
                    fan_in,
                    group_bytes,
                },
            };
            let run_dir = build_dir.as_deref().map(Path::new);
            let started = Instant::now();
            match build_from_manifest(&input, &output, run_dir, options) {
                Ok(stats) => {
                    let size = fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
                    cli::display::print_build_summary(&stats, &output, size, started.elapsed());
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    process::exit(1);
                }
            }
        }
        Commands::Lookup { file, key } => run_lookup(&file, &key),
        Commands::Inspect { file } => run_inspect(&file),
    }
}

fn run_lookup(file: &str, key: &str) {
    let (store, _info) = match read_snapshot(Path::new(file)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ failed to open {file}: {e}");
            process::exit(2);
        }
    };
    let dictionary = KeyDictionary::new(store);
    match dictionary.lookup(key.as_bytes()) {
        Ok(Some(id)) => println!("{id}"),
        Ok(None) => {
            println!("not found");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("❌ {e}");
            process::exit(2);
        }
    }
}

fn run_inspect(file: &str) {
    match read_snapshot(Path::new(file)) {
        Ok((_store, info)) => cli::display::print_snapshot_info(file, &info),
        Err(e) => {
            eprintln!("❌ {e}");
            process::exit(1);
        }
    }
}
