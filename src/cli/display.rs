// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal output helpers for the keydex CLI.

use std::time::Duration;

use keydex::{BuildStats, SnapshotInfo};

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";

/// Interior width of the summary boxes, borders excluded.
const BOX_WIDTH: usize = 44;

/// Colors only when stdout is a TTY and NO_COLOR is unset.
pub fn use_colors() -> bool {
    atty::is(atty::Stream::Stdout) && std::env::var_os("NO_COLOR").is_none()
}

fn paint(text: &str, color: &str) -> String {
    if use_colors() {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

fn top(title: &str) -> String {
    let label = format!("─ {title} ");
    let fill = BOX_WIDTH.saturating_sub(label.chars().count());
    format!("┌{label}{}┐", "─".repeat(fill))
}

fn row(label: &str, value: &str) -> String {
    let content = format!("{label:<18}{value}");
    format!("│ {content:<width$} │", width = BOX_WIDTH - 2)
}

fn bottom() -> String {
    format!("└{}┘", "─".repeat(BOX_WIDTH))
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Post-build summary box.
pub fn print_build_summary(
    stats: &BuildStats,
    output: &str,
    output_bytes: u64,
    elapsed: Duration,
) {
    println!("{}", paint(&top("build complete"), GREEN));
    println!("{}", row("documents", &stats.documents.to_string()));
    println!("{}", row("entries", &stats.entries.to_string()));
    println!("{}", row("duplicate keys", &stats.duplicate_keys.to_string()));
    println!("{}", row("runs written", &stats.runs_written.to_string()));
    println!("{}", row("merge passes", &stats.merge_passes.to_string()));
    println!(
        "{}",
        row("merges", &stats.intermediate_merges.to_string())
    );
    println!("{}", row("output", output));
    println!("{}", row("size", &format_size(output_bytes)));
    println!(
        "{}",
        row("elapsed", &format!("{:.2}s", elapsed.as_secs_f64()))
    );
    println!("{}", bottom());
}

/// Snapshot structure box for `inspect`.
pub fn print_snapshot_info(path: &str, info: &SnapshotInfo) {
    println!("{}", paint(&top("snapshot"), CYAN));
    println!("{}", row("file", path));
    println!("{}", row("version", &info.version.to_string()));
    println!("{}", row("entries", &info.entry_count.to_string()));
    println!("{}", row("size", &format_size(info.file_bytes)));
    println!("{}", row("crc32", &format!("{:08x}", info.crc32)));
    // Row padding counts characters, so colored values would skew it
    println!("{}", row("integrity", "ok"));
    println!("{}", bottom());
}
