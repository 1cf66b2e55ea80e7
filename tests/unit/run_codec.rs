//! Run file reading and writing against real temp files.

use std::fs::{self, OpenOptions};
use std::io::Write;

use keydex::{run_path, DocId, KeyAccumulator, RunReader, RunWriter};

use crate::common::temp_build_dir;

#[test]
fn accumulator_flush_reads_back_sorted() {
    let dir = temp_build_dir();
    let path = run_path(dir.path(), 0, false);

    let mut acc = KeyAccumulator::new();
    for (i, key) in ["pear", "apple", "quince", "banana", "apple"]
        .iter()
        .enumerate()
    {
        acc.insert(key.as_bytes(), DocId::new(i as u32 + 1));
    }

    let mut writer = RunWriter::create(&path).expect("create run");
    let expected: Vec<(Box<[u8]>, DocId)> = acc.drain_sorted().collect();
    for (key, id) in &expected {
        writer.write_record(*id, key).expect("write record");
    }
    assert_eq!(writer.records(), 4);
    writer.finish().expect("finish");

    let mut reader = RunReader::open(&path).expect("open run");
    let mut seen = Vec::new();
    while let Some((id, key)) = reader.read_record().expect("read record") {
        seen.push((key.into_boxed_slice(), id));
    }
    assert_eq!(seen, expected);
    for pair in seen.windows(2) {
        assert!(pair[0].0 < pair[1].0, "records must stay ascending");
    }
}

#[test]
fn empty_run_file_yields_no_records() {
    let dir = temp_build_dir();
    let path = run_path(dir.path(), 3, false);
    let writer = RunWriter::create(&path).expect("create run");
    writer.finish().expect("finish");

    let mut reader = RunReader::open(&path).expect("open run");
    assert!(reader.read_record().expect("read").is_none());
    assert!(reader.read_record().expect("read again").is_none());
}

#[test]
fn garbage_after_last_record_is_an_error() {
    let dir = temp_build_dir();
    let path = run_path(dir.path(), 0, false);

    let mut writer = RunWriter::create(&path).expect("create run");
    writer
        .write_record(DocId::new(1), b"alpha")
        .expect("write record");
    writer.finish().expect("finish");

    let mut trailing = OpenOptions::new()
        .append(true)
        .open(&path)
        .expect("reopen for append");
    trailing.write_all(&[0x00, 0x01]).expect("append garbage");
    drop(trailing);

    let mut reader = RunReader::open(&path).expect("open run");
    let first = reader.read_record().expect("first record");
    assert_eq!(first, Some((DocId::new(1), b"alpha".to_vec())));
    assert!(reader.read_record().is_err(), "trailing bytes must fail");
}

#[test]
fn writer_reports_bytes_matching_the_file() {
    let dir = temp_build_dir();
    let path = run_path(dir.path(), 7, true);
    assert!(path.to_string_lossy().ends_with("keyrun.000007.shadow"));

    let mut writer = RunWriter::create(&path).expect("create run");
    writer
        .write_record(DocId::new(9), b"one")
        .expect("write record");
    writer
        .write_record(DocId::new(10), b"three")
        .expect("write record");
    let reported = writer.bytes();
    let finished = writer.finish().expect("finish");
    assert_eq!(reported, finished);

    let on_disk = fs::metadata(&path).expect("stat run").len();
    assert_eq!(finished, on_disk);
}
