//! Build pipeline behavior under controlled run layouts.

use std::fs;

use keydex::testing::{numbered_keys, VecSource};
use keydex::{
    build_into_memory, merge_runs, BuildContext, BuildError, BuildOptions, BuildStats, DocId,
    KeyDictionary, MemoryStore, MergeLimits,
};

use crate::common::{build_keys, ceil_log2, one_run_per_doc, run_files, temp_build_dir, FailingSource};

#[test]
fn duplicates_within_one_batch_keep_the_later_document() {
    // "a" arrives twice before the first flush, so the accumulator
    // update decides the survivor
    let (store, stats, dir) = build_keys(&["b", "a", "a"], BuildOptions::default());

    assert_eq!(stats.documents, 3);
    assert_eq!(stats.runs_written, 1);
    assert_eq!(stats.merge_passes, 0);
    assert_eq!(stats.intermediate_merges, 0);
    assert_eq!(stats.duplicate_keys, 1);
    assert_eq!(stats.entries, 2);

    let dictionary = KeyDictionary::new(store);
    assert_eq!(dictionary.lookup(b"a").expect("hit"), Some(DocId::new(3)));
    assert_eq!(dictionary.lookup(b"b").expect("hit"), Some(DocId::new(1)));
    assert!(run_files(dir.path()).is_empty(), "no run files may remain");
}

#[test]
fn duplicates_across_runs_keep_the_earliest_run() {
    // One run per document: the same keys now meet in the final merge,
    // where the earliest run wins instead
    let (store, stats, dir) = build_keys(&["b", "a", "a"], one_run_per_doc(241));

    assert_eq!(stats.runs_written, 3);
    assert_eq!(stats.merge_passes, 0);
    assert_eq!(stats.duplicate_keys, 1);
    assert_eq!(stats.entries, 2);

    let dictionary = KeyDictionary::new(store);
    assert_eq!(dictionary.lookup(b"a").expect("hit"), Some(DocId::new(2)));
    assert_eq!(dictionary.lookup(b"b").expect("hit"), Some(DocId::new(1)));
    assert!(run_files(dir.path()).is_empty());
}

#[test]
fn empty_source_builds_an_empty_dictionary() {
    let (store, stats, dir) = build_keys(&[], BuildOptions::default());
    assert!(store.is_empty());
    assert_eq!(stats, BuildStats::default());
    assert!(run_files(dir.path()).is_empty());
}

#[test]
fn width_two_merges_halve_the_run_count_each_pass() {
    for r in [2u32, 3, 5, 8, 16, 33] {
        let keys = numbered_keys(r as usize);
        let dir = temp_build_dir();
        let mut source = VecSource::new(keys.clone());
        let (store, stats) =
            build_into_memory(&mut source, dir.path(), one_run_per_doc(2)).expect("build");

        assert_eq!(stats.runs_written, r, "r={r}");
        assert_eq!(stats.merge_passes, ceil_log2(r), "r={r}");
        assert_eq!(stats.intermediate_merges, r - 1, "r={r}");
        assert_eq!(stats.duplicate_keys, 0, "r={r}");
        assert_eq!(stats.entries, u64::from(r), "r={r}");
        assert_eq!(store.len(), r as usize, "r={r}");
        assert!(run_files(dir.path()).is_empty(), "r={r}");

        let dictionary = KeyDictionary::new(store);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(
                dictionary.lookup(key).expect("hit"),
                Some(DocId::new(i as u32 + 1)),
                "r={r} key {i}"
            );
        }
    }
}

#[test]
fn width_three_groups_three_runs_at_a_time() {
    let keys = numbered_keys(9);
    let dir = temp_build_dir();
    let mut source = VecSource::new(keys);
    let (_, stats) = build_into_memory(&mut source, dir.path(), one_run_per_doc(3)).expect("build");

    // 9 runs -> 3 -> final merge of 3
    assert_eq!(stats.merge_passes, 2);
    assert_eq!(stats.intermediate_merges, 4);
    assert!(run_files(dir.path()).is_empty());
}

#[test]
fn byte_cap_closes_groups_at_pairs() {
    let keys = numbered_keys(6);
    let dir = temp_build_dir();
    let mut source = VecSource::new(keys);
    let options = BuildOptions {
        memory_limit: 1,
        limits: MergeLimits {
            fan_in: 6,
            group_bytes: 1,
        },
    };
    let (store, stats) = build_into_memory(&mut source, dir.path(), options).expect("build");

    // The cap admits no third run, so the only pass forms three pairs
    assert_eq!(stats.merge_passes, 1);
    assert_eq!(stats.intermediate_merges, 3);
    assert_eq!(store.len(), 6);
    assert!(run_files(dir.path()).is_empty());
}

#[test]
fn failed_source_leaves_runs_on_disk() {
    let dir = temp_build_dir();
    let mut source = FailingSource {
        keys: vec![
            b"one".to_vec(),
            b"two".to_vec(),
            b"three".to_vec(),
            b"four".to_vec(),
        ],
        fail_at: 3,
    };
    let err = build_into_memory(&mut source, dir.path(), one_run_per_doc(241)).unwrap_err();
    match err {
        BuildError::Source { id, .. } => assert_eq!(id, DocId::new(3)),
        other => panic!("expected Source error, got {other}"),
    }

    // Two documents got through, so two runs stay behind for the
    // caller to inspect or delete
    assert_eq!(
        run_files(dir.path()),
        vec!["keyrun.000000".to_string(), "keyrun.000001".to_string()]
    );
}

#[test]
fn corrupt_run_aborts_the_merge() {
    let dir = temp_build_dir();
    let mut ctx = BuildContext::new(dir.path().to_path_buf());

    let (first, mut writer) = ctx.create_run().expect("create");
    writer.write_record(DocId::new(1), b"aaa").expect("write");
    let bytes = writer.finish().expect("finish");
    ctx.register_run(first, bytes);

    let (second, mut writer) = ctx.create_run().expect("create");
    writer.write_record(DocId::new(2), b"bbb").expect("write");
    let bytes = writer.finish().expect("finish");
    ctx.register_run(second, bytes);

    let victim = ctx.run_file_path(first);
    let mut raw = fs::read(&victim).expect("read run");
    raw[0] ^= 0xFF;
    fs::write(&victim, raw).expect("rewrite run");

    let mut dictionary = KeyDictionary::new(MemoryStore::new());
    let err = merge_runs(&mut ctx, MergeLimits::default(), &mut dictionary).unwrap_err();
    match err {
        BuildError::RunRead { path, .. } => assert_eq!(path, victim),
        other => panic!("expected RunRead, got {other}"),
    }
}
