use dupescan::duplicates::{DuplicateFinder, FinderConfig, KeyKind, ScanReport};
use dupescan::scanner::{HashAlgorithm, WalkerConfig};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn membership(report: &ScanReport) -> BTreeSet<BTreeSet<PathBuf>> {
    report
        .hash_groups
        .iter()
        .map(|g| g.paths.iter().cloned().collect())
        .collect()
}

#[test]
fn test_scan_two_identical_one_unique() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("A");
    let b = dir.path().join("B");
    let c = dir.path().join("C");
    write_file(&a, b"hello");
    write_file(&b, b"hello");
    write_file(&c, b"world");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.hash_groups.len(), 1);
    let group = &report.hash_groups[0];
    assert_eq!(group.kind(), KeyKind::Hash);
    assert_eq!(group.paths, vec![a, b]);
    assert!(!group.contains(&c));
    assert!(report.size_groups.is_empty());
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.summary.total_files, 3);
    assert_eq!(report.summary.duplicate_files, 1);
    assert_eq!(report.summary.reclaimable_space, 5);
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(!report.has_duplicates());
    assert!(report.diagnostics.is_empty());
    assert_eq!(report.summary.total_files, 0);
}

#[test]
fn test_scan_empty_and_one_byte_file() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty")).unwrap();
    write_file(&dir.path().join("x"), b"x");

    let finder = DuplicateFinder::new(FinderConfig::default().with_group_by_size(true));
    let report = finder.find_duplicates(dir.path()).unwrap();

    assert!(report.hash_groups.is_empty());
    assert!(report.size_groups.is_empty());
    assert_eq!(report.summary.hashed_files, 2);
}

#[test]
fn test_scan_same_size_different_content() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write_file(&first, b"0123456789");
    write_file(&second, b"abcdefghij");

    let finder = DuplicateFinder::new(FinderConfig::default().with_group_by_size(true));
    let report = finder.find_duplicates(dir.path()).unwrap();

    assert!(report.hash_groups.is_empty());
    assert_eq!(report.size_groups.len(), 1);
    let group = &report.size_groups[0];
    assert_eq!(group.kind(), KeyKind::Size);
    assert_eq!(group.size, 10);
    assert_eq!(group.fingerprint.key_string(), "10");
    assert_eq!(group.paths, vec![first, second]);
}

#[test]
fn test_scan_size_mode_off_reports_no_size_groups() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a"), b"0123456789");
    write_file(&dir.path().join("b"), b"abcdefghij");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.size_groups.is_empty());
    assert_eq!(report.summary.size_groups, 0);
}

#[test]
fn test_scan_deeply_nested_duplicate() {
    let dir = tempdir().unwrap();
    let top = dir.path().join("top.txt");
    write_file(&top, b"nested content");

    let deep = dir.path().join("l1/l2/l3/l4/l5");
    fs::create_dir_all(&deep).unwrap();
    let bottom = deep.join("copy.txt");
    write_file(&bottom, b"nested content");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.hash_groups.len(), 1);
    let group = &report.hash_groups[0];
    assert!(group.contains(&top));
    assert!(group.contains(&bottom));
}

#[test]
fn test_identical_content_ignores_name_and_mtime() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.dat");
    let new = dir.path().join("renamed.bin");
    write_file(&old, b"same bytes");
    write_file(&new, b"same bytes");

    filetime::set_file_mtime(&old, filetime::FileTime::from_unix_time(1_000_000, 0)).unwrap();
    filetime::set_file_mtime(&new, filetime::FileTime::from_unix_time(1_700_000_000, 0))
        .unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.hash_groups.len(), 1);
    assert!(report.hash_groups[0].contains(&old));
    assert!(report.hash_groups[0].contains(&new));
}

#[test]
fn test_hash_groups_are_subsets_of_size_groups() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a"), b"aaaa");
    write_file(&dir.path().join("b"), b"aaaa");
    write_file(&dir.path().join("c"), b"cccc");
    write_file(&dir.path().join("d"), b"longer");

    let finder = DuplicateFinder::new(FinderConfig::default().with_group_by_size(true));
    let report = finder.find_duplicates(dir.path()).unwrap();

    for hash_group in &report.hash_groups {
        let size_group = report
            .size_groups
            .iter()
            .find(|g| g.size == hash_group.size)
            .expect("hash group without size group");
        for path in &hash_group.paths {
            assert!(size_group.contains(path));
        }
    }

    // c shares a size with a and b but not their content
    assert_eq!(report.hash_groups[0].len(), 2);
    assert_eq!(report.size_groups[0].len(), 3);
}

#[test]
fn test_unique_files_never_grouped() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write_file(
            &dir.path().join(format!("unique_{i}")),
            format!("content {i}").as_bytes(),
        );
    }
    write_file(&dir.path().join("dup_1"), b"dup");
    write_file(&dir.path().join("dup_2"), b"dup");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.hash_groups.len(), 1);
    for group in report.groups() {
        assert!(group.len() >= 2);
        for path in &group.paths {
            let name = path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("dup_"));
        }
    }
}

#[test]
fn test_repeated_scans_match() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    for (name, content) in [("a", "x"), ("b", "y"), ("c", "x"), ("d", "y"), ("e", "z")] {
        write_file(&dir.path().join(name), content.as_bytes());
        write_file(&sub.join(name), content.as_bytes());
    }

    let finder = DuplicateFinder::with_defaults();
    let first = finder.find_duplicates(dir.path()).unwrap();
    let second = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(membership(&first), membership(&second));
    // Traversal is sorted, so even the ordering is stable
    assert_eq!(first.hash_groups, second.hash_groups);
}

#[test]
fn test_groups_in_first_seen_order() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("1"), b"second content");
    write_file(&dir.path().join("2"), b"first content!");
    write_file(&dir.path().join("3"), b"first content!");
    write_file(&dir.path().join("4"), b"second content");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.hash_groups.len(), 2);
    assert_eq!(
        report.hash_groups[0].paths,
        vec![dir.path().join("1"), dir.path().join("4")]
    );
    assert_eq!(
        report.hash_groups[1].paths,
        vec![dir.path().join("2"), dir.path().join("3")]
    );
}

#[test]
fn test_thread_count_does_not_change_result() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write_file(
            &dir.path().join(format!("f{i:02}")),
            format!("group {}", i % 7).as_bytes(),
        );
    }

    let single = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(dir.path())
        .unwrap();
    let many = DuplicateFinder::new(FinderConfig::default().with_io_threads(8))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(single.hash_groups, many.hash_groups);
    assert_eq!(single.hash_groups.len(), 7);
}

#[test]
fn test_sha256_finds_same_groups() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a"), b"same");
    write_file(&dir.path().join("b"), b"same");
    write_file(&dir.path().join("c"), b"diff");

    let blake = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let sha = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashAlgorithm::Sha256))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(membership(&blake), membership(&sha));
    assert_ne!(
        blake.hash_groups[0].fingerprint,
        sha.hash_groups[0].fingerprint
    );
}

#[test]
fn test_walker_filters_apply() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a.txt"), b"dup");
    write_file(&dir.path().join("b.txt"), b"dup");
    write_file(&dir.path().join("c.tmp"), b"dup");
    write_file(&dir.path().join(".hidden"), b"dup");

    let walker_config = WalkerConfig::default()
        .with_skip_hidden(true)
        .with_ignore_patterns(vec!["*.tmp".to_string()]);
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker_config));
    let report = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(report.summary.total_files, 2);
    assert_eq!(
        report.hash_groups[0].paths,
        vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
    );
}

#[test]
fn test_larger_than_buffer_files() {
    let dir = tempdir().unwrap();
    let big: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    let mut other = big.clone();
    *other.last_mut().unwrap() ^= 0xff;

    write_file(&dir.path().join("big1"), &big);
    write_file(&dir.path().join("big2"), &big);
    write_file(&dir.path().join("big3"), &other);

    let finder = DuplicateFinder::new(FinderConfig::default().with_buffer_size(4096));
    let report = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(report.hash_groups.len(), 1);
    assert_eq!(report.hash_groups[0].len(), 2);
    assert!(!report.hash_groups[0].contains(&dir.path().join("big3")));
    assert_eq!(report.summary.bytes_hashed, 900_000);
}
