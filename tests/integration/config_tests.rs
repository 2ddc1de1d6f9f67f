use dupescan::config::{Config, ConfigError};
use dupescan::scanner::HashAlgorithm;
use std::env;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_file_then_env_precedence() {
    let _guard = crate::lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupescan.toml");
    fs::write(&path, "io_threads = 2\nalgorithm = \"sha256\"\n").unwrap();

    env::set_var("DUPESCAN_IO_THREADS", "6");
    let result = Config::load(Some(path.as_path()));
    env::remove_var("DUPESCAN_IO_THREADS");

    let config = result.unwrap();
    assert_eq!(config.io_threads, 6);
    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert!(!config.group_by_size);
}

#[test]
fn test_missing_explicit_file_is_error() {
    let _guard = crate::lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let result = Config::load(Some(path.as_path()));

    assert!(matches!(result, Err(ConfigError::MissingFile(p)) if p == path));
}

#[test]
fn test_empty_explicit_file_uses_defaults() {
    let _guard = crate::lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_bad_env_value_is_load_error() {
    let _guard = crate::lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();

    env::set_var("DUPESCAN_IO_THREADS", "lots");
    let result = Config::load(Some(path.as_path()));
    env::remove_var("DUPESCAN_IO_THREADS");

    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_loaded_config_drives_finder() {
    let _guard = crate::lock_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupescan.toml");
    fs::write(&path, "group_by_size = true\nmin_size = 2\n").unwrap();

    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a"), b"ab").unwrap();
    fs::write(data.join("b"), b"cd").unwrap();
    fs::write(data.join("c"), b"e").unwrap();
    fs::write(data.join("d"), b"f").unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();
    config.validate().unwrap();
    let finder = dupescan::duplicates::DuplicateFinder::new(config.to_finder_config());
    let report = finder.find_duplicates(&data).unwrap();

    assert!(report.hash_groups.is_empty());
    assert_eq!(report.size_groups.len(), 1);
    assert_eq!(report.size_groups[0].size, 2);
    assert_eq!(report.summary.total_files, 2);
}
