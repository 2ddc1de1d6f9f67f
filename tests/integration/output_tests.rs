use clap::Parser;
use dupescan::cli::Cli;
use dupescan::config::ConfigError;
use dupescan::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupescan::output::{write_diagnostics, write_report, OutputFormat};
use dupescan::scanner::{hash_to_hex, Hasher};
use std::ffi::OsString;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_text_output_lists_groups() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"hello").unwrap();
    fs::write(&b, b"hello").unwrap();
    fs::write(dir.path().join("c"), b"world").unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let mut out = Vec::new();
    write_report(&report, OutputFormat::Text, &mut out).unwrap();

    let hash = hash_to_hex(&Hasher::new().hash_reader(&b"hello"[..]).unwrap());
    let expected = format!(
        "Duplicate files with hash {hash}\n{}\n{}\n\n",
        a.display(),
        b.display()
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_json_output_keeps_diagnostics_apart() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let gone = dir.path().join("gone");
    fs::write(&a, b"10 bytes!!").unwrap();
    fs::write(&b, b"10 bytes??").unwrap();

    let files = vec![
        dupescan::scanner::FileEntry::new(a.clone(), 10),
        dupescan::scanner::FileEntry::new(gone.clone(), 10),
        dupescan::scanner::FileEntry::new(b.clone(), 10),
    ];
    let finder = DuplicateFinder::new(FinderConfig::default().with_group_by_size(true));
    let report = finder.find_duplicates_from_files(files).unwrap();

    let mut out = Vec::new();
    write_report(&report, OutputFormat::Json, &mut out).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert!(value["hash_groups"].as_array().unwrap().is_empty());
    let size_group = &value["size_groups"][0];
    assert_eq!(size_group["kind"], "size");
    assert_eq!(size_group["key"], 10);
    assert_eq!(size_group["paths"].as_array().unwrap().len(), 2);
    assert_eq!(value["diagnostics"][0]["stage"], "hash");
    assert_eq!(
        value["diagnostics"][0]["path"],
        gone.to_string_lossy().as_ref()
    );

    let mut err = Vec::new();
    write_diagnostics(&report, &mut err).unwrap();
    assert!(String::from_utf8(err).unwrap().starts_with("Skipped 1 entries:"));
}

#[test]
fn test_run_app_reports_bad_root() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    let cfg = dir.path().join("empty.toml");
    fs::write(&cfg, "").unwrap();
    let _guard = crate::lock_env();
    let args: Vec<OsString> = vec![
        "dupescan".into(),
        "-q".into(),
        "--config".into(),
        cfg.into_os_string(),
        "scan".into(),
        missing.into_os_string(),
        "--no-progress".into(),
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    let err = dupescan::run_app(cli).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::Path(_))
    ));
    assert!(format!("{err:#}").contains("Path not found"));
}

#[test]
fn test_run_app_rejects_inverted_size_range() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("empty.toml");
    fs::write(&cfg, "").unwrap();
    let _guard = crate::lock_env();
    let args: Vec<OsString> = vec![
        "dupescan".into(),
        "--config".into(),
        cfg.into_os_string(),
        "scan".into(),
        dir.path().as_os_str().to_os_string(),
        "--min-size".into(),
        "10".into(),
        "--max-size".into(),
        "5".into(),
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    let err = dupescan::run_app(cli).unwrap_err();

    assert!(err.to_string().contains("min_size"));
}

#[test]
fn test_run_app_rejects_missing_config_file() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("none.toml");
    let _guard = crate::lock_env();
    let args: Vec<OsString> = vec![
        "dupescan".into(),
        "-q".into(),
        "--config".into(),
        cfg.clone().into_os_string(),
        "scan".into(),
        dir.path().as_os_str().to_os_string(),
        "--no-progress".into(),
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    let err = dupescan::run_app(cli).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::MissingFile(path)) if *path == cfg
    ));
}
