//! dupescan - duplicate file finder
//!
//! Walks a directory tree, fingerprints every regular file by streaming its
//! content through a digest, and reports groups of files that share a
//! fingerprint. Files that cannot be read are reported as diagnostics and
//! never abort the scan.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_group_by_size(true));
//! let report = finder.find_duplicates(Path::new("/data")).unwrap();
//! for group in report.groups() {
//!     println!("{} {}: {:?}", group.kind(), group.fingerprint.key_string(), group.paths);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, ScanReport};
use crate::output::OutputFormat;
use crate::progress::Progress;

/// Run the command selected on the command line.
///
/// Results go to stdout; progress, logs and skipped entries go to stderr.
///
/// # Errors
///
/// Fails for bad configuration, an unusable root path, an interrupted scan
/// ([`duplicates::FinderError::Interrupted`]) or a broken stdout.
pub fn run_app(cli: Cli) -> anyhow::Result<ScanReport> {
    let quiet = cli.quiet;
    let config_file = cli.config;
    match cli.command {
        Commands::Scan(args) => run_scan(&args, config_file.as_deref(), quiet),
    }
}

fn run_scan(
    args: &ScanArgs,
    config_file: Option<&std::path::Path>,
    quiet: bool,
) -> anyhow::Result<ScanReport> {
    let mut config = Config::load(config_file)?;
    config.apply_scan_args(args);
    config.validate()?;
    log::debug!("Effective configuration: {config:?}");

    let cancel = signal::install_ctrlc_handler()?;
    let progress = Arc::new(Progress::new(quiet || args.no_progress));

    let finder_config = config
        .to_finder_config()
        .with_shutdown_flag(cancel.flag())
        .with_progress_callback(progress);

    let report = DuplicateFinder::new(finder_config)
        .find_duplicates(&args.path)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    output::write_report(&report, args.output, &mut out).context("Failed to write results")?;

    if args.output == OutputFormat::Text && !report.is_complete() {
        let stderr = std::io::stderr();
        let mut err = stderr.lock();
        output::write_diagnostics(&report, &mut err)?;
        err.flush()?;
    }

    Ok(report)
}
