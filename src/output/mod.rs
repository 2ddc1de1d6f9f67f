//! Output formatters for scan results.
//!
//! - [`text`]: the human-readable listing, one block per group
//! - [`json`]: the whole [`ScanReport`] for automation and scripting
//!
//! Group data always goes to the writer passed in (stdout in the CLI).
//! Skipped entries are written separately with [`write_diagnostics`] so a
//! consumer reading stdout never sees error text.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::DuplicateFinder;
//! use dupescan::output::{write_report, OutputFormat};
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! write_report(&report, OutputFormat::Text, &mut std::io::stdout().lock()).unwrap();
//! ```

pub mod json;
pub mod text;

use std::io::{self, Write};

use crate::duplicates::ScanReport;

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text listing
    #[default]
    Text,
    /// Pretty-printed JSON document
    Json,
}

/// Write the groups of `report` in the requested format.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_report<W: Write>(
    report: &ScanReport,
    format: OutputFormat,
    writer: &mut W,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => text::write_groups(report, writer),
        OutputFormat::Json => json::write_report(report, writer),
    }
}

/// List skipped entries, one `path: reason` line each.
///
/// Writes nothing when the scan was complete.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_diagnostics<W: Write>(report: &ScanReport, writer: &mut W) -> io::Result<()> {
    if report.diagnostics.is_empty() {
        return Ok(());
    }
    writeln!(writer, "Skipped {} entries:", report.diagnostics.len())?;
    for diag in &report.diagnostics {
        writeln!(writer, "  {}: {}", diag.path.display(), diag.message)?;
    }
    Ok(())
}
