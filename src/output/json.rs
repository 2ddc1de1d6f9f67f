//! JSON output of a complete [`ScanReport`].
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "hash_groups": [
//!     { "kind": "hash", "key": "af13...", "size": 1024, "paths": ["/a", "/b"] }
//!   ],
//!   "size_groups": [],
//!   "diagnostics": [
//!     { "path": "/locked", "stage": "walk", "message": "Permission denied: /locked" }
//!   ],
//!   "summary": { "total_files": 3, "hashed_files": 2, ... }
//! }
//! ```

use std::io::{self, Write};

use crate::duplicates::ScanReport;

/// Serialize `report` as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(report: &ScanReport, writer: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer)?;
    writer.flush()
}
