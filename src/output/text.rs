//! Plain text listing of duplicate groups.
//!
//! ```text
//! Duplicate files with hash 9f86d081884c7d65...
//! /data/a.txt
//! /data/copy/a.txt
//!
//! Duplicate files with size 4096 bytes
//! /data/b.bin
//! /data/c.bin
//!
//! ```

use std::io::{self, Write};

use crate::duplicates::{DuplicateGroup, Fingerprint, ScanReport};

/// Header line introducing one group.
#[must_use]
pub fn group_header(group: &DuplicateGroup) -> String {
    match group.fingerprint {
        Fingerprint::Hash(_) => {
            format!("Duplicate files with hash {}", group.fingerprint.key_string())
        }
        Fingerprint::Size(size) => format!("Duplicate files with size {size} bytes"),
    }
}

/// Write every group: hash groups first, then size groups.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_groups<W: Write>(report: &ScanReport, writer: &mut W) -> io::Result<()> {
    for group in report.groups() {
        writeln!(writer, "{}", group_header(group))?;
        for path in &group.paths {
            writeln!(writer, "{}", path.display())?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}
