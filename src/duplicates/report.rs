//! Scan results handed to the reporting boundary.
//!
//! A [`ScanReport`] carries the duplicate groups and, separately, the
//! [`Diagnostic`] records for every entry that had to be skipped. The two
//! never mix, so consumers can parse group data without looking at
//! error text.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::groups::DuplicateGroup;
use crate::scanner::{HashError, ScanError};

/// Pipeline stage at which an entry was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStage {
    /// Listing or inspecting the entry during traversal
    Walk,
    /// Opening or reading the file for hashing
    Hash,
}

/// A file or directory that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Path of the skipped entry
    pub path: PathBuf,
    /// Where in the pipeline it failed
    pub stage: DiagnosticStage,
    /// Human-readable cause
    pub message: String,
}

impl From<ScanError> for Diagnostic {
    fn from(err: ScanError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            stage: DiagnosticStage::Walk,
            message: err.to_string(),
        }
    }
}

impl From<HashError> for Diagnostic {
    fn from(err: HashError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            stage: DiagnosticStage::Hash,
            message: err.to_string(),
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Regular files produced by the walk
    pub total_files: usize,
    /// Files whose content was hashed successfully
    pub hashed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Entries skipped with a diagnostic
    pub skipped_files: usize,
    /// Number of hash-based duplicate groups
    pub hash_groups: usize,
    /// Number of size-based duplicate groups (0 unless size grouping is on)
    pub size_groups: usize,
    /// Redundant copies across hash groups (excluding one original each)
    pub duplicate_files: usize,
    /// Space that removing the redundant copies would free
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }

    /// Format hashed bytes as human-readable string.
    #[must_use]
    pub fn bytes_hashed_display(&self) -> String {
        bytesize::ByteSize(self.bytes_hashed).to_string()
    }
}

/// Complete result of one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Groups of files with identical content, in first-seen order
    pub hash_groups: Vec<DuplicateGroup>,
    /// Groups of files with identical size, in first-seen order
    pub size_groups: Vec<DuplicateGroup>,
    /// Entries skipped during the walk or while hashing
    pub diagnostics: Vec<Diagnostic>,
    /// Counters for the whole run
    pub summary: ScanSummary,
}

impl ScanReport {
    /// All groups: hash groups first, then size groups.
    pub fn groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.hash_groups.iter().chain(self.size_groups.iter())
    }

    /// Check whether any duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.hash_groups.is_empty() || !self.size_groups.is_empty()
    }

    /// Check whether every entry could be processed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
