//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Grouping files by content hash and by size ([`groups`])
//! - Orchestrating walk, parallel hashing and grouping ([`finder`])
//! - The structured result and skipped-entry diagnostics ([`report`])

pub mod finder;
pub mod groups;
pub mod report;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, HASH_BATCH_SIZE};
pub use groups::{DuplicateGroup, Fingerprint, GroupKey, GroupMap, KeyKind};
pub use report::{Diagnostic, DiagnosticStage, ScanReport, ScanSummary};
