//! Fingerprint grouping and duplicate group materialization.
//!
//! # Overview
//!
//! A [`GroupMap`] accumulates the paths seen for each fingerprint key during
//! one scan. Keys remember the order in which they were first seen and each
//! group keeps its paths in insertion order, so the output follows traversal
//! order without any sorting.
//!
//! Content hashes and byte sizes are independent key namespaces: a scan
//! that groups by both keeps one `GroupMap<Hash>` and one `GroupMap<u64>`.
//!
//! # Example
//!
//! ```
//! use dupescan::duplicates::{GroupMap, KeyKind};
//! use dupescan::scanner::FileEntry;
//! use std::path::PathBuf;
//!
//! let mut by_size: GroupMap<u64> = GroupMap::new();
//! for (name, size) in [("a", 10), ("b", 10), ("c", 20)] {
//!     let file = FileEntry::new(PathBuf::from(name), size);
//!     by_size.insert(file.size, &file);
//! }
//!
//! let groups = by_size.into_duplicate_groups();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].kind(), KeyKind::Size);
//! assert_eq!(groups[0].paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// Which fingerprint namespace a group belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Full content digest
    Hash,
    /// Raw byte size
    Size,
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash => f.write_str("hash"),
            Self::Size => f.write_str("size"),
        }
    }
}

/// A duplicate-detection key derived from file content or size.
///
/// Serializes as `{"kind": "hash", "key": "<hex>"}` or
/// `{"kind": "size", "key": <bytes>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum Fingerprint {
    /// Content digest
    Hash(#[serde(serialize_with = "serialize_hex")] Hash),
    /// Byte size
    Size(u64),
}

fn serialize_hex<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash_to_hex(hash))
}

impl Fingerprint {
    /// The namespace of this fingerprint.
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            Self::Hash(_) => KeyKind::Hash,
            Self::Size(_) => KeyKind::Size,
        }
    }

    /// Key rendered for display: hex digest or decimal byte count.
    #[must_use]
    pub fn key_string(&self) -> String {
        match self {
            Self::Hash(hash) => hash_to_hex(hash),
            Self::Size(size) => size.to_string(),
        }
    }
}

/// Key types a [`GroupMap`] can be built over.
pub trait GroupKey: Copy + Eq + std::hash::Hash {
    /// Wrap the raw key as a [`Fingerprint`].
    fn fingerprint(&self) -> Fingerprint;
}

impl GroupKey for Hash {
    fn fingerprint(&self) -> Fingerprint {
        Fingerprint::Hash(*self)
    }
}

impl GroupKey for u64 {
    fn fingerprint(&self) -> Fingerprint {
        Fingerprint::Size(*self)
    }
}

/// Two or more files sharing a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Shared fingerprint
    #[serde(flatten)]
    pub fingerprint: Fingerprint,
    /// Size in bytes of each member
    pub size: u64,
    /// Member paths in traversal order
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// The namespace this group was found in.
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        self.fingerprint.kind()
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of redundant copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Bytes that removing the redundant copies would free.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Check whether `path` is a member of this group.
    #[must_use]
    pub fn contains(&self, path: &std::path::Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

#[derive(Debug, Clone)]
struct Bucket<K> {
    key: K,
    size: u64,
    paths: Vec<PathBuf>,
}

/// Mapping from fingerprint key to the ordered paths that share it.
///
/// Owned by a single scan; nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct GroupMap<K> {
    index: HashMap<K, usize>,
    buckets: Vec<Bucket<K>>,
}

impl<K: GroupKey> Default for GroupMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: GroupKey> GroupMap<K> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            buckets: Vec::new(),
        }
    }

    /// Append `file` to the group for `key`.
    ///
    /// The group's size is taken from the first file inserted under `key`.
    /// Callers pass the size that was actually hashed, so every member of a
    /// content group carries the same length.
    pub fn insert(&mut self, key: K, file: &FileEntry) {
        match self.index.get(&key) {
            Some(&i) => self.buckets[i].paths.push(file.path.clone()),
            None => {
                self.index.insert(key, self.buckets.len());
                self.buckets.push(Bucket {
                    key,
                    size: file.size,
                    paths: vec![file.path.clone()],
                });
            }
        }
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no file has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Keep only keys with two or more paths, in first-seen key order.
    #[must_use]
    pub fn into_duplicate_groups(self) -> Vec<DuplicateGroup> {
        self.buckets
            .into_iter()
            .filter(|b| b.paths.len() > 1)
            .map(|b| DuplicateGroup {
                fingerprint: b.key.fingerprint(),
                size: b.size,
                paths: b.paths,
            })
            .collect()
    }
}
