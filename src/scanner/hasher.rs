//! Streaming file hasher.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing content digests
//! of files without loading them into memory. Files are read in fixed-size
//! chunks of [`Hasher::with_buffer_size`] bytes and fed to the configured
//! [`HashAlgorithm`].
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("Cargo.toml")).unwrap();
//! println!("{} ({} bytes)", hash_to_hex(&digest.hash), digest.len);
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::HashError;

/// A 256-bit content digest.
pub type Hash = [u8; 32];

/// Digest of a file together with the number of bytes that went into it.
///
/// `len` is what was actually read, which can differ from the size the
/// walker saw if the file changed in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDigest {
    /// Content digest
    pub hash: Hash,
    /// Bytes fed to the digest
    pub len: u64,
}

/// Default read chunk size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm used to fingerprint file content.
///
/// Collisions are only a concern for accidental matches, so the fast
/// default is sufficient. SHA-256 is available for callers who want a
/// standardised digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Short lowercase name of the algorithm.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental digest state for one file.
enum DigestState {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(chunk);
            }
            Self::Sha256(h) => h.update(chunk),
        }
    }

    fn finalize(self) -> Hash {
        match self {
            Self::Blake3(h) => *h.finalize().as_bytes(),
            Self::Sha256(h) => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&h.finalize());
                out
            }
        }
    }
}

/// Streaming content hasher.
///
/// Cheap to share across threads behind an `Arc`; every call allocates its
/// own read buffer.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a BLAKE3 hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Use a different digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size in bytes.
    ///
    /// A size of zero is rejected by the finder before any file is read.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the shutdown flag checked between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the full content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or
    /// [`HashError::Cancelled`] if shutdown was requested mid-read.
    pub fn full_hash(&self, path: &Path) -> Result<FileDigest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        match self.digest_stream(file) {
            Ok(Some(digest)) => Ok(digest),
            Ok(None) => Err(HashError::Cancelled(path.to_path_buf())),
            Err(e) => Err(HashError::from_io(path, e)),
        }
    }

    /// Hash everything a reader yields.
    ///
    /// # Errors
    ///
    /// Propagates read errors. A shutdown request surfaces as an error of
    /// kind [`ErrorKind::Interrupted`].
    pub fn hash_reader<R: Read>(&self, reader: R) -> std::io::Result<Hash> {
        self.digest_stream(reader)?
            .map(|digest| digest.hash)
            .ok_or_else(|| std::io::Error::new(ErrorKind::Interrupted, "hashing cancelled"))
    }

    /// Feed `reader` through the digest chunk by chunk.
    ///
    /// Returns `Ok(None)` when shutdown interrupts the stream.
    fn digest_stream<R: Read>(&self, mut reader: R) -> std::io::Result<Option<FileDigest>> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size.max(1)];
        let mut len = 0u64;

        loop {
            if self.is_shutdown_requested() {
                return Ok(None);
            }
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..n]);
            len += n as u64;
        }

        Ok(Some(FileDigest {
            hash: state.finalize(),
            len,
        }))
    }
}

/// Convert a hash to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    use std::fmt::Write;
    hash.iter().fold(String::with_capacity(64), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
