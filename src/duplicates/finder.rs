//! Duplicate finder: walk, hash and group in one pass.
//!
//! # Overview
//!
//! [`DuplicateFinder`] consumes the walker's lazy sequence in batches of
//! [`HASH_BATCH_SIZE`] files. Each batch is hashed on a dedicated rayon pool
//! of `io_threads` workers; the results come back in batch order and are
//! folded into the scan's [`GroupMap`]s on the calling thread, which is the
//! only place the maps are mutated.
//!
//! Files that cannot be read are recorded as [`Diagnostic`]s and join no
//! group. Only an unusable root, an invalid configuration or a shutdown
//! request end the scan early.
//!
//! # Cancellation
//!
//! When the shutdown flag is set, the walk stops, no further files are
//! handed to the pool, in-flight reads stop at their next chunk and
//! [`DuplicateFinder::find_duplicates`] returns [`FinderError::Interrupted`].
//! Partial groups are never returned.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_group_by_size(true));
//! let report = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! for group in report.groups() {
//!     println!("{} {}: {:?}", group.kind(), group.fingerprint.key_string(), group.paths);
//! }
//! for diag in &report.diagnostics {
//!     eprintln!("skipped {}: {}", diag.path.display(), diag.message);
//! }
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::groups::GroupMap;
use super::report::{Diagnostic, ScanReport, ScanSummary};
use crate::progress::ProgressCallback;
use crate::scanner::{
    FileDigest, FileEntry, Hash, HashAlgorithm, HashError, Hasher, PathError, ScanError, Walker,
    WalkerConfig, DEFAULT_BUFFER_SIZE,
};

/// Number of walked files handed to the hashing pool at a time.
pub const HASH_BATCH_SIZE: usize = 256;

/// Files above this size are logged before hashing.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of worker threads reading and hashing files.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Digest used for content fingerprints.
    pub algorithm: HashAlgorithm,
    /// Read chunk size in bytes. Must be non-zero.
    pub buffer_size: usize,
    /// Also report groups of files sharing a byte size.
    pub group_by_size: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("algorithm", &self.algorithm)
            .field("buffer_size", &self.buffer_size)
            .field("group_by_size", &self.group_by_size)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            algorithm: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            group_by_size: false,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Enable or disable size-based groups.
    #[must_use]
    pub fn with_group_by_size(mut self, enabled: bool) -> Self {
        self.group_by_size = enabled;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Errors that end a scan without a report.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The scan root is missing, not a directory or unreadable.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The hashing setup is unusable (zero buffer, zero threads, no pool).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Everything one scan accumulates.
struct ScanState {
    by_hash: GroupMap<Hash>,
    by_size: Option<GroupMap<u64>>,
    diagnostics: Vec<Diagnostic>,
    summary: ScanSummary,
}

impl ScanState {
    fn new(group_by_size: bool) -> Self {
        Self {
            by_hash: GroupMap::new(),
            by_size: group_by_size.then(GroupMap::new),
            diagnostics: Vec::new(),
            summary: ScanSummary::default(),
        }
    }

    fn record_scan_error(&mut self, err: ScanError) {
        log::debug!("Skipping entry: {}", err);
        self.diagnostics.push(Diagnostic::from(err));
    }

    fn record_hash(&mut self, mut file: FileEntry, result: Result<FileDigest, HashError>) {
        match result {
            Ok(digest) => {
                if digest.len != file.size {
                    log::debug!(
                        "{} changed size since listing ({} -> {} bytes)",
                        file.path.display(),
                        file.size,
                        digest.len
                    );
                }
                // Group by what was read, not by what the walk saw
                file.size = digest.len;
                self.summary.hashed_files += 1;
                self.summary.bytes_hashed += file.size;
                self.by_hash.insert(digest.hash, &file);
                if let Some(ref mut by_size) = self.by_size {
                    by_size.insert(file.size, &file);
                }
            }
            // Only produced after shutdown; the scan is abandoned anyway
            Err(HashError::Cancelled(_)) => {}
            Err(e) => {
                log::warn!("Failed to hash {}: {}", file.path.display(), e);
                self.diagnostics.push(Diagnostic::from(e));
            }
        }
    }

    fn finish(self, started: Instant) -> ScanReport {
        let Self {
            by_hash,
            by_size,
            diagnostics,
            mut summary,
        } = self;

        log::debug!(
            "{} distinct hashes, {} distinct sizes",
            by_hash.len(),
            by_size.as_ref().map_or(0, GroupMap::len)
        );

        let hash_groups = by_hash.into_duplicate_groups();
        let size_groups = by_size
            .map(GroupMap::into_duplicate_groups)
            .unwrap_or_default();

        summary.skipped_files = diagnostics.len();
        summary.hash_groups = hash_groups.len();
        summary.size_groups = size_groups.len();
        summary.duplicate_files = hash_groups.iter().map(|g| g.duplicate_count()).sum();
        summary.reclaimable_space = hash_groups.iter().map(|g| g.wasted_space()).sum();
        summary.scan_duration = started.elapsed();

        ScanReport {
            hash_groups,
            size_groups,
            diagnostics,
            summary,
        }
    }
}

/// Duplicate finder that runs walk, hashing and grouping.
///
/// # Example
///
/// ```no_run
/// use dupescan::duplicates::DuplicateFinder;
/// use std::path::Path;
///
/// let finder = DuplicateFinder::with_defaults();
/// match finder.find_duplicates(Path::new(".")) {
///     Ok(report) => {
///         println!("Found {} duplicate groups", report.hash_groups.len());
///         println!("Can reclaim {}", report.summary.reclaimable_display());
///     }
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new()
            .with_algorithm(config.algorithm)
            .with_buffer_size(config.buffer_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The configuration is invalid
    /// - The path does not exist, is not a directory or cannot be listed
    /// - The scan is interrupted by shutdown signal
    ///
    /// Unreadable entries below the root are not errors; they appear in
    /// [`ScanReport::diagnostics`].
    pub fn find_duplicates(&self, path: &Path) -> Result<ScanReport, FinderError> {
        self.validate_config()?;

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        walker.validate_root()?;

        log::info!(
            "Starting duplicate scan of {} ({}, {} threads)",
            path.display(),
            self.config.algorithm,
            self.config.io_threads
        );

        self.run(walker.walk())
    }

    /// Group an already collected sequence of files.
    ///
    /// Use this when files come from somewhere other than the walker.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` on invalid configuration or shutdown.
    pub fn find_duplicates_from_files<I>(&self, files: I) -> Result<ScanReport, FinderError>
    where
        I: IntoIterator<Item = FileEntry>,
    {
        self.validate_config()?;
        self.run(files.into_iter().map(Ok))
    }

    fn validate_config(&self) -> Result<(), FinderError> {
        if self.config.buffer_size == 0 {
            return Err(FinderError::InvalidConfig(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        if self.config.io_threads == 0 {
            return Err(FinderError::InvalidConfig(
                "io_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool, FinderError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .thread_name(|i| format!("dupescan-hash-{i}"))
            .build()
            .map_err(|e| FinderError::InvalidConfig(format!("failed to start hashing pool: {e}")))
    }

    /// Drive the descriptor sequence through hashing and grouping.
    fn run<I>(&self, entries: I) -> Result<ScanReport, FinderError>
    where
        I: Iterator<Item = Result<FileEntry, ScanError>>,
    {
        let started = Instant::now();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let pool = self.build_pool()?;
        let mut state = ScanState::new(self.config.group_by_size);
        let processed = AtomicUsize::new(0);
        let mut batch = Vec::with_capacity(HASH_BATCH_SIZE);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("scanning", 0);
        }

        for entry in entries {
            match entry {
                Ok(file) => {
                    state.summary.total_files += 1;
                    batch.push(file);
                    if batch.len() >= HASH_BATCH_SIZE {
                        self.hash_batch(&pool, std::mem::take(&mut batch), &processed, &mut state);
                    }
                }
                Err(e) => state.record_scan_error(e),
            }

            if self.config.is_shutdown_requested() {
                break;
            }
        }

        if !batch.is_empty() && !self.config.is_shutdown_requested() {
            self.hash_batch(&pool, batch, &processed, &mut state);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("scanning");
        }

        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        let report = state.finish(started);

        log::info!(
            "Scan complete: {} files, {} hashed, {} duplicate groups, {} reclaimable, {} skipped",
            report.summary.total_files,
            report.summary.bytes_hashed_display(),
            report.summary.hash_groups,
            report.summary.reclaimable_display(),
            report.summary.skipped_files
        );

        Ok(report)
    }

    /// Hash one batch on the pool and fold the results in batch order.
    fn hash_batch(
        &self,
        pool: &rayon::ThreadPool,
        files: Vec<FileEntry>,
        processed: &AtomicUsize,
        state: &mut ScanState,
    ) {
        log::debug!("Hashing batch of {} files", files.len());

        let results: Vec<(FileEntry, Result<FileDigest, HashError>)> = pool.install(|| {
            files
                .into_par_iter()
                .map(|file| {
                    if self.config.is_shutdown_requested() {
                        let err = HashError::Cancelled(file.path.clone());
                        return (file, Err(err));
                    }

                    if file.size > LARGE_FILE_THRESHOLD {
                        log::debug!(
                            "Hashing large file ({} MB): {}",
                            file.size / (1024 * 1024),
                            file.path.display()
                        );
                    }

                    let result = self.hasher.full_hash(&file.path);

                    if let Some(ref callback) = self.config.progress_callback {
                        let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(current, file.path.to_string_lossy().as_ref());
                        if let Ok(ref digest) = result {
                            callback.on_item_completed(digest.len);
                        }
                    }

                    log::trace!("Hashed {}", file.path.display());
                    (file, result)
                })
                .collect()
        });

        for (file, result) in results {
            state.record_hash(file, result);
        }
    }
}
