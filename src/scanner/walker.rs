//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for lazily traversing a
//! directory tree and yielding every regular file under it. walkdir keeps
//! its own explicit stack, so arbitrarily deep trees never grow the call
//! stack.
//!
//! # Symlink policy
//!
//! - Symlinked directories are never descended into (no cycles possible).
//! - Symlinked regular files are reported using the target's size and are
//!   later hashed through the target's content.
//! - Broken or unreadable symlinks are yielded as [`ScanError`] values.
//! - A root path that is itself a symlink to a directory is followed.
//!
//! # Features
//!
//! - Deterministic order (children sorted by file name)
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max)
//! - Hidden file filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! walker.validate_root().unwrap();
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, PathError, ScanError, WalkerConfig};

/// Directory walker for lazy file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// The root is not inspected until [`Walker::validate_root`] or
    /// [`Walker::walk`] is called.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walk ends at the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check that the root exists, is a directory and can be listed.
    ///
    /// # Errors
    ///
    /// Returns the matching [`PathError`] variant otherwise.
    pub fn validate_root(&self) -> Result<(), PathError> {
        let metadata = fs::metadata(&self.root).map_err(|e| self.root_error(e))?;
        if !metadata.is_dir() {
            return Err(PathError::NotADirectory(self.root.clone()));
        }
        fs::read_dir(&self.root).map_err(|e| self.root_error(e))?;
        Ok(())
    }

    fn root_error(&self, error: std::io::Error) -> PathError {
        match error.kind() {
            ErrorKind::NotFound => PathError::NotFound(self.root.clone()),
            ErrorKind::PermissionDenied => PathError::PermissionDenied(self.root.clone()),
            _ => PathError::Io {
                path: self.root.clone(),
                source: error,
            },
        }
    }

    /// Build the ignore matcher from the configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Decide whether walkdir should yield (and descend into) an entry.
    fn keep_entry(&self, entry: &DirEntry, gitignore: Option<&Gitignore>) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        if self.config.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return false;
        }

        if let Some(gi) = gitignore {
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if gi.matched(relative, entry.file_type().is_dir()).is_ignore() {
                log::trace!("Ignoring: {}", entry.path().display());
                return false;
            }
        }

        true
    }

    /// Check if a file passes size filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Returns a lazy iterator over [`FileEntry`] results. Per-entry errors
    /// are yielded as [`ScanError`] values rather than stopping iteration.
    /// Entries are produced depth-first with siblings in file-name order.
    ///
    /// A missing or unreadable root shows up here as a single error item;
    /// call [`Walker::validate_root`] first to treat it as fatal.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let gitignore = self.build_gitignore();

        WalkDir::new(&self.root)
            .follow_links(false)
            .follow_root_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.keep_entry(entry, gitignore.as_ref()))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |result| match result {
                Ok(entry) => self.process_entry(&entry),
                Err(e) => Some(Err(self.handle_walkdir_error(e))),
            })
    }

    /// Turn a walkdir entry into a [`FileEntry`] if it is a regular file.
    fn process_entry(&self, entry: &DirEntry) -> Option<Result<FileEntry, ScanError>> {
        let file_type = entry.file_type();
        let path = entry.path();

        if file_type.is_dir() {
            return None;
        }

        let (size, is_symlink) = if file_type.is_file() {
            match entry.metadata() {
                Ok(m) => (m.len(), false),
                Err(e) => {
                    let io = std::io::Error::from(e);
                    return Some(Err(self.handle_io_error(path, io)));
                }
            }
        } else if file_type.is_symlink() {
            match fs::metadata(path) {
                Ok(m) if m.is_file() => (m.len(), true),
                Ok(m) if m.is_dir() => {
                    log::trace!("Not following symlinked directory: {}", path.display());
                    return None;
                }
                Ok(_) => {
                    log::trace!("Skipping symlink to special file: {}", path.display());
                    return None;
                }
                Err(e) => {
                    log::warn!("Skipping broken symlink {}: {}", path.display(), e);
                    return Some(Err(match e.kind() {
                        ErrorKind::PermissionDenied => {
                            ScanError::PermissionDenied(path.to_path_buf())
                        }
                        _ => ScanError::BrokenSymlink(path.to_path_buf()),
                    }));
                }
            }
        } else {
            log::trace!("Skipping special file: {}", path.display());
            return None;
        };

        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        Some(Ok(FileEntry {
            path: path.to_path_buf(),
            size,
            is_symlink,
        }))
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }

    /// Handle walkdir errors (unreadable directories, vanished entries).
    fn handle_walkdir_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let io = std::io::Error::from(error);
        self.handle_io_error(&path, io)
    }
}
