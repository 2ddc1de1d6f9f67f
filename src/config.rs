//! Layered application configuration.
//!
//! Settings are merged with figment in this order (later wins):
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file: `--config FILE`, else `config.toml` in the platform config
//!    directory. Only the platform file may be absent.
//! 3. Environment variables prefixed `DUPESCAN_` (e.g. `DUPESCAN_IO_THREADS=8`)
//! 4. CLI flags ([`Config::apply_scan_args`])

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::duplicates::FinderConfig;
use crate::scanner::{HashAlgorithm, WalkerConfig, DEFAULT_BUFFER_SIZE};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Errors while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A provider could not be read or a value has the wrong type.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A file named with `--config` does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// The merged values are inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of hashing threads
    pub io_threads: usize,
    /// Content digest
    pub algorithm: HashAlgorithm,
    /// Read chunk size in bytes
    pub buffer_size: usize,
    /// Also report size-based groups
    pub group_by_size: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
    /// Gitignore-style patterns to skip
    pub ignore_patterns: Vec<String>,
    /// Smallest file size to consider
    pub min_size: Option<u64>,
    /// Largest file size to consider
    pub max_size: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            algorithm: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            group_by_size: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            min_size: None,
            max_size: None,
        }
    }
}

impl Config {
    /// Build the provider stack without extracting it.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match config_file.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => {
                log::debug!("Reading configuration from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => log::debug!("No configuration directory available"),
        }

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] if `config_file` does not exist
    /// and [`ConfigError::Load`] for malformed TOML or mistyped values.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
        }
        Self::figment(config_file)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupescan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Override values with flags given on the command line.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if args.by_size {
            self.group_by_size = true;
        }
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if args.min_size.is_some() {
            self.min_size = args.min_size;
        }
        if args.max_size.is_some() {
            self.max_size = args.max_size;
        }
        if args.skip_hidden {
            self.skip_hidden = true;
        }
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
    }

    /// Check that the merged values make sense together.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid("io_threads must be at least 1".into()));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "buffer_size must be greater than zero".into(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(ConfigError::Invalid(format!(
                    "min_size ({min}) is larger than max_size ({max})"
                )));
            }
        }
        Ok(())
    }

    /// Translate into the finder's configuration.
    #[must_use]
    pub fn to_finder_config(&self) -> FinderConfig {
        let walker_config = WalkerConfig::default()
            .with_skip_hidden(self.skip_hidden)
            .with_size_range(self.min_size, self.max_size)
            .with_ignore_patterns(self.ignore_patterns.clone());

        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_algorithm(self.algorithm)
            .with_buffer_size(self.buffer_size)
            .with_group_by_size(self.group_by_size)
            .with_walker_config(walker_config)
    }
}
