//! Run configuration and configuration errors.

use thiserror::Error;

use crate::variant::RegionParseError;

/// Genomic positions per index batch.
pub const DEFAULT_BATCH_SIZE: u32 = 1_000_000;
/// Trio count above which a run is split into several batches.
pub const DEFAULT_MAX_TRIOS_PER_BATCH: usize = 500;

/// Errors detected while validating a job before any processing starts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No trio was given.
    #[error("empty trio list")]
    EmptyTrioList,
    /// A trio does not have exactly three members.
    #[error("trio #{index} '{text}' has {found} members, expected father,mother,child")]
    TrioArity {
        /// Position of the trio in the list (0-based).
        index: usize,
        /// Raw trio text.
        text: String,
        /// Number of members found.
        found: usize,
    },
    /// A trio has no child.
    #[error("trio #{index} '{text}' has no child")]
    MissingChild {
        /// Position of the trio in the list (0-based).
        index: usize,
        /// Raw trio text.
        text: String,
    },
    /// A sample name is not registered.
    #[error("unknown sample '{name}' in trio #{index}")]
    UnknownSample {
        /// Sample name.
        name: String,
        /// Position of the trio in the list (0-based).
        index: usize,
    },
    /// The same child appears in more than one trio.
    #[error("sample '{name}' is the child of more than one trio")]
    DuplicateChild {
        /// Sample name or id.
        name: String,
    },
    /// The named cohort is not registered.
    #[error("unknown cohort '{0}'")]
    UnknownCohort(String),
    /// No output location was given.
    #[error("missing output location")]
    MissingOutput,
    /// The region filter does not parse.
    #[error(transparent)]
    Region(#[from] RegionParseError),
    /// A numeric setting is out of range.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Why the value is rejected.
        reason: String,
    },
}

/// Tunables for index construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexConfig {
    /// Genomic positions per batch; workers and entry flushes align to it.
    pub batch_size: u32,
    /// Trios per job submission.
    pub max_trios_per_batch: usize,
    /// Resolve overlapping calls per source file before encoding.
    pub resolve_conflicts: bool,
    /// Worker threads; `None` uses the rayon default.
    pub workers: Option<usize>,
    /// Log per-region progress.
    pub verbose: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_trios_per_batch: DEFAULT_MAX_TRIOS_PER_BATCH,
            resolve_conflicts: false,
            workers: None,
            verbose: false,
        }
    }
}

impl IndexConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size in positions.
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the trio threshold for splitting runs.
    pub fn with_max_trios_per_batch(mut self, max_trios: usize) -> Self {
        self.max_trios_per_batch = max_trios;
        self
    }

    /// Enable conflict resolution before encoding.
    pub fn with_conflict_resolution(mut self, enabled: bool) -> Self {
        self.resolve_conflicts = enabled;
        self
    }

    /// Pin the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Enable verbose logging.
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Reject values that cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "batch_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.max_trios_per_batch == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_trios_per_batch",
                reason: "must be > 0".to_string(),
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidSetting {
                name: "workers",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// First position of the batch containing `position`.
    pub fn batch_start(&self, position: u32) -> u32 {
        batch_start(position, self.batch_size)
    }
}

pub(crate) fn batch_start(position: u32, batch_size: u32) -> u32 {
    position / batch_size * batch_size
}
