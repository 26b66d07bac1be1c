use std::path::PathBuf;

use thiserror::Error;

/// A single canonical plot that was rejected during corpus ingestion.
///
/// Ingestion failures never abort a batch: the offending document is
/// skipped and reported, the rest of the batch is still stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestionError {
    /// The episode identifier does not follow the accepted id grammar.
    #[error("malformed episode id {id:?}: {reason}")]
    MalformedEpisodeId {
        /// The identifier as supplied.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The plot text normalizes to zero tokens.
    #[error("plot for episode {episode_id} has no usable text")]
    UnusablePlot {
        /// The episode whose plot was rejected.
        episode_id: String,
    },

    /// A source record could not be split into an id and a plot.
    #[error("malformed plot record at line {line}: {reason}")]
    MalformedRecord {
        /// One-based line number in the source.
        line: usize,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors that can occur during plotmatch operations.
#[derive(Debug, Error)]
pub enum PlotMatchError {
    /// A document could not be ingested.
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// Corpus or model storage is unreadable or unwritable.
    #[error("storage error at {path}: {reason}")]
    Persistence {
        /// The file or directory that failed.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// The query was normalized differently from the model's training data.
    #[error("normalizer configuration mismatch: model trained with {trained}, query uses {query}")]
    ConfigMismatch {
        /// Fingerprint recorded in the model.
        trained: String,
        /// Fingerprint of the query-time normalizer.
        query: String,
    },

    /// The working directory is missing or not a directory.
    #[error("working directory {path} is not accessible: {reason}")]
    InvalidWorkDir {
        /// The directory as supplied.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// The series name cannot be used as a storage key.
    #[error("invalid series name {0:?}")]
    InvalidSeriesName(String),

    /// A configuration value is out of range or unparsable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A boilerplate pattern failed to compile.
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),
}

impl PlotMatchError {
    /// Builds a [`PlotMatchError::Persistence`] from any displayable failure.
    pub fn persistence(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Process exit status for this failure. Never zero.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidWorkDir { .. }
            | Self::InvalidSeriesName(_)
            | Self::InvalidConfig(_)
            | Self::Regex(_) => 2,
            Self::Persistence { .. } => 3,
            Self::ConfigMismatch { .. } => 4,
            Self::Ingestion(_) => 1,
        }
    }
}

/// Result type alias for plotmatch operations.
pub type Result<T> = std::result::Result<T, PlotMatchError>;
