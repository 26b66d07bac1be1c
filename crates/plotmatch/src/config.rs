//! Resolver configuration, optionally read from a TOML file.

use std::path::{Path, PathBuf};

use plotmatch_core::{Hyperparameters, NormalizerConfig, PlotMatchError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File looked up in the working directory when no config path is given.
pub const CONFIG_FILE: &str = "plot2episode.toml";

pub const DEFAULT_TOP_N: usize = 5;

/// Everything a [`crate::Resolver`] can be tuned with.
///
/// ```toml
/// top_n = 3
///
/// [normalizer]
/// remove_stopwords = true
/// boilerplate = ['\(CC\)']
///
/// [embedding]
/// dimension = 512
///
/// [embedding.synonyms]
/// extra = [["tardis", "time machine"]]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub normalizer: NormalizerConfig,
    pub embedding: Hyperparameters,
    /// Runner-up candidates logged at debug level for each resolution.
    pub top_n: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            embedding: Hyperparameters::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_embedding(mut self, embedding: Hyperparameters) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidConfig` on malformed TOML or unknown
    /// keys, and when the embedding hyperparameters are out of range.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| PlotMatchError::InvalidConfig(e.to_string()))?;
        config.embedding.validate()?;
        Ok(config)
    }

    /// Reads the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the file cannot be read and
    /// `PlotMatchError::InvalidConfig` if it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| PlotMatchError::persistence(path, e))?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            PlotMatchError::InvalidConfig(reason) => {
                PlotMatchError::InvalidConfig(format!("{}: {reason}", path.display()))
            }
            other => other,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `<workdir>/plot2episode.toml` if it exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// As for [`ResolverConfig::load`].
    pub fn discover(workdir: &Path) -> Result<Self> {
        let path = Self::default_path(workdir);
        if path.is_file() {
            Self::load(&path)
        } else {
            debug!(workdir = %workdir.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    #[must_use]
    pub fn default_path(workdir: &Path) -> PathBuf {
        workdir.join(CONFIG_FILE)
    }
}
