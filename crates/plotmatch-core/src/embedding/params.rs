use serde::{Deserialize, Serialize};

use super::lexicon::Lexicon;
use crate::error::{PlotMatchError, Result};

pub const DEFAULT_DIMENSION: usize = 256;
pub const DEFAULT_NONZEROS: usize = 8;
pub const DEFAULT_WINDOW: usize = 2;
pub const DEFAULT_CONTEXT_WEIGHT: f32 = 0.5;
pub const DEFAULT_SEED: u64 = 0x5EED_2015_1202;

/// Embedding hyperparameters, fixed when a series' model is first trained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Vector dimension.
    pub dimension: usize,
    /// Non-zero entries per index vector.
    pub nonzeros: usize,
    /// Neighbours on each side that feed a term's context vector.
    pub window: usize,
    /// Weight of the learned context relative to the index vector.
    pub context_weight: f32,
    /// Seed for index vector generation.
    pub seed: u64,
    /// Synonym groups.
    pub synonyms: Lexicon,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            nonzeros: DEFAULT_NONZEROS,
            window: DEFAULT_WINDOW,
            context_weight: DEFAULT_CONTEXT_WEIGHT,
            seed: DEFAULT_SEED,
            synonyms: Lexicon::default(),
        }
    }
}

impl Hyperparameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_nonzeros(mut self, nonzeros: usize) -> Self {
        self.nonzeros = nonzeros;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_context_weight(mut self, weight: f32) -> Self {
        self.context_weight = weight;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_synonyms(mut self, synonyms: Lexicon) -> Self {
        self.synonyms = synonyms;
        self
    }

    /// Checks that the parameters describe a usable embedding space.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(16..=4096).contains(&self.dimension) {
            return Err(PlotMatchError::InvalidConfig(format!(
                "dimension must be within 16..=4096, got {}",
                self.dimension
            )));
        }
        if self.nonzeros < 2 || self.nonzeros > self.dimension / 2 {
            return Err(PlotMatchError::InvalidConfig(format!(
                "nonzeros must be within 2..={}, got {}",
                self.dimension / 2,
                self.nonzeros
            )));
        }
        if self.window > 10 {
            return Err(PlotMatchError::InvalidConfig(format!(
                "window must be at most 10, got {}",
                self.window
            )));
        }
        if !self.context_weight.is_finite() || !(0.0..=4.0).contains(&self.context_weight) {
            return Err(PlotMatchError::InvalidConfig(format!(
                "context_weight must be within 0.0..=4.0, got {}",
                self.context_weight
            )));
        }
        Ok(())
    }
}
