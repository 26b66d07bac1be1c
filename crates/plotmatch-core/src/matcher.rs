//! # Episode Matcher
//!
//! Ranks a series' episodes by cosine similarity to a query plot.

use tracing::{debug, warn};

use crate::embedding::EmbeddingModel;
use crate::embedding::vector::cosine;
use crate::error::{PlotMatchError, Result};
use crate::text::Normalizer;
use crate::types::{Candidate, MatchResult, NEUTRAL_QUALITY};

/// Similarities closer than this are ties, broken by episode order.
pub const TIE_EPSILON: f32 = 1e-6;

/// Matches query plots against a trained model.
///
/// Holds the query-time normalizer; a model only accepts queries whose
/// normalizer fingerprint equals the one it was trained with.
#[derive(Debug, Clone)]
pub struct Matcher {
    normalizer: Normalizer,
}

impl Matcher {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    #[must_use]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Fails if `model` was trained with a different normalizer configuration.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::ConfigMismatch` with both fingerprints.
    pub fn check_config(&self, model: &EmbeddingModel) -> Result<()> {
        if model.fingerprint() == self.normalizer.fingerprint() {
            return Ok(());
        }
        warn!(
            series = %model.series_name,
            trained = model.fingerprint(),
            query = self.normalizer.fingerprint(),
            "rejecting query: normalizer configuration differs from training"
        );
        Err(PlotMatchError::ConfigMismatch {
            trained: model.fingerprint().to_string(),
            query: self.normalizer.fingerprint().to_string(),
        })
    }

    /// All episodes of `model`, most similar to `query_text` first.
    ///
    /// Similarities within [`TIE_EPSILON`] of each other are ordered by
    /// episode id. Empty when the model has no vectors or the query has no
    /// usable text.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::ConfigMismatch` (see [`Matcher::check_config`]).
    pub fn rank(&self, query_text: &str, model: &EmbeddingModel) -> Result<Vec<Candidate>> {
        self.check_config(model)?;
        let tokens = self.normalizer.normalize(query_text);
        Ok(rank_tokens(&tokens, model))
    }

    /// Best-matching episode for `query_text`.
    ///
    /// - a model without vectors yields no episode and quality `0.0`;
    /// - a query with no usable text yields no episode and quality `0.5`;
    /// - otherwise the top-ranked episode with quality `(similarity + 1) / 2`.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::ConfigMismatch` (see [`Matcher::check_config`]).
    pub fn closest_match(&self, query_text: &str, model: &EmbeddingModel) -> Result<MatchResult> {
        self.check_config(model)?;

        let tokens = self.normalizer.normalize(query_text);
        let cleaned = tokens.join(" ");
        debug!(series = %model.series_name, query = %cleaned, "closest_match");

        if model.is_empty() {
            return Ok(MatchResult::none(0.0, cleaned));
        }

        let ranking = rank_tokens(&tokens, model);
        let result = match ranking.first() {
            Some(best) => MatchResult::matched(best, cleaned),
            None => MatchResult::none(NEUTRAL_QUALITY, cleaned),
        };

        debug!(
            series = %model.series_name,
            episode = ?result.episode_id,
            quality = result.quality,
            candidates = ranking.len(),
            "ranked candidates"
        );
        Ok(result)
    }
}

fn rank_tokens(tokens: &[String], model: &EmbeddingModel) -> Vec<Candidate> {
    if model.is_empty() {
        return Vec::new();
    }
    let Some(query) = model.infer(tokens) else {
        return Vec::new();
    };

    let mut ranked: Vec<Candidate> = model
        .vectors()
        .map(|(id, vector)| Candidate {
            episode_id: id.clone(),
            similarity: cosine(&query, vector),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.episode_id.cmp(&b.episode_id))
    });

    // Runs of near-equal similarity are ordered by episode id.
    let mut start = 0;
    while start < ranked.len() {
        let head = ranked[start].similarity;
        let mut end = start + 1;
        while end < ranked.len() && head - ranked[end].similarity <= TIE_EPSILON {
            end += 1;
        }
        ranked[start..end].sort_by(|a, b| a.episode_id.cmp(&b.episode_id));
        start = end;
    }

    ranked
}
