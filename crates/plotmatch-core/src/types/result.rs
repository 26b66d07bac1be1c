use serde::{Deserialize, Serialize};

use super::episode::EpisodeId;

/// Quality reported when the query carries no usable text.
pub const NEUTRAL_QUALITY: f32 = 0.5;

/// One ranked episode and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The ranked episode.
    pub episode_id: EpisodeId,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub similarity: f32,
}

impl Candidate {
    /// Similarity rescaled into `[0.0, 1.0]`; 0.5 means unrelated.
    #[must_use]
    pub fn quality(&self) -> f32 {
        similarity_to_quality(self.similarity)
    }
}

/// Maps cosine similarity onto the `[0.0, 1.0]` quality scale.
#[must_use]
pub fn similarity_to_quality(similarity: f32) -> f32 {
    ((similarity.clamp(-1.0, 1.0) + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// The outcome of resolving one query plot.
///
/// `quality` is a relative ranking score, not a probability. Callers decide
/// their own acceptance threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Best candidate, or `None` when nothing could be compared.
    pub episode_id: Option<EpisodeId>,
    /// Confidence in `[0.0, 1.0]`.
    pub quality: f32,
    /// The normalized query, kept for audit.
    pub query_text: String,
}

impl MatchResult {
    /// A result for the best-ranked candidate.
    #[must_use]
    pub fn matched(candidate: &Candidate, query_text: impl Into<String>) -> Self {
        Self {
            episode_id: Some(candidate.episode_id.clone()),
            quality: candidate.quality(),
            query_text: query_text.into(),
        }
    }

    /// A result carrying no candidate.
    #[must_use]
    pub fn none(quality: f32, query_text: impl Into<String>) -> Self {
        Self {
            episode_id: None,
            quality,
            query_text: query_text.into(),
        }
    }

    #[must_use]
    pub fn is_match(&self) -> bool {
        self.episode_id.is_some()
    }

    /// `<episode_id|NONE> <quality> <query_text>`, the result log format.
    #[must_use]
    pub fn log_line(&self) -> String {
        let id = self
            .episode_id
            .as_ref()
            .map_or("NONE", EpisodeId::as_str);
        format!("{id} {:.4} {}", self.quality, self.query_text)
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchResult(")?;
        match self.episode_id {
            Some(ref id) => write!(f, "episode={id}")?,
            None => write!(f, "episode=NONE")?,
        }
        write!(f, ", quality={:.2}", self.quality)?;
        write!(f, ")")
    }
}
