//! # plotmatch core
//!
//! Text normalization, per-series episode embeddings and similarity
//! matching. Identifies which known episode of a series a noisy broadcast
//! guide plot describes.
//!
//! ## Quick Start
//!
//! ```rust
//! use plotmatch_core::{
//!     EmbeddingModel, EpisodeId, Hyperparameters, Matcher, Normalizer, NormalizerConfig,
//!     PlotDocument, SeriesName,
//! };
//!
//! let normalizer = Normalizer::new(NormalizerConfig::default()).unwrap();
//! let plots = [
//!     ("E1", "A detective investigates a murder at a mansion."),
//!     ("E2", "A chef competes in a cooking contest."),
//! ];
//! let docs: Vec<PlotDocument> = plots
//!     .iter()
//!     .map(|(id, text)| PlotDocument {
//!         episode_id: EpisodeId::parse(*id).unwrap(),
//!         raw_text: text.to_string(),
//!         clean_tokens: normalizer.normalize(text),
//!         added_in: 1,
//!     })
//!     .collect();
//!
//! let series = SeriesName::new("Example").unwrap();
//! let mut model = EmbeddingModel::new(series, Hyperparameters::default(), &normalizer).unwrap();
//! model.train(&docs);
//!
//! let matcher = Matcher::new(normalizer);
//! let result = matcher
//!     .closest_match("A sleuth solves a killing in a large house.", &model)
//!     .unwrap();
//!
//! assert_eq!(result.episode_id.as_ref().map(EpisodeId::as_str), Some("E1"));
//! assert!(result.quality > 0.5);
//! ```
pub mod embedding;
pub mod error;
pub mod matcher;
pub mod text;
pub mod types;

// Re-export primary API
pub use embedding::{EmbeddingModel, Hyperparameters, Lexicon};
pub use error::{IngestionError, PlotMatchError, Result};
pub use matcher::Matcher;
pub use text::{Normalizer, NormalizerConfig};
pub use types::{Candidate, EpisodeId, MatchResult, PlotDocument, SeriesCorpus, SeriesName};
