pub mod document;
pub mod episode;
pub mod result;

pub use document::{PlotDocument, SeriesCorpus};
pub use episode::{EpisodeId, SeriesName};
pub use result::{Candidate, MatchResult, NEUTRAL_QUALITY};
