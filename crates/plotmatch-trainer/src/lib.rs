//! # plotmatch trainer
//!
//! Persistent state behind episode matching: the per-series corpus of
//! canonical plots (SQLite) and the embedding model trained on it, kept
//! current incrementally as plots arrive.

pub mod corpus;
pub mod layout;
pub mod manager;
pub mod persist;
pub mod source;

pub use corpus::{AppendOutcome, CorpusStore, RawPlot};
pub use layout::SeriesPaths;
pub use manager::{ModelManager, SyncAction, SyncOutcome};
pub use source::{PlotSource, SourceBatch, TsvPlotSource};
