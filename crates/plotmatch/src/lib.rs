//! # plotmatch
//!
//! Identifies which known episode of a TV series a broadcast guide plot
//! describes.
//!
//! The working directory holds one subdirectory per series with its
//! canonical plot corpus, its trained embedding model and an append-only
//! log of resolutions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plotmatch::{Resolver, ResolverConfig, SeriesName, TsvPlotSource};
//!
//! let resolver = Resolver::new("/var/lib/plotmatch", ResolverConfig::default())?;
//! let series = SeriesName::new("Columbo")?;
//!
//! resolver.ingest(&series, &TsvPlotSource::new("columbo.tsv"))?;
//! let outcome = resolver.resolve(&series, Some("Lt. Columbo suspects a famous conductor."))?;
//! println!("{outcome}");
//! # Ok::<(), plotmatch::PlotMatchError>(())
//! ```

pub mod config;
pub mod resolver;

pub use config::ResolverConfig;
pub use resolver::{Outcome, Resolver};

pub use plotmatch_core::{
    Candidate, EmbeddingModel, EpisodeId, Hyperparameters, IngestionError, Lexicon, MatchResult,
    Matcher, Normalizer, NormalizerConfig, PlotDocument, PlotMatchError, Result, SeriesCorpus,
    SeriesName,
};
pub use plotmatch_trainer::{
    AppendOutcome, CorpusStore, ModelManager, PlotSource, RawPlot, SeriesPaths, SourceBatch,
    SyncAction, SyncOutcome, TsvPlotSource,
};
