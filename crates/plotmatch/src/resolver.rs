//! # Resolution Orchestrator
//!
//! One invocation against one series: ingest any new canonical plots,
//! bring the model up to date, then resolve the query plot if one was given.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use plotmatch_core::{
    EmbeddingModel, MatchResult, Matcher, Normalizer, PlotMatchError, Result, SeriesName,
};
use plotmatch_trainer::{
    AppendOutcome, CorpusStore, ModelManager, PlotSource, SeriesPaths, SyncOutcome,
};
use tracing::{Level, debug, info, warn};

use crate::config::ResolverConfig;

/// What a resolution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A query plot was resolved (possibly to no episode).
    Matched(MatchResult),
    /// No query plot was given; the model was refreshed.
    Trained {
        series: SeriesName,
        version: u64,
        episodes: usize,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched(result) => f.write_str(&result.log_line()),
            Self::Trained {
                series,
                version,
                episodes,
            } => write!(f, "trained {series} version={version} episodes={episodes}"),
        }
    }
}

/// Drives the corpus store, model manager and matcher for a working
/// directory.
#[derive(Debug, Clone)]
pub struct Resolver {
    workdir: PathBuf,
    config: ResolverConfig,
    store: CorpusStore,
    models: ModelManager,
    matcher: Matcher,
}

impl Resolver {
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidWorkDir` if `workdir` is not an
    /// existing directory, `PlotMatchError::Regex` for a bad boilerplate
    /// pattern and `PlotMatchError::InvalidConfig` for out-of-range
    /// hyperparameters.
    pub fn new(workdir: impl Into<PathBuf>, config: ResolverConfig) -> Result<Self> {
        let workdir = workdir.into();
        check_workdir(&workdir)?;

        let normalizer = Normalizer::new(config.normalizer.clone())?;
        let models = ModelManager::new(&workdir, normalizer.clone(), config.embedding.clone())?;
        debug!(
            workdir = %workdir.display(),
            fingerprint = normalizer.fingerprint(),
            "resolver ready"
        );

        Ok(Self {
            store: CorpusStore::new(&workdir, normalizer.clone()),
            matcher: Matcher::new(normalizer),
            models,
            config,
            workdir,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[must_use]
    pub fn paths(&self, series: &SeriesName) -> SeriesPaths {
        SeriesPaths::new(&self.workdir, series)
    }

    /// Appends the plots of `source` to the corpus of `series`.
    ///
    /// Records the source could not parse are counted with the rejected
    /// plots; they never fail the call.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the source or the corpus
    /// cannot be read or written.
    pub fn ingest(&self, series: &SeriesName, source: &dyn PlotSource) -> Result<AppendOutcome> {
        let batch = source.read_plots()?;
        let mut outcome = self.store.append(series, batch.plots)?;

        for rejected in &batch.rejected {
            warn!(series = %series, error = %rejected, "skipping plot record");
        }
        let mut rejected = batch.rejected;
        rejected.append(&mut outcome.rejected);
        outcome.rejected = rejected;

        info!(
            series = %series,
            added = outcome.added,
            duplicates = outcome.duplicates,
            skipped = outcome.rejected.len(),
            version = outcome.corpus.version,
            "ingested plots"
        );
        Ok(outcome)
    }

    /// Discards the saved model of `series` so the next resolution
    /// retrains from scratch. Returns whether a model existed.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the model cannot be removed.
    pub fn discard_model(&self, series: &SeriesName) -> Result<bool> {
        self.models.discard(series)
    }

    /// Loads the corpus and model of `series` and syncs the model.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` for unreadable or unwritable
    /// state and `PlotMatchError::ConfigMismatch` if the saved model was
    /// trained with a different normalizer.
    pub fn refresh(&self, series: &SeriesName) -> Result<SyncOutcome> {
        let corpus = self.store.load(series)?;
        let model = self.models.load_or_init(series)?;
        let outcome = self.models.sync(model, &corpus)?;
        debug!(series = %series, action = ?outcome.action, "model synced");
        Ok(outcome)
    }

    /// Refreshes the model, then resolves `plot` if given.
    ///
    /// A resolved plot is appended to the series' result log. Finding no
    /// episode is a valid outcome, not an error.
    ///
    /// # Errors
    ///
    /// As for [`Resolver::refresh`], plus `PlotMatchError::Persistence` if
    /// the result log cannot be appended to.
    pub fn resolve(&self, series: &SeriesName, plot: Option<&str>) -> Result<Outcome> {
        info!(series = %series, query = plot.is_some(), "resolving");
        let synced = self.refresh(series)?;

        let Some(plot) = plot else {
            return Ok(Outcome::Trained {
                series: series.clone(),
                version: synced.model.trained_version,
                episodes: synced.model.len(),
            });
        };

        let result = self.matcher.closest_match(plot, &synced.model)?;
        if tracing::enabled!(Level::DEBUG) {
            self.log_runners_up(plot, &synced.model)?;
        }
        self.append_result(series, &result)?;

        match &result.episode_id {
            Some(episode) => info!(
                series = %series,
                episode = %episode,
                quality = result.quality,
                "resolved plot"
            ),
            None => info!(series = %series, quality = result.quality, "no matching episode"),
        }
        Ok(Outcome::Matched(result))
    }

    fn log_runners_up(&self, plot: &str, model: &EmbeddingModel) -> Result<()> {
        let ranking = self.matcher.rank(plot, model)?;
        for (rank, candidate) in ranking.iter().take(self.config.top_n).enumerate() {
            debug!(
                rank = rank + 1,
                episode = %candidate.episode_id,
                similarity = candidate.similarity,
                quality = candidate.quality(),
                "candidate"
            );
        }
        Ok(())
    }

    fn append_result(&self, series: &SeriesName, result: &MatchResult) -> Result<()> {
        let paths = self.paths(series);
        std::fs::create_dir_all(&paths.dir)
            .map_err(|e| PlotMatchError::persistence(&paths.dir, e))?;

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.result_log)
            .map_err(|e| PlotMatchError::persistence(&paths.result_log, e))?;
        writeln!(log, "{}", result.log_line())
            .map_err(|e| PlotMatchError::persistence(&paths.result_log, e))?;
        Ok(())
    }
}

fn check_workdir(path: &Path) -> Result<()> {
    let invalid = |reason: String| PlotMatchError::InvalidWorkDir {
        path: path.to_path_buf(),
        reason,
    };
    let meta = std::fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trained_outcome_line() {
        let outcome = Outcome::Trained {
            series: SeriesName::new("Columbo").unwrap(),
            version: 3,
            episodes: 12,
        };
        assert_eq!(outcome.to_string(), "trained Columbo version=3 episodes=12");
    }

    #[test]
    fn missing_workdir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = Resolver::new(dir.path().join("absent"), ResolverConfig::default()).unwrap_err();
        assert!(matches!(err, PlotMatchError::InvalidWorkDir { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn file_as_workdir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        let err = Resolver::new(&file, ResolverConfig::default()).unwrap_err();
        assert!(matches!(err, PlotMatchError::InvalidWorkDir { .. }));
    }

    #[test]
    fn bad_boilerplate_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResolverConfig::default().with_normalizer(
            plotmatch_core::NormalizerConfig::default().with_boilerplate(["(unclosed"]),
        );
        let err = Resolver::new(dir.path(), config).unwrap_err();
        assert!(matches!(err, PlotMatchError::Regex(_)));
    }
}
