//! # Embedding Model Manager
//!
//! Loads, keeps current, and persists the embedding model of a series.

use std::path::PathBuf;

use plotmatch_core::{
    EmbeddingModel, Hyperparameters, Normalizer, PlotMatchError, Result, SeriesCorpus, SeriesName,
};
use tracing::{debug, info, warn};

use crate::layout::SeriesPaths;
use crate::persist::write_atomic;

/// How [`ModelManager::sync`] brought the model up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Trained from scratch on the whole corpus.
    FullTrain,
    /// Folded in documents added since the last training.
    Incremental { documents: usize },
    /// Already trained on this corpus version.
    UpToDate,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub model: EmbeddingModel,
    pub action: SyncAction,
}

/// Owns model persistence under `<root>/<series>/model.json`.
#[derive(Debug, Clone)]
pub struct ModelManager {
    root: PathBuf,
    normalizer: Normalizer,
    hyperparameters: Hyperparameters,
}

impl ModelManager {
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidConfig` if the hyperparameters are
    /// out of range.
    pub fn new(
        root: impl Into<PathBuf>,
        normalizer: Normalizer,
        hyperparameters: Hyperparameters,
    ) -> Result<Self> {
        hyperparameters.validate()?;
        Ok(Self {
            root: root.into(),
            normalizer,
            hyperparameters,
        })
    }

    #[must_use]
    pub fn model_path(&self, series: &SeriesName) -> PathBuf {
        SeriesPaths::new(&self.root, series).model
    }

    /// The persisted model for `series`, or `None` if none was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the model file exists but is
    /// unreadable, corrupt, or belongs to another series.
    pub fn load_or_init(&self, series: &SeriesName) -> Result<Option<EmbeddingModel>> {
        let path = self.model_path(series);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(series = %series, "no model yet");
                return Ok(None);
            }
            Err(e) => return Err(PlotMatchError::persistence(&path, e)),
        };

        let model: EmbeddingModel = serde_json::from_slice(&bytes)
            .map_err(|e| PlotMatchError::persistence(&path, format!("corrupt model: {e}")))?;
        model
            .validate()
            .map_err(|e| PlotMatchError::persistence(&path, format!("corrupt model: {e}")))?;
        if &model.series_name != series {
            return Err(PlotMatchError::persistence(
                &path,
                format!("model belongs to series {:?}", model.series_name.as_str()),
            ));
        }

        debug!(
            series = %series,
            version = model.trained_version,
            episodes = model.len(),
            "loaded model"
        );
        Ok(Some(model))
    }

    /// Brings `model` up to date with `corpus` and persists the result.
    ///
    /// The model is retrained from scratch when there is none, when its
    /// hyperparameters differ from the configured ones, or when the corpus
    /// was superseded since training. Otherwise only documents added since
    /// the last training are folded in. After a successful sync the model's
    /// `trained_version` equals the corpus version.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::ConfigMismatch` if the model was trained
    /// with a different normalizer, and `PlotMatchError::Persistence` if the
    /// updated model cannot be saved. The stored model is unchanged on error.
    pub fn sync(&self, model: Option<EmbeddingModel>, corpus: &SeriesCorpus) -> Result<SyncOutcome> {
        let (model, action) = match model {
            None => (self.full_train(corpus)?, SyncAction::FullTrain),
            Some(model) => self.refresh(model, corpus)?,
        };
        self.save(&model)?;
        Ok(SyncOutcome { model, action })
    }

    fn refresh(
        &self,
        mut model: EmbeddingModel,
        corpus: &SeriesCorpus,
    ) -> Result<(EmbeddingModel, SyncAction)> {
        if model.fingerprint() != self.normalizer.fingerprint() {
            return Err(PlotMatchError::ConfigMismatch {
                trained: model.fingerprint().to_string(),
                query: self.normalizer.fingerprint().to_string(),
            });
        }

        if model.hyperparameters() != &self.hyperparameters {
            info!(series = %corpus.series_name, "hyperparameters changed, retraining");
            return Ok((self.full_train(corpus)?, SyncAction::FullTrain));
        }
        if model.trained_generation != corpus.generation {
            info!(
                series = %corpus.series_name,
                trained = model.trained_generation,
                corpus = corpus.generation,
                "corpus was superseded, retraining"
            );
            return Ok((self.full_train(corpus)?, SyncAction::FullTrain));
        }
        if model.trained_version > corpus.version {
            warn!(
                series = %corpus.series_name,
                trained = model.trained_version,
                corpus = corpus.version,
                "model is newer than corpus, retraining"
            );
            return Ok((self.full_train(corpus)?, SyncAction::FullTrain));
        }
        if model.trained_version == corpus.version {
            debug!(series = %corpus.series_name, version = corpus.version, "model up to date");
            return Ok((model, SyncAction::UpToDate));
        }

        let pending: Vec<_> = corpus.documents_since(model.trained_version).collect();
        let documents = pending.len();
        model.train(pending);
        model.trained_version = corpus.version;
        info!(
            series = %corpus.series_name,
            documents,
            version = corpus.version,
            "model updated incrementally"
        );
        Ok((model, SyncAction::Incremental { documents }))
    }

    fn full_train(&self, corpus: &SeriesCorpus) -> Result<EmbeddingModel> {
        let mut model = EmbeddingModel::new(
            corpus.series_name.clone(),
            self.hyperparameters.clone(),
            &self.normalizer,
        )?;
        let written = model.train(corpus.documents());
        model.trained_version = corpus.version;
        model.trained_generation = corpus.generation;
        info!(
            series = %corpus.series_name,
            episodes = written,
            version = corpus.version,
            "model trained from scratch"
        );
        Ok(model)
    }

    /// Atomically writes `model` to its series' model file.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` on any I/O failure.
    pub fn save(&self, model: &EmbeddingModel) -> Result<()> {
        let path = self.model_path(&model.series_name);
        let bytes = serde_json::to_vec(model)
            .map_err(|e| PlotMatchError::persistence(&path, format!("serialize model: {e}")))?;
        write_atomic(&path, &bytes)
    }

    /// Deletes the saved model of `series`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the file cannot be removed.
    pub fn discard(&self, series: &SeriesName) -> Result<bool> {
        let path = self.model_path(series);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(series = %series, "discarded model");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PlotMatchError::persistence(&path, e)),
        }
    }
}
