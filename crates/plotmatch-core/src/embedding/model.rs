//! # Episode Embedding Model
//!
//! Random-indexing document vectors for one series' canonical plots.
//!
//! Each vocabulary key owns a fixed sparse random *index vector* and a
//! *context vector* accumulated from its neighbours during training. A
//! document embeds as the idf-weighted sum of its keys' `index + context`
//! vectors. Training only ever adds to the per-key statistics, so new plots
//! can be folded in without revisiting old ones, and any text (including an
//! unseen broadcast plot) can be embedded against the trained space.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::params::Hyperparameters;
use super::vector::{IndexVector, add_dense, add_sparse, index_vector, normalize};
use crate::error::{PlotMatchError, Result};
use crate::text::{Normalizer, NormalizerConfig};
use crate::types::{EpisodeId, PlotDocument, SeriesName};

/// Training statistics for one vocabulary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermStats {
    /// Number of trained documents containing the key.
    pub doc_freq: u32,
    /// Distance-weighted sum of neighbouring index vectors.
    pub context: Vec<f32>,
}

/// The trained representation of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingModel {
    /// Series the model was trained against.
    pub series_name: SeriesName,
    /// Corpus version at last training.
    pub trained_version: u64,
    /// Corpus generation the vectors belong to.
    pub trained_generation: u64,
    hyperparameters: Hyperparameters,
    normalizer: NormalizerConfig,
    fingerprint: String,
    concepts: BTreeMap<String, String>,
    documents: u32,
    terms: BTreeMap<String, TermStats>,
    vectors: BTreeMap<EpisodeId, Vec<f32>>,
}

impl EmbeddingModel {
    /// An untrained model for `series_name`.
    ///
    /// The normalizer's configuration and the synonym lexicon are frozen into
    /// the model here.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidConfig` if the hyperparameters are
    /// out of range.
    pub fn new(
        series_name: SeriesName,
        hyperparameters: Hyperparameters,
        normalizer: &Normalizer,
    ) -> Result<Self> {
        hyperparameters.validate()?;
        let concepts = hyperparameters.synonyms.compile(normalizer);

        Ok(Self {
            series_name,
            trained_version: 0,
            trained_generation: 0,
            hyperparameters,
            normalizer: normalizer.config().clone(),
            fingerprint: normalizer.fingerprint().to_string(),
            concepts,
            documents: 0,
            terms: BTreeMap::new(),
            vectors: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.hyperparameters.dimension
    }

    /// Normalizer configuration used for training.
    #[must_use]
    pub fn normalizer_config(&self) -> &NormalizerConfig {
        &self.normalizer
    }

    /// Fingerprint of the training-time normalizer.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Episode vectors in natural episode order.
    pub fn vectors(&self) -> impl Iterator<Item = (&EpisodeId, &[f32])> {
        self.vectors.iter().map(|(id, v)| (id, v.as_slice()))
    }

    #[must_use]
    pub fn vector(&self, episode_id: &EpisodeId) -> Option<&[f32]> {
        self.vectors.get(episode_id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, episode_id: &EpisodeId) -> bool {
        self.vectors.contains_key(episode_id)
    }

    /// Number of episodes with a vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Number of distinct vocabulary keys seen in training.
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Checks internal consistency of a model read from storage.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidConfig` if the hyperparameters are
    /// out of range or a stored vector does not have `dimension` entries.
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        let dimension = self.hyperparameters.dimension;

        if let Some((key, stats)) = self.terms.iter().find(|(_, s)| s.context.len() != dimension) {
            return Err(PlotMatchError::InvalidConfig(format!(
                "context of {key:?} has {} entries, expected {dimension}",
                stats.context.len()
            )));
        }
        if let Some((id, vector)) = self.vectors.iter().find(|(_, v)| v.len() != dimension) {
            return Err(PlotMatchError::InvalidConfig(format!(
                "vector of {id} has {} entries, expected {dimension}",
                vector.len()
            )));
        }
        Ok(())
    }

    /// Vocabulary key for a normalized token.
    fn key<'a>(&'a self, token: &'a str) -> &'a str {
        self.concepts.get(token).map_or(token, String::as_str)
    }

    /// Folds `documents` into the model and (re)computes their vectors.
    ///
    /// Statistics for all documents are accumulated first, then the vectors
    /// of exactly these documents are computed; vectors of previously
    /// trained episodes are left as they were. Documents without tokens get
    /// no vector. Returns the number of vectors written.
    pub fn train<'d, I>(&mut self, documents: I) -> usize
    where
        I: IntoIterator<Item = &'d PlotDocument>,
    {
        let documents: Vec<&PlotDocument> = documents.into_iter().collect();
        let mut cache = IndexCache::new(&self.hyperparameters);

        for doc in &documents {
            let keys: Vec<String> = doc
                .clean_tokens
                .iter()
                .map(|t| self.key(t).to_string())
                .collect();
            if keys.is_empty() {
                continue;
            }
            self.accumulate(&keys, &mut cache);
            self.documents += 1;
        }

        let mut written = 0;
        for doc in &documents {
            match self.infer_with(&doc.clean_tokens, &mut cache) {
                Some(vector) => {
                    self.vectors.insert(doc.episode_id.clone(), vector);
                    written += 1;
                }
                None => warn!(episode = %doc.episode_id, "plot has no tokens, no vector trained"),
            }
        }

        debug!(
            series = %self.series_name,
            written,
            vocabulary = self.terms.len(),
            documents = self.documents,
            "trained documents"
        );
        written
    }

    fn accumulate(&mut self, keys: &[String], cache: &mut IndexCache) {
        let dimension = self.hyperparameters.dimension;
        let window = self.hyperparameters.window;

        let mut seen: Vec<&str> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            let stats = self.terms.entry(key.clone()).or_insert_with(|| TermStats {
                doc_freq: 0,
                context: vec![0.0; dimension],
            });
            if !seen.contains(&key.as_str()) {
                stats.doc_freq += 1;
                seen.push(key.as_str());
            }

            let lo = i.saturating_sub(window);
            let hi = (i + window).min(keys.len() - 1);
            for (j, neighbour) in keys.iter().enumerate().take(hi + 1).skip(lo) {
                if j == i {
                    continue;
                }
                let weight = 1.0 / i.abs_diff(j) as f32;
                add_sparse(&mut stats.context, cache.get(neighbour), weight);
            }
        }
    }

    /// Embeds normalized tokens into the trained space.
    ///
    /// Returns `None` when the tokens carry no signal (empty input).
    #[must_use]
    pub fn infer(&self, tokens: &[String]) -> Option<Vec<f32>> {
        let mut cache = IndexCache::new(&self.hyperparameters);
        self.infer_with(tokens, &mut cache)
    }

    fn infer_with(&self, tokens: &[String], cache: &mut IndexCache) -> Option<Vec<f32>> {
        let dimension = self.hyperparameters.dimension;
        let mut vector = vec![0.0f32; dimension];
        let mut context = vec![0.0f32; dimension];

        for token in tokens {
            let key = self.key(token);
            let stats = self.terms.get(key);
            let weight = self.idf(stats.map_or(0, |s| s.doc_freq));

            add_sparse(&mut vector, cache.get(key), weight);

            if let Some(stats) = stats {
                context.copy_from_slice(&stats.context);
                if normalize(&mut context) {
                    add_dense(&mut vector, &context, weight * self.hyperparameters.context_weight);
                }
            }
        }

        normalize(&mut vector).then_some(vector)
    }

    /// Smoothed inverse document frequency.
    fn idf(&self, doc_freq: u32) -> f32 {
        let n = f64::from(self.documents);
        let df = f64::from(doc_freq);
        (((1.0 + n) / (1.0 + df)).ln() + 1.0) as f32
    }
}

/// Memoizes index vectors within one training or inference pass.
struct IndexCache {
    params: Hyperparameters,
    vectors: HashMap<String, IndexVector>,
}

impl IndexCache {
    fn new(params: &Hyperparameters) -> Self {
        Self {
            params: params.clone(),
            vectors: HashMap::new(),
        }
    }

    fn get(&mut self, key: &str) -> &IndexVector {
        if !self.vectors.contains_key(key) {
            self.vectors
                .insert(key.to_string(), index_vector(key, &self.params));
        }
        &self.vectors[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::vector::{cosine, norm};
    use crate::text::NormalizerConfig;

    fn normalizer() -> Normalizer {
        Normalizer::new(NormalizerConfig::default()).unwrap()
    }

    fn doc(normalizer: &Normalizer, id: &str, text: &str, added_in: u64) -> PlotDocument {
        PlotDocument {
            episode_id: EpisodeId::parse(id).unwrap(),
            raw_text: text.to_string(),
            clean_tokens: normalizer.normalize(text),
            added_in,
        }
    }

    fn model(normalizer: &Normalizer) -> EmbeddingModel {
        EmbeddingModel::new(
            SeriesName::new("Test Series").unwrap(),
            Hyperparameters::default(),
            normalizer,
        )
        .unwrap()
    }

    #[test]
    fn training_is_deterministic() {
        let n = normalizer();
        let docs = vec![
            doc(&n, "E1", "A detective investigates a murder at a mansion.", 1),
            doc(&n, "E2", "A chef competes in a cooking contest.", 1),
        ];

        let mut a = model(&n);
        let mut b = model(&n);
        a.train(&docs);
        b.train(&docs);

        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn document_vectors_are_unit_length() {
        let n = normalizer();
        let docs = vec![doc(&n, "E1", "Two rivals race across the desert.", 1)];
        let mut m = model(&n);
        m.train(&docs);

        let v = m.vector(&docs[0].episode_id).unwrap();
        assert_eq!(v.len(), m.dimension());
        assert!((norm(v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn synonyms_embed_close_together() {
        let n = normalizer();
        let docs = vec![
            doc(&n, "E1", "A detective investigates a murder at a mansion.", 1),
            doc(&n, "E2", "A chef competes in a cooking contest.", 1),
        ];
        let mut m = model(&n);
        m.train(&docs);

        let query = m
            .infer(&n.normalize("A sleuth solves a killing in a large house."))
            .unwrap();
        let e1 = cosine(&query, m.vector(&docs[0].episode_id).unwrap());
        let e2 = cosine(&query, m.vector(&docs[1].episode_id).unwrap());
        assert!(e1 > 0.5, "e1 similarity {e1}");
        assert!(e1 > e2 + 0.3, "e1 {e1} vs e2 {e2}");
    }

    #[test]
    fn incremental_training_leaves_old_vectors_alone() {
        let n = normalizer();
        let first = vec![doc(&n, "E1", "A detective investigates a murder at a mansion.", 1)];
        let second = vec![doc(&n, "E2", "A chef competes in a cooking contest.", 2)];

        let mut m = model(&n);
        m.train(&first);
        let before = m.vector(&first[0].episode_id).unwrap().to_vec();

        assert_eq!(m.train(&second), 1);
        assert_eq!(m.vector(&first[0].episode_id).unwrap(), before.as_slice());
        assert!(m.contains(&second[0].episode_id));
    }

    #[test]
    fn empty_inputs_produce_no_vector() {
        let n = normalizer();
        let mut m = model(&n);
        assert!(m.infer(&[]).is_none());

        let empty = vec![doc(&n, "E1", "", 1)];
        assert_eq!(m.train(&empty), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn unseen_terms_still_embed() {
        let n = normalizer();
        let m = model(&n);
        let v = m.infer(&["zeppelin".to_string()]).unwrap();
        assert_eq!(v.len(), m.dimension());
    }

    #[test]
    fn validate_rejects_mismatched_lengths() {
        let n = normalizer();
        let docs = vec![doc(&n, "E1", "A chef competes in a cooking contest.", 1)];
        let mut m = model(&n);
        m.train(&docs);
        assert!(m.validate().is_ok());

        let mut short_context = m.clone();
        short_context.terms.values_mut().next().unwrap().context.truncate(3);
        assert!(matches!(
            short_context.validate(),
            Err(PlotMatchError::InvalidConfig(_))
        ));

        let mut short_vector = m.clone();
        short_vector.vectors.values_mut().next().unwrap().pop();
        assert!(short_vector.validate().is_err());

        let mut bad_params = m;
        bad_params.hyperparameters.dimension = 2;
        assert!(bad_params.validate().is_err());
    }

    #[test]
    fn model_survives_json_roundtrip() {
        let n = normalizer();
        let docs = vec![doc(&n, "S01E01", "The vicar is found dead in the church.", 1)];
        let mut m = model(&n);
        m.train(&docs);
        m.trained_version = 1;

        let json = serde_json::to_string(&m).unwrap();
        let back: EmbeddingModel = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
