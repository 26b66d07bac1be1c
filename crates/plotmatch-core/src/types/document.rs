use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::episode::{EpisodeId, SeriesName};

/// One canonical episode plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDocument {
    /// Episode this plot describes.
    pub episode_id: EpisodeId,
    /// Plot text as supplied by the episode database.
    pub raw_text: String,
    /// Normalized tokens derived from `raw_text`.
    pub clean_tokens: Vec<String>,
    /// Corpus version at which this document was added.
    pub added_in: u64,
}

/// The set of canonical plots known for one series.
///
/// Documents enumerate in natural [`EpisodeId`] order, which is also the
/// order models are trained in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCorpus {
    /// Series this corpus belongs to.
    pub series_name: SeriesName,
    /// Incremented whenever documents are added.
    pub version: u64,
    /// Incremented whenever the corpus is superseded wholesale.
    pub generation: u64,
    documents: BTreeMap<EpisodeId, PlotDocument>,
}

impl SeriesCorpus {
    /// An empty corpus at version 0, the state of a brand-new series.
    #[must_use]
    pub fn empty(series_name: SeriesName) -> Self {
        Self::new(series_name, 0, 0)
    }

    /// A corpus with the given counters and no documents yet.
    #[must_use]
    pub fn new(series_name: SeriesName, version: u64, generation: u64) -> Self {
        Self {
            series_name,
            version,
            generation,
            documents: BTreeMap::new(),
        }
    }

    /// Adds a document, returning the previous one with the same id.
    pub fn insert(&mut self, document: PlotDocument) -> Option<PlotDocument> {
        self.documents.insert(document.episode_id.clone(), document)
    }

    /// Looks up a document by episode id.
    #[must_use]
    pub fn get(&self, episode_id: &EpisodeId) -> Option<&PlotDocument> {
        self.documents.get(episode_id)
    }

    #[must_use]
    pub fn contains(&self, episode_id: &EpisodeId) -> bool {
        self.documents.contains_key(episode_id)
    }

    /// All documents in natural episode order.
    pub fn documents(&self) -> impl Iterator<Item = &PlotDocument> {
        self.documents.values()
    }

    /// Documents added after corpus version `version`, in natural episode order.
    pub fn documents_since(&self, version: u64) -> impl Iterator<Item = &PlotDocument> {
        self.documents.values().filter(move |d| d.added_in > version)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, added_in: u64) -> PlotDocument {
        PlotDocument {
            episode_id: EpisodeId::parse(id).unwrap(),
            raw_text: format!("plot of {id}"),
            clean_tokens: vec!["plot".into()],
            added_in,
        }
    }

    #[test]
    fn empty_corpus_is_version_zero() {
        let corpus = SeriesCorpus::empty(SeriesName::new("Lewis").unwrap());
        assert_eq!(corpus.version, 0);
        assert_eq!(corpus.generation, 0);
        assert!(corpus.is_empty());
    }

    #[test]
    fn documents_enumerate_in_natural_order() {
        let mut corpus = SeriesCorpus::new(SeriesName::new("Lewis").unwrap(), 2, 0);
        corpus.insert(doc("S01E10", 1));
        corpus.insert(doc("S01E02", 1));
        corpus.insert(doc("S01E01", 2));

        let ids: Vec<_> = corpus.documents().map(|d| d.episode_id.as_str()).collect();
        assert_eq!(ids, ["S01E01", "S01E02", "S01E10"]);
    }

    #[test]
    fn documents_since_uses_added_version() {
        let mut corpus = SeriesCorpus::new(SeriesName::new("Lewis").unwrap(), 3, 0);
        corpus.insert(doc("S01E01", 1));
        corpus.insert(doc("S01E02", 2));
        corpus.insert(doc("S01E03", 3));

        let ids: Vec<_> = corpus
            .documents_since(1)
            .map(|d| d.episode_id.as_str())
            .collect();
        assert_eq!(ids, ["S01E02", "S01E03"]);
        assert_eq!(corpus.documents_since(3).count(), 0);
        assert_eq!(corpus.documents_since(0).count(), 3);
    }
}
