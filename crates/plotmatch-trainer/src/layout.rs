//! On-disk layout of a working directory.

use std::path::{Path, PathBuf};

use plotmatch_core::SeriesName;

pub const CORPUS_FILE: &str = "corpus.sqlite";
pub const MODEL_FILE: &str = "model.json";
pub const RESULT_LOG_FILE: &str = "AbsoluteEpisodeNumberFromPlot.txt";

/// Files belonging to one series under a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPaths {
    pub dir: PathBuf,
    pub corpus: PathBuf,
    pub model: PathBuf,
    pub result_log: PathBuf,
}

impl SeriesPaths {
    pub fn new(root: &Path, series: &SeriesName) -> Self {
        let dir = root.join(series.as_str());
        Self {
            corpus: dir.join(CORPUS_FILE),
            model: dir.join(MODEL_FILE),
            result_log: dir.join(RESULT_LOG_FILE),
            dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_series_directory() {
        let series = SeriesName::new("Midsomer Murders").unwrap();
        let paths = SeriesPaths::new(Path::new("/data/m2k"), &series);

        assert_eq!(paths.dir, Path::new("/data/m2k/Midsomer Murders"));
        assert_eq!(paths.model, Path::new("/data/m2k/Midsomer Murders/model.json"));
        assert!(paths.corpus.ends_with("corpus.sqlite"));
        assert!(paths.result_log.ends_with("AbsoluteEpisodeNumberFromPlot.txt"));
    }
}
