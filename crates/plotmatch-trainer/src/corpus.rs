//! # Corpus Store
//!
//! Per-series SQLite database of canonical plots. Every plot row records
//! the corpus version that added it, which doubles as the change log the
//! model manager reads to find plots it has not trained on yet.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use plotmatch_core::{
    EpisodeId, IngestionError, Normalizer, PlotDocument, PlotMatchError, Result, SeriesCorpus,
    SeriesName,
};
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info, warn};

use crate::layout::SeriesPaths;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS corpus_meta (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    version     INTEGER NOT NULL,
    generation  INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS plots (
    episode_id     TEXT PRIMARY KEY,
    raw_text       TEXT NOT NULL,
    added_version  INTEGER NOT NULL
);
INSERT OR IGNORE INTO corpus_meta (id, version, generation) VALUES (1, 0, 0);
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// A canonical plot as supplied by the episode database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPlot {
    pub episode_id: String,
    pub raw_text: String,
}

impl RawPlot {
    pub fn new(episode_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            episode_id: episode_id.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// What an [`CorpusStore::append`] or [`CorpusStore::supersede`] did.
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    /// The corpus as persisted after the call.
    pub corpus: SeriesCorpus,
    /// Documents newly stored.
    pub added: usize,
    /// Documents skipped because their episode was already known.
    pub duplicates: usize,
    /// Documents rejected as malformed.
    pub rejected: Vec<IngestionError>,
}

/// Stores canonical plots under `<root>/<series>/corpus.sqlite`.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    root: PathBuf,
    normalizer: Normalizer,
}

impl CorpusStore {
    /// A store rooted at a working directory. `normalizer` derives
    /// `clean_tokens` and vets incoming plots.
    pub fn new(root: impl Into<PathBuf>, normalizer: Normalizer) -> Self {
        Self {
            root: root.into(),
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    fn path(&self, series: &SeriesName) -> PathBuf {
        SeriesPaths::new(&self.root, series).corpus
    }

    /// The persisted corpus for `series`, or an empty version-0 corpus if
    /// the series has never been ingested.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the database exists but
    /// cannot be read.
    pub fn load(&self, series: &SeriesName) -> Result<SeriesCorpus> {
        let path = self.path(series);
        if !path.exists() {
            debug!(series = %series, "no corpus yet");
            return Ok(SeriesCorpus::empty(series.clone()));
        }

        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| PlotMatchError::persistence(&path, e))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| PlotMatchError::persistence(&path, e))?;
        self.read_corpus(&conn, &path, series)
    }

    /// Merges `plots` into the stored corpus.
    ///
    /// Episodes already present are skipped, so re-appending a batch is a
    /// no-op. The version advances only if at least one plot was new.
    /// Malformed plots are rejected individually; the rest of the batch is
    /// still stored. The whole batch commits in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the database cannot be
    /// opened or written; nothing from the batch is stored in that case.
    pub fn append<I>(&self, series: &SeriesName, plots: I) -> Result<AppendOutcome>
    where
        I: IntoIterator<Item = RawPlot>,
    {
        self.write(series, plots, false)
    }

    /// Replaces the stored corpus with `plots` after an upstream correction.
    ///
    /// Bumps both the version and the generation, which makes the next
    /// model sync retrain from scratch.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` as for [`CorpusStore::append`].
    pub fn supersede<I>(&self, series: &SeriesName, plots: I) -> Result<AppendOutcome>
    where
        I: IntoIterator<Item = RawPlot>,
    {
        self.write(series, plots, true)
    }

    fn write<I>(&self, series: &SeriesName, plots: I, replace: bool) -> Result<AppendOutcome>
    where
        I: IntoIterator<Item = RawPlot>,
    {
        let path = self.path(series);
        let db_err = |e: rusqlite::Error| PlotMatchError::persistence(&path, e);

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| PlotMatchError::persistence(dir, e))?;
        }
        let mut conn = Connection::open(&path).map_err(db_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(db_err)?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;
        tx.execute_batch(SCHEMA).map_err(db_err)?;

        let (version, generation) = read_meta(&tx, &path)?;
        let next_version = version + 1;
        let next_generation = if replace { generation + 1 } else { generation };
        let stored_version = to_sql(next_version, &path)?;

        if replace {
            tx.execute("DELETE FROM plots", []).map_err(db_err)?;
        }

        let mut added = 0;
        let mut duplicates = 0;
        let mut rejected = Vec::new();
        let mut batch = BTreeSet::new();

        for plot in plots {
            let episode_id = match EpisodeId::parse(plot.episode_id) {
                Ok(id) => id,
                Err(e) => {
                    warn!(series = %series, error = %e, "rejecting plot");
                    rejected.push(e);
                    continue;
                }
            };
            if self.normalizer.normalize(&plot.raw_text).is_empty() {
                let e = IngestionError::UnusablePlot {
                    episode_id: episode_id.to_string(),
                };
                warn!(series = %series, error = %e, "rejecting plot");
                rejected.push(e);
                continue;
            }
            if !batch.insert(episode_id.clone()) {
                duplicates += 1;
                continue;
            }

            let changed = tx
                .execute(
                    "INSERT OR IGNORE INTO plots (episode_id, raw_text, added_version) \
                     VALUES (?1, ?2, ?3)",
                    params![episode_id.as_str(), plot.raw_text, stored_version],
                )
                .map_err(db_err)?;
            if changed == 1 {
                added += 1;
            } else {
                duplicates += 1;
            }
        }

        if added > 0 || replace {
            tx.execute(
                "UPDATE corpus_meta SET version = ?1, generation = ?2 WHERE id = 1",
                params![stored_version, to_sql(next_generation, &path)?],
            )
            .map_err(db_err)?;
            tx.commit().map_err(db_err)?;
            info!(
                series = %series,
                added,
                duplicates,
                rejected = rejected.len(),
                version = next_version,
                generation = next_generation,
                "corpus updated"
            );
        } else {
            tx.rollback().map_err(db_err)?;
            debug!(series = %series, duplicates, rejected = rejected.len(), "corpus unchanged");
        }

        let corpus = self.read_corpus(&conn, &path, series)?;
        Ok(AppendOutcome {
            corpus,
            added,
            duplicates,
            rejected,
        })
    }

    fn read_corpus(
        &self,
        conn: &Connection,
        path: &Path,
        series: &SeriesName,
    ) -> Result<SeriesCorpus> {
        let db_err = |e: rusqlite::Error| PlotMatchError::persistence(path, e);

        // One read transaction so the counters and rows are a consistent snapshot.
        conn.execute_batch("BEGIN DEFERRED").map_err(db_err)?;
        let result = (|| -> Result<SeriesCorpus> {
            // A database whose schema was never committed holds no corpus yet.
            let tables: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master \
                     WHERE type = 'table' AND name IN ('corpus_meta', 'plots')",
                    [],
                    |row| row.get(0),
                )
                .map_err(db_err)?;
            if tables < 2 {
                debug!(path = %path.display(), "corpus schema not created yet");
                return Ok(SeriesCorpus::empty(series.clone()));
            }

            let (version, generation) = read_meta(conn, path)?;
            let mut corpus = SeriesCorpus::new(series.clone(), version, generation);

            let mut stmt = conn
                .prepare("SELECT episode_id, raw_text, added_version FROM plots")
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })
                .map_err(db_err)?;

            for row in rows {
                let (id, raw_text, added) = row.map_err(db_err)?;
                let episode_id = match EpisodeId::parse(id) {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping stored plot");
                        continue;
                    }
                };
                corpus.insert(PlotDocument {
                    clean_tokens: self.normalizer.normalize(&raw_text),
                    episode_id,
                    raw_text,
                    added_in: from_sql(added, path)?,
                });
            }
            Ok(corpus)
        })();
        conn.execute_batch("COMMIT").map_err(db_err)?;
        result
    }
}

fn read_meta(conn: &Connection, path: &Path) -> Result<(u64, u64)> {
    let meta = conn
        .query_row(
            "SELECT version, generation FROM corpus_meta WHERE id = 1",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()
        .map_err(|e| PlotMatchError::persistence(path, e))?;

    match meta {
        Some((version, generation)) => Ok((from_sql(version, path)?, from_sql(generation, path)?)),
        None => Ok((0, 0)),
    }
}

fn to_sql(value: u64, path: &Path) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| PlotMatchError::persistence(path, format!("counter {value} out of range")))
}

fn from_sql(value: i64, path: &Path) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| PlotMatchError::persistence(path, format!("negative counter {value}")))
}
