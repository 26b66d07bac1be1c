//! Canonical plot sources.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use plotmatch_core::{IngestionError, PlotMatchError, Result};

use crate::corpus::RawPlot;

/// Plots read from a source, plus the records that could not be parsed.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub plots: Vec<RawPlot>,
    pub rejected: Vec<IngestionError>,
}

/// Something that supplies canonical plots for a series.
pub trait PlotSource {
    /// # Errors
    ///
    /// Returns `PlotMatchError::Persistence` if the source cannot be read.
    fn read_plots(&self) -> Result<SourceBatch>;
}

impl PlotSource for Vec<RawPlot> {
    fn read_plots(&self) -> Result<SourceBatch> {
        Ok(SourceBatch {
            plots: self.clone(),
            rejected: Vec::new(),
        })
    }
}

/// Tab-separated plot file: one `episode_id<TAB>plot` record per line.
///
/// Blank lines and lines starting with `#` are ignored.
#[derive(Debug, Clone)]
pub struct TsvPlotSource {
    path: PathBuf,
}

impl TsvPlotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlotSource for TsvPlotSource {
    fn read_plots(&self) -> Result<SourceBatch> {
        let file = File::open(&self.path).map_err(|e| PlotMatchError::persistence(&self.path, e))?;
        parse_tsv(BufReader::new(file)).map_err(|e| PlotMatchError::persistence(&self.path, e))
    }
}

/// Parses tab-separated plot records.
pub fn parse_tsv<R: BufRead>(reader: R) -> std::io::Result<SourceBatch> {
    let mut batch = SourceBatch::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        match line.split_once('\t') {
            Some((id, plot)) if !id.trim().is_empty() => {
                batch.plots.push(RawPlot::new(id.trim(), plot.trim()));
            }
            Some(_) => batch.rejected.push(IngestionError::MalformedRecord {
                line: index + 1,
                reason: "empty episode id".into(),
            }),
            None => batch.rejected.push(IngestionError::MalformedRecord {
                line: index + 1,
                reason: "expected episode id and plot separated by a tab".into(),
            }),
        }
    }

    Ok(batch)
}
