use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, PlotMatchError};

/// Longest accepted episode identifier.
pub const MAX_EPISODE_ID_LEN: usize = 64;

/// Opaque episode identifier, unique within a series.
///
/// Usually a season/episode code such as `S03E07`, or an absolute number.
/// Identifiers order *naturally*: digit runs compare by numeric value, so
/// `S01E02 < S01E10` and `9 < 10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EpisodeId(String);

impl EpisodeId {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns `IngestionError::MalformedEpisodeId` unless the id is 1 to 64
    /// characters of `[A-Za-z0-9._:-]` starting with an alphanumeric.
    pub fn parse(id: impl Into<String>) -> Result<Self, IngestionError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("empty")
        } else if id.len() > MAX_EPISODE_ID_LEN {
            Some("longer than 64 characters")
        } else if !id.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            Some("must start with a letter or digit")
        } else if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-'))
        {
            Some("contains characters outside [A-Za-z0-9._:-]")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(IngestionError::MalformedEpisodeId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EpisodeId {
    type Error = IngestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EpisodeId> for String {
    fn from(id: EpisodeId) -> Self {
        id.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for EpisodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for EpisodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Splits `s` into maximal runs of ASCII digits and non-digits.
fn chunks(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_digit = None;

    for (idx, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if prev_digit.is_some_and(|p| p != digit) {
            out.push(&s[start..idx]);
            start = idx;
        }
        prev_digit = Some(digit);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a_chunks, b_chunks) = (chunks(a), chunks(b));

    for (x, y) in a_chunks.iter().zip(b_chunks.iter()) {
        let both_digits =
            x.starts_with(|c: char| c.is_ascii_digit()) && y.starts_with(|c: char| c.is_ascii_digit());

        let ord = if both_digits {
            let (x, y) = (x.trim_start_matches('0'), y.trim_start_matches('0'));
            x.len().cmp(&y.len()).then_with(|| x.cmp(y))
        } else {
            x.cmp(y)
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    a_chunks.len().cmp(&b_chunks.len())
}

/// Name of a TV series, the unit of corpus and model partitioning.
///
/// The name doubles as the series' directory name, so it must be a single
/// path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeriesName(String);

impl SeriesName {
    /// Validates a series name.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidSeriesName` for empty names, `.`/`..`,
    /// names with path separators or control characters, or names longer
    /// than 255 bytes.
    pub fn new(name: impl Into<String>) -> Result<Self, PlotMatchError> {
        let name = name.into();
        let trimmed = name.trim();

        let invalid = trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.len() > 255
            || trimmed
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control());

        if invalid {
            return Err(PlotMatchError::InvalidSeriesName(name));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The series name text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SeriesName {
    type Error = PlotMatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SeriesName> for String {
    fn from(name: SeriesName) -> Self {
        name.0
    }
}

impl fmt::Display for SeriesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
