//! # Plot Normalizer
//!
//! Turns raw plot strings from episode databases and broadcast guides into
//! the token sequences the embedding model trains and infers on.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::stem::stem;
use super::stopwords::is_stopword;
use crate::error::{PlotMatchError, Result};

/// Broadcast-guide boilerplate removed before tokenization.
pub const DEFAULT_BOILERPLATE: &[&str] = &[
    r"(?i)[\(\[](?:cc|hd|ws|new|repeat|rpt|premiere|final|live|captioned|subtitled|ad|g|pg|m|ma15\+?|av15\+?|r18\+?)[\)\]]",
    r"(?i)\b(?:also\s+(?:available\s+)?in\s+hd|closed\s+captioned|from\s+\d{4})\b",
    r"(?i)\bs\d{1,2}\s*ep?\s*\d{1,3}\b",
];

/// Common UTF-8-decoded-as-Latin-1 sequences and their intended text.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", " "),
    ("â€\u{9d}", " "),
    ("â€“", " "),
    ("â€”", " "),
    ("â€¦", " "),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Â", ""),
];

/// Normalization options. Part of a model's identity: a model only
/// accepts queries normalized with the configuration it was trained with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Remove HTML tags and decode entities.
    pub strip_html: bool,
    /// Drop English stop words.
    pub remove_stopwords: bool,
    /// Apply light suffix stemming.
    pub stem: bool,
    /// Regex patterns whose matches are blanked out before tokenizing.
    pub boilerplate: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            strip_html: true,
            remove_stopwords: true,
            stem: true,
            boilerplate: DEFAULT_BOILERPLATE.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

impl NormalizerConfig {
    /// Create a new normalizer configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable HTML stripping.
    pub fn with_strip_html(mut self, enabled: bool) -> Self {
        self.strip_html = enabled;
        self
    }

    /// Enable or disable stop-word removal.
    pub fn with_remove_stopwords(mut self, enabled: bool) -> Self {
        self.remove_stopwords = enabled;
        self
    }

    /// Enable or disable stemming.
    pub fn with_stem(mut self, enabled: bool) -> Self {
        self.stem = enabled;
        self
    }

    /// Replace the boilerplate patterns.
    pub fn with_boilerplate<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boilerplate = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Stable digest of this configuration.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::InvalidConfig` if the configuration cannot be
    /// serialized.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| PlotMatchError::InvalidConfig(e.to_string()))?;
        let hex = blake3::hash(&bytes).to_hex();
        Ok(hex.as_str()[..16].to_string())
    }
}

/// Pure, deterministic plot normalizer.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    fingerprint: String,
    re_script: Regex,
    re_tag: Regex,
    re_entity: Regex,
    boilerplate: Vec<Regex>,
}

impl Normalizer {
    /// Compiles a normalizer for `config`.
    ///
    /// # Errors
    ///
    /// Returns `PlotMatchError::Regex` if a boilerplate pattern is invalid.
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        let boilerplate = config
            .boilerplate
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            fingerprint: config.fingerprint()?,
            re_script: Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>")?,
            re_tag: Regex::new(r"(?s)<[^>]*>")?,
            re_entity: Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});")?,
            boilerplate,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Digest identifying this normalizer's configuration.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Normalizes raw text into lowercase, punctuation-free tokens.
    ///
    /// Empty or whitespace-only input yields no tokens.
    ///
    /// # Examples
    /// ```
    /// use plotmatch_core::text::{Normalizer, NormalizerConfig};
    ///
    /// let normalizer = Normalizer::new(NormalizerConfig::default()).unwrap();
    /// let tokens = normalizer.normalize("<p>The detective &amp; his <b>partner</b>.</p> (CC)");
    /// assert_eq!(tokens, ["detectiv", "partner"]);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw_text: &str) -> Vec<String> {
        if raw_text.trim().is_empty() {
            return Vec::new();
        }

        let mut text = raw_text.to_string();
        for (broken, fixed) in MOJIBAKE {
            if text.contains(broken) {
                text = text.replace(broken, fixed);
            }
        }

        if self.config.strip_html {
            text = self.re_script.replace_all(&text, " ").into_owned();
            text = self.re_tag.replace_all(&text, " ").into_owned();
            text = self
                .re_entity
                .replace_all(&text, |caps: &regex::Captures<'_>| decode_entity(&caps[1]))
                .into_owned();
        }

        for re in &self.boilerplate {
            text = re.replace_all(&text, " ").into_owned();
        }

        tokenize(&text)
            .into_iter()
            .filter(|t| !(self.config.remove_stopwords && is_stopword(t)))
            .map(|t| if self.config.stem { stem(&t) } else { t })
            .collect()
    }

    /// Normalized tokens joined by single spaces.
    #[must_use]
    pub fn clean_text(&self, raw_text: &str) -> String {
        self.normalize(raw_text).join(" ")
    }
}

/// Lowercases and splits on anything that is not alphanumeric. Apostrophes
/// join (`don't` -> `dont`).
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if matches!(c, '\'' | '\u{2019}' | '\u{2018}') {
            continue;
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn decode_entity(entity: &str) -> String {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        return code
            .and_then(char::from_u32)
            .map_or_else(|| " ".to_string(), |c| c.to_string());
    }

    match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" | "rsquo" | "lsquo" => "'",
        "eacute" => "é",
        "egrave" => "è",
        _ => " ",
    }
    .to_string()
}
