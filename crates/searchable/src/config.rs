//! Process-wide search configuration.
//!
//! The configuration names the matchers to run, their weights and the token
//! cap. It is loaded once, validated into a [`MatcherSet`], and handed to a
//! [`Searcher`](crate::Searcher) at construction; compilation never reads
//! ambient state.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCHABLE_CONFIG` | unset | Path of a JSON configuration file |
//! | `SEARCHABLE_MAX_WORDS` | 5 | Token cap override |
//!
//! # Example
//!
//! ```rust
//! use helios_searchable::SearchConfig;
//!
//! let config = SearchConfig::from_json(
//!     r#"{"matchers": {"startofStringMatcher": 50, "timesInStringMatcher": 8}, "maxWords": 3}"#,
//! )
//! .unwrap();
//! let matchers = config.validate().unwrap();
//! assert_eq!(matchers.len(), 2);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigResult, ConfigurationError};
use crate::matchers::{MatcherKind, MatcherSet};
use crate::types::OrderedMap;

/// Default token cap.
pub const DEFAULT_MAX_WORDS: usize = 5;

/// Matcher weights and token cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Matcher name to weight, in evaluation order.
    #[serde(default = "default_matchers")]
    pub matchers: OrderedMap<f64>,

    /// Maximum number of tokens taken from a search string.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

fn default_matchers() -> OrderedMap<f64> {
    MatcherKind::ALL
        .iter()
        .map(|kind| (kind.name(), kind.default_weight()))
        .collect()
}

fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            matchers: default_matchers(),
            max_words: DEFAULT_MAX_WORDS,
        }
    }
}

impl SearchConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    /// Loads from `SEARCHABLE_CONFIG` if set, otherwise defaults, then applies
    /// `SEARCHABLE_MAX_WORDS`.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = match std::env::var("SEARCHABLE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path)?,
            _ => Self::default(),
        };

        if let Ok(raw) = std::env::var("SEARCHABLE_MAX_WORDS") {
            config.max_words = raw.trim().parse().map_err(|_| ConfigurationError::Parse {
                message: format!("SEARCHABLE_MAX_WORDS is not a number: '{}'", raw),
            })?;
        }

        Ok(config)
    }

    /// Sets a matcher weight, keeping the matcher's position if present.
    pub fn with_matcher(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.matchers.insert(name, weight);
        self
    }

    /// Sets the token cap.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    /// Resolves every configured matcher against the matcher library.
    ///
    /// Fails on the first unknown name or negative weight.
    pub fn validate(&self) -> ConfigResult<MatcherSet> {
        if self.max_words == 0 {
            return Err(ConfigurationError::InvalidMaxWords);
        }
        MatcherSet::resolve(self.matchers.iter().map(|(name, weight)| (name, *weight)))
    }
}
