//! Matcher library.
//!
//! Each matcher knows how to turn a token (or, for the exact matchers, the
//! whole token set) into a scoring SQL expression for one column, together
//! with the values bound at its placeholders.
//!
//! Matchers are resolved from their configured names once, when the
//! configuration is validated, into a [`MatcherSet`]. Compilation dispatches
//! on [`MatcherKind`] and never looks names up again.

mod acronym;
mod consecutive;
mod exact;
mod prefix;
mod similar;
mod times;

pub use acronym::AcronymMatcher;
pub use consecutive::ConsecutiveCharactersMatcher;
pub use exact::{ExactFullMatcher, ExactInStringMatcher};
pub use prefix::{StartOfStringMatcher, StartOfWordsMatcher};
pub use similar::SimilarStringMatcher;
pub use times::TimesInStringMatcher;

use std::fmt;

use crate::dialect::SqlDialect;
use crate::error::{ConfigResult, ConfigurationError};
use crate::query::SqlFragment;
use crate::tokenizer::TokenSet;

/// The fuzzy and exact comparison strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    /// Column equals the whole phrase.
    ExactFull,
    /// Column contains the whole phrase.
    ExactInString,
    /// Column starts with the token.
    StartOfString,
    /// Token letters start successive words of the column.
    Acronym,
    /// Token letters appear in order in the column.
    ConsecutiveCharacters,
    /// Each word of the token prefixes successive words of the column.
    StartOfWords,
    /// Column sounds like the token.
    SimilarString,
    /// Number of occurrences of the token in the column.
    TimesInString,
}

impl MatcherKind {
    /// Every matcher, in default evaluation order.
    pub const ALL: [MatcherKind; 8] = [
        MatcherKind::ExactFull,
        MatcherKind::ExactInString,
        MatcherKind::StartOfString,
        MatcherKind::Acronym,
        MatcherKind::ConsecutiveCharacters,
        MatcherKind::StartOfWords,
        MatcherKind::SimilarString,
        MatcherKind::TimesInString,
    ];

    /// Configuration name.
    pub fn name(&self) -> &'static str {
        match self {
            MatcherKind::ExactFull => "exactFullMatcher",
            MatcherKind::ExactInString => "exactInStringMatcher",
            MatcherKind::StartOfString => "startofStringMatcher",
            MatcherKind::Acronym => "acronymMatcher",
            MatcherKind::ConsecutiveCharacters => "consecutiveCharactersMatcher",
            MatcherKind::StartOfWords => "startOfWordsMatcher",
            MatcherKind::SimilarString => "similarStringMatcher",
            MatcherKind::TimesInString => "timesInStringMatcher",
        }
    }

    /// Resolves a configuration name.
    pub fn from_name(name: &str) -> Option<MatcherKind> {
        MatcherKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Weight used when no configuration is supplied.
    pub fn default_weight(&self) -> f64 {
        match self {
            MatcherKind::ExactFull => 100.0,
            MatcherKind::ExactInString => 80.0,
            MatcherKind::StartOfString => 50.0,
            MatcherKind::Acronym => 42.0,
            MatcherKind::ConsecutiveCharacters => 40.0,
            MatcherKind::StartOfWords => 35.0,
            MatcherKind::SimilarString => 30.0,
            MatcherKind::TimesInString => 8.0,
        }
    }

    /// True for the matchers that compare against the whole token set.
    pub fn uses_whole_phrase(&self) -> bool {
        matches!(self, MatcherKind::ExactFull | MatcherKind::ExactInString)
    }

    /// Builds the scoring expression of this matcher for one column.
    ///
    /// `column` is the rendered column reference (quoted, mutation applied)
    /// and `weight` the combined column and matcher weight. Per-token
    /// matchers emit one term per token, summed in token order.
    pub fn build(
        &self,
        tokens: &TokenSet,
        column: &str,
        weight: f64,
        dialect: &dyn SqlDialect,
    ) -> SqlFragment {
        match self {
            MatcherKind::ExactFull | MatcherKind::ExactInString => {
                self.build_token(&tokens.phrase(), column, weight, dialect)
            }
            _ => {
                let terms = tokens
                    .words()
                    .iter()
                    .map(|token| self.build_token(token, column, weight, dialect));
                SqlFragment::sum(terms).unwrap_or_else(|| SqlFragment::new("0"))
            }
        }
    }

    fn build_token(
        &self,
        token: &str,
        column: &str,
        weight: f64,
        dialect: &dyn SqlDialect,
    ) -> SqlFragment {
        match self {
            MatcherKind::ExactFull => ExactFullMatcher::build_sql(token, column, weight),
            MatcherKind::ExactInString => ExactInStringMatcher::build_sql(token, column, weight),
            MatcherKind::StartOfString => StartOfStringMatcher::build_sql(token, column, weight),
            MatcherKind::Acronym => AcronymMatcher::build_sql(token, column, weight),
            MatcherKind::ConsecutiveCharacters => {
                ConsecutiveCharactersMatcher::build_sql(token, column, weight, dialect)
            }
            MatcherKind::StartOfWords => StartOfWordsMatcher::build_sql(token, column, weight),
            MatcherKind::SimilarString => {
                SimilarStringMatcher::build_sql(token, column, weight, dialect)
            }
            MatcherKind::TimesInString => {
                TimesInStringMatcher::build_sql(token, column, weight, dialect)
            }
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated, ordered matcher configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherSet {
    matchers: Vec<(MatcherKind, f64)>,
}

impl MatcherSet {
    /// Resolves `(name, weight)` pairs, preserving their order.
    pub fn resolve<'a>(entries: impl IntoIterator<Item = (&'a str, f64)>) -> ConfigResult<Self> {
        let mut matchers = Vec::new();
        for (name, weight) in entries {
            let kind =
                MatcherKind::from_name(name).ok_or_else(|| ConfigurationError::UnknownMatcher {
                    name: name.to_string(),
                })?;
            if weight < 0.0 || weight.is_nan() {
                return Err(ConfigurationError::NegativeWeight {
                    name: name.to_string(),
                    weight,
                });
            }
            matchers.push((kind, weight));
        }
        Ok(Self { matchers })
    }

    /// Configured matchers and weights, in order.
    pub fn iter(&self) -> impl Iterator<Item = (MatcherKind, f64)> + '_ {
        self.matchers.iter().copied()
    }

    /// Number of configured matchers.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Returns true if no matcher is configured.
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Sum of all configured matcher weights.
    pub fn total_weight(&self) -> f64 {
        self.matchers.iter().map(|(_, w)| w).sum()
    }

    /// Matchers that apply to a search of `token_count` tokens on `dialect`.
    ///
    /// The whole-phrase matchers need at least two tokens; matchers the
    /// dialect cannot express are dropped rather than failing.
    pub fn applicable(
        &self,
        token_count: usize,
        dialect: &dyn SqlDialect,
    ) -> Vec<(MatcherKind, f64)> {
        self.iter()
            .filter(|(kind, _)| {
                if kind.uses_whole_phrase() && token_count < 2 {
                    tracing::debug!(matcher = %kind, "Skipping whole-phrase matcher for single token");
                    return false;
                }
                if !dialect.supports_matcher(*kind) {
                    tracing::debug!(matcher = %kind, dialect = %dialect.kind(), "Matcher not supported by dialect");
                    return false;
                }
                true
            })
            .collect()
    }
}

/// Escape character of every generated `LIKE` comparison.
pub(crate) const LIKE_ESCAPE: char = '!';

/// `LOWER(column)`; tokens are already lowercase.
pub(crate) fn lowered(column: &str) -> String {
    format!("LOWER({})", column)
}

/// `LOWER(column) LIKE ? ESCAPE '!'`
pub(crate) fn like(column: &str) -> String {
    format!("{} LIKE ? ESCAPE '{}'", lowered(column), LIKE_ESCAPE)
}

/// Escapes `text` so it matches literally inside a `LIKE` pattern.
///
/// Covers `%` and `_` everywhere and `[`, which SQL Server treats as a
/// character class.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '[' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// `CASE WHEN condition THEN weight ELSE 0 END`
pub(crate) fn case_when(condition: &str, weight: f64) -> String {
    format!(
        "CASE WHEN {} THEN {} ELSE 0 END",
        condition,
        format_number(weight)
    )
}

/// Renders a weight as an SQL numeric literal.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Like [`format_number`], but always with a decimal point so that
/// dividing by it or into it never falls back to integer division.
pub(crate) fn format_decimal(value: f64) -> String {
    let mut literal = format_number(value);
    if !literal.contains('.') {
        literal.push_str(".0");
    }
    literal
}
