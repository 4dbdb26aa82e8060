//! The search entry point.
//!
//! A [`Searcher`] holds a validated matcher configuration and a dialect. It
//! keeps no per-search state, so one instance can serve any number of
//! concurrent searches; every call builds its tokens, terms and bindings in
//! locals and hands back a new query.

use serde::{Deserialize, Serialize};

use crate::assembler::{self, CompiledQuery, Target};
use crate::config::SearchConfig;
use crate::dialect::{SqlDialect, dialect_for_driver};
use crate::error::{SearchError, SearchResult};
use crate::matchers::{MatcherKind, MatcherSet};
use crate::query::QueryBuilder;
use crate::scoring::ScoreExpression;
use crate::tokenizer::TokenSet;
use crate::types::SearchSpec;

/// Default number of rows returned by a search.
pub const DEFAULT_LIMIT: usize = 25;

/// A record type that can be searched.
pub trait Searchable {
    /// Base table.
    fn table_name(&self) -> &str;

    /// Primary key column.
    fn key_name(&self) -> &str {
        "id"
    }

    /// Searchable-column configuration.
    fn search_spec(&self) -> &SearchSpec;
}

/// A model described by data rather than a Rust type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchModel {
    /// Base table.
    pub table: String,
    /// Primary key column.
    #[serde(default = "default_key")]
    pub key: String,
    /// Searchable-column configuration.
    #[serde(default)]
    pub search: SearchSpec,
}

fn default_key() -> String {
    "id".to_string()
}

impl SearchModel {
    /// Creates a model keyed on `id`.
    pub fn new(table: impl Into<String>, search: SearchSpec) -> Self {
        Self {
            table: table.into(),
            key: default_key(),
            search,
        }
    }

    /// Sets the primary key column.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl Searchable for SearchModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn key_name(&self) -> &str {
        &self.key
    }

    fn search_spec(&self) -> &SearchSpec {
        &self.search
    }
}

/// Hook applied to the compiled query before it is finalized.
pub type Restriction<'a, Q> = Box<dyn FnOnce(CompiledQuery<Q>) -> CompiledQuery<Q> + 'a>;

/// Per-call search options.
pub struct SearchOptions<'a, Q> {
    limit: usize,
    threshold: Option<f64>,
    restriction: Option<Restriction<'a, Q>>,
}

impl<Q> Default for SearchOptions<'_, Q> {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            threshold: None,
            restriction: None,
        }
    }
}

impl<'a, Q> SearchOptions<'a, Q> {
    /// Default options: 25 rows, computed threshold, no restriction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Uses a fixed threshold instead of the computed one.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Sets the restriction hook.
    pub fn restriction(
        mut self,
        restriction: impl FnOnce(CompiledQuery<Q>) -> CompiledQuery<Q> + 'a,
    ) -> Self {
        self.restriction = Some(Box::new(restriction));
        self
    }
}

/// Compiles search strings into scored queries.
#[derive(Debug, Clone)]
pub struct Searcher {
    matchers: MatcherSet,
    max_words: usize,
    dialect: &'static dyn SqlDialect,
}

impl Searcher {
    /// Validates `config` and binds it to `dialect`.
    pub fn new(config: &SearchConfig, dialect: &'static dyn SqlDialect) -> SearchResult<Self> {
        let matchers = config.validate()?;
        Ok(Self {
            matchers,
            max_words: config.max_words,
            dialect,
        })
    }

    /// Like [`Searcher::new`], resolving the dialect from a driver name.
    pub fn for_driver(config: &SearchConfig, driver: &str) -> SearchResult<Self> {
        Self::new(config, dialect_for_driver(driver))
    }

    /// The dialect queries are compiled for.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.dialect
    }

    /// The configured matchers.
    pub fn matchers(&self) -> &MatcherSet {
        &self.matchers
    }

    /// Matchers applied to a search of `token_count` tokens.
    pub fn applicable_matchers(&self, token_count: usize) -> Vec<MatcherKind> {
        self.matchers
            .applicable(token_count, self.dialect)
            .into_iter()
            .map(|(kind, _)| kind)
            .collect()
    }

    /// Searches with default options.
    pub fn search<Q: QueryBuilder>(
        &self,
        model: &impl Searchable,
        query: Q,
        search: &str,
    ) -> SearchResult<Q> {
        self.search_with(model, query, search, SearchOptions::default())
    }

    /// Wraps `query` around the scored search subquery.
    ///
    /// Returns `query` untouched when `search` has no tokens.
    pub fn search_with<'a, Q: QueryBuilder + 'a>(
        &self,
        model: &impl Searchable,
        query: Q,
        search: &str,
        options: SearchOptions<'a, Q>,
    ) -> SearchResult<Q> {
        let SearchOptions {
            limit,
            threshold,
            restriction,
        } = options;

        let Some(compiled) = self.compile(model, &query, search, limit, threshold)? else {
            return Ok(query);
        };
        let compiled = match restriction {
            Some(restrict) => restrict(compiled),
            None => compiled,
        };
        check_threshold(compiled.threshold())?;
        Ok(assembler::finalize(compiled, query, self.dialect))
    }

    /// Builds the scored query without finalizing or merging it.
    ///
    /// `None` when `search` has no tokens. `threshold` overrides the computed
    /// threshold.
    pub fn compile<Q: QueryBuilder>(
        &self,
        model: &impl Searchable,
        query: &Q,
        search: &str,
        limit: usize,
        threshold: Option<f64>,
    ) -> SearchResult<Option<CompiledQuery<Q>>> {
        if limit == 0 {
            return Err(SearchError::InvalidLimit);
        }
        if let Some(threshold) = threshold {
            check_threshold(threshold)?;
        }
        let spec = model.search_spec();
        spec.validate()?;

        let table = model.table_name();
        let max_words = spec.max_words.unwrap_or(self.max_words);
        let Some(tokens) = TokenSet::parse(search, max_words) else {
            tracing::debug!(table = %table, "Empty search string, returning query unchanged");
            return Ok(None);
        };

        let score = ScoreExpression::build(spec, table, &tokens, &self.matchers, self.dialect);
        let threshold = threshold.unwrap_or_else(|| {
            crate::threshold::compute(
                score.relevance_count(),
                score.column_count(),
                score.matcher_count(),
            )
        });

        let target = Target {
            table,
            key: model.key_name(),
            spec,
        };
        let compiled =
            assembler::prepare(query, target, &score, threshold, limit, self.dialect)?;

        tracing::debug!(
            table = %table,
            dialect = %self.dialect.kind(),
            tokens = tokens.len(),
            terms = score.terms().len(),
            threshold = threshold,
            bindings = compiled.scoring_bindings().len(),
            "Compiled relevance query"
        );

        Ok(Some(compiled))
    }
}

fn check_threshold(threshold: f64) -> SearchResult<()> {
    if threshold.is_finite() {
        Ok(())
    } else {
        Err(SearchError::InvalidThreshold { threshold })
    }
}
