//! Helios Searchable
//!
//! This crate compiles a free-text search string into a relevance-scored SQL
//! query. A record type declares weighted searchable columns; the compiler
//! turns every (column, matcher) pair into a scoring expression, sums them
//! into a `relevance` column, drops rows below a threshold derived from the
//! configured weights and returns the best matches first. No search index is
//! involved; scoring is a deterministic weighted sum of pattern comparisons
//! evaluated by the database.
//!
//! # Architecture
//!
//! - [`tokenizer`] - search string normalization and quote-aware splitting
//! - [`matchers`] - the matcher library and its static registry
//! - [`dialect`] - per-backend quoting, functions and feature availability
//! - [`scoring`] - the relevance expression and its bound values
//! - [`threshold`] - the acceptance threshold
//! - [`assembler`] - filter, grouping, binding order and derived-table merge
//! - [`searcher`] - the entry point tying the steps together
//! - [`query`] - the query-builder capability and the bundled [`SelectQuery`]
//! - [`config`] - matcher weights and token cap
//! - [`types`] - the model-side [`SearchSpec`]
//! - [`error`] - error types
//!
//! # Quick Start
//!
//! ```
//! use helios_searchable::{SearchConfig, SearchModel, SearchSpec, Searcher, SelectQuery};
//!
//! let searcher = Searcher::for_driver(&SearchConfig::default(), "mysql").unwrap();
//! let users = SearchModel::new(
//!     "users",
//!     SearchSpec::new()
//!         .column("users.first_name", 10.0)
//!         .column("users.last_name", 10.0),
//! );
//!
//! let query = searcher
//!     .search(&users, SelectQuery::table("users"), "john smith")
//!     .unwrap();
//! let sql = query.to_sql(searcher.dialect());
//!
//! assert!(sql.sql.contains("AS `relevance`"));
//! assert_eq!(sql.params.len(), sql.sql.matches('?').count());
//! ```
//!
//! # Dialects
//!
//! | Driver | Quote | Length | Full text | Phonetic | Threshold |
//! |--------|-------|--------|-----------|----------|-----------|
//! | `mysql` | `` ` `` | `CHAR_LENGTH` | `MATCH .. AGAINST` | `SOUNDS LIKE` | `HAVING` |
//! | `pgsql` | `"` | `CHAR_LENGTH` | `ts_rank` | `SOUNDEX` | outer `WHERE` |
//! | `sqlite` | `` ` `` | `LENGTH` | - | - | `HAVING` |
//! | `sqlsrv` | `"` | `LEN` | `FREETEXT` | - | outer `WHERE` |
//!
//! Unrecognized drivers use the MySQL profile.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod assembler;
pub mod config;
pub mod dialect;
pub mod error;
pub mod matchers;
pub mod query;
pub mod scoring;
pub mod searcher;
pub mod threshold;
pub mod tokenizer;
pub mod types;

pub use assembler::CompiledQuery;
pub use config::SearchConfig;
pub use dialect::{DialectKind, RelevanceFilter, SqlDialect, dialect_for_driver};
pub use error::{ConfigResult, ConfigurationError, SearchError, SearchResult};
pub use matchers::{MatcherKind, MatcherSet};
pub use query::{
    BindingCategory, Bindings, JoinClause, JoinFilter, QueryBuilder, SelectQuery, SortDirection,
    SqlFragment, SqlParam,
};
pub use scoring::{RELEVANCE_ALIAS, ScoreExpression, ScoredTerm, TermSource};
pub use searcher::{SearchModel, SearchOptions, Searchable, Searcher};
pub use tokenizer::TokenSet;
pub use types::{GroupBy, JoinSpec, SearchSpec};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
