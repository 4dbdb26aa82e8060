//! SQL dialect adapters.
//!
//! Every backend difference the compiler cares about lives behind
//! [`SqlDialect`]: identifier quoting, the string-length function, which
//! matchers and full-text search are available, and how the relevance
//! threshold is enforced. Callers obtain an adapter once per driver with
//! [`dialect_for_driver`]; nothing else in the crate inspects driver names.

use std::fmt;

use crate::matchers::MatcherKind;

/// Identifies a dialect adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// MySQL and MariaDB.
    MySql,
    /// PostgreSQL.
    Postgres,
    /// SQLite (file-based or in-memory).
    Sqlite,
    /// Microsoft SQL Server.
    SqlServer,
    /// Unrecognized driver; uses the default profile.
    Generic,
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::MySql => write!(f, "mysql"),
            DialectKind::Postgres => write!(f, "pgsql"),
            DialectKind::Sqlite => write!(f, "sqlite"),
            DialectKind::SqlServer => write!(f, "sqlsrv"),
            DialectKind::Generic => write!(f, "generic"),
        }
    }
}

/// How rows below the relevance threshold are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceFilter {
    /// `HAVING relevance >= t` on the scored query, grouped to avoid
    /// duplicate rows from joins.
    Having,
    /// `WHERE CAST(relevance AS DECIMAL(10,2)) >= t` on the enclosing query.
    /// The scored query is not grouped; the derived table carries the alias.
    OuterWhere,
}

/// How a row limit is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// Trailing `LIMIT n [OFFSET m]`.
    Limit,
    /// `SELECT TOP n`, or `OFFSET m ROWS FETCH NEXT n ROWS ONLY` with an offset.
    Top,
}

/// Backend-specific quoting, functions and feature availability.
pub trait SqlDialect: Send + Sync + fmt::Debug {
    /// Which adapter this is.
    fn kind(&self) -> DialectKind;

    /// Character used to quote identifiers.
    fn quote_char(&self) -> char {
        '`'
    }

    /// Name of the character-length function.
    fn length_function(&self) -> &'static str {
        "CHAR_LENGTH"
    }

    /// Does this backend provide native full-text search?
    fn supports_full_text(&self) -> bool {
        true
    }

    /// Is the given matcher available on this backend?
    fn supports_matcher(&self, _matcher: MatcherKind) -> bool {
        true
    }

    /// Strategy for enforcing the relevance threshold.
    fn relevance_filter(&self) -> RelevanceFilter {
        RelevanceFilter::Having
    }

    /// Native full-text score for a column, with one `?` for the search phrase.
    fn full_text_expression(&self, column: &str) -> String {
        format!("MATCH({}) AGAINST (?)", column)
    }

    /// Phonetic equality between a column and one `?` value.
    fn phonetic_comparison(&self, column: &str) -> String {
        format!("{} SOUNDS LIKE ?", column)
    }

    /// Placeholder for the 1-based parameter `index`.
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// How row limits are written.
    fn limit_style(&self) -> LimitStyle {
        LimitStyle::Limit
    }

    /// Wraps an expression in the length function.
    fn length(&self, expr: &str) -> String {
        format!("{}({})", self.length_function(), expr)
    }

    /// Quotes a possibly dotted identifier (`table.column`, `table.*`).
    fn quote_identifier(&self, identifier: &str) -> String {
        let q = self.quote_char();
        identifier
            .split('.')
            .map(|segment| {
                if segment == "*" {
                    segment.to_string()
                } else {
                    let escaped = segment.replace(q, &format!("{}{}", q, q));
                    format!("{}{}{}", q, escaped, q)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// MySQL / MariaDB: the default profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }
}

/// Fallback for drivers the crate does not recognize.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

impl SqlDialect for GenericDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Generic
    }
}

/// PostgreSQL.
///
/// PostgreSQL cannot reference a select-list alias in HAVING, so the
/// threshold is enforced on the enclosing query.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn relevance_filter(&self) -> RelevanceFilter {
        RelevanceFilter::OuterWhere
    }

    fn full_text_expression(&self, column: &str) -> String {
        format!("ts_rank(to_tsvector({}), plainto_tsquery(?))", column)
    }

    fn phonetic_comparison(&self, column: &str) -> String {
        format!("SOUNDEX({}) = SOUNDEX(?)", column)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}

/// SQLite: no full-text MATCH on ordinary tables and no SOUNDEX in default
/// builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn length_function(&self) -> &'static str {
        "LENGTH"
    }

    fn supports_full_text(&self) -> bool {
        false
    }

    fn supports_matcher(&self, matcher: MatcherKind) -> bool {
        matcher != MatcherKind::SimilarString
    }
}

/// Microsoft SQL Server: computed aliases cannot be grouped on or referenced
/// in HAVING.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn length_function(&self) -> &'static str {
        "LEN"
    }

    fn supports_matcher(&self, matcher: MatcherKind) -> bool {
        matcher != MatcherKind::SimilarString
    }

    fn relevance_filter(&self) -> RelevanceFilter {
        RelevanceFilter::OuterWhere
    }

    fn full_text_expression(&self, column: &str) -> String {
        format!("CASE WHEN FREETEXT({}, ?) THEN 1 ELSE 0 END", column)
    }

    fn phonetic_comparison(&self, column: &str) -> String {
        format!("SOUNDEX({}) = SOUNDEX(?)", column)
    }

    fn limit_style(&self) -> LimitStyle {
        LimitStyle::Top
    }
}

static MYSQL: MySqlDialect = MySqlDialect;
static POSTGRES: PostgresDialect = PostgresDialect;
static SQLITE: SqliteDialect = SqliteDialect;
static SQLSERVER: SqlServerDialect = SqlServerDialect;
static GENERIC: GenericDialect = GenericDialect;

/// Resolves a connection driver name to its dialect adapter.
///
/// Unrecognized drivers fall back to [`GenericDialect`].
pub fn dialect_for_driver(driver: &str) -> &'static dyn SqlDialect {
    match driver.trim().to_ascii_lowercase().as_str() {
        "mysql" | "mariadb" => &MYSQL,
        "pgsql" | "postgres" | "postgresql" => &POSTGRES,
        "sqlite" | "sqlite3" => &SQLITE,
        "sqlsrv" | "mssql" | "sqlserver" => &SQLSERVER,
        other => {
            tracing::warn!(driver = %other, "Unrecognized driver, using generic SQL dialect");
            &GENERIC
        }
    }
}
