//! SQL fragments with positionally bound parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fragment of SQL with bound parameters.
///
/// Placeholders are written as `?`; `params` holds one value per placeholder
/// in the order the placeholders appear in `sql`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Null parameter.
    Null,
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }

    /// Creates a float parameter.
    pub fn float(f: f64) -> Self {
        SqlParam::Float(f)
    }

    /// Returns the string value, if this is a string parameter.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlParam::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlParam::Integer(i) => write!(f, "{}", i),
            SqlParam::Float(x) => write!(f, "{}", x),
            SqlParam::Null => write!(f, "NULL"),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::String(s.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::String(s)
    }
}

impl From<i64> for SqlParam {
    fn from(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl From<i32> for SqlParam {
    fn from(i: i32) -> Self {
        SqlParam::Integer(i64::from(i))
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Combines with another fragment using `+`.
    ///
    /// Parameters of `other` follow this fragment's parameters, matching the
    /// textual order of their placeholders.
    pub fn plus(mut self, other: SqlFragment) -> Self {
        if !self.sql.is_empty() && !other.sql.is_empty() {
            self.sql = format!("{} + {}", self.sql, other.sql);
        } else if !other.sql.is_empty() {
            self.sql = other.sql;
        }
        self.params.extend(other.params);
        self
    }

    /// Sums fragments left to right; `None` when there is nothing to sum.
    pub fn sum(fragments: impl IntoIterator<Item = SqlFragment>) -> Option<SqlFragment> {
        fragments
            .into_iter()
            .filter(|f| !f.is_empty())
            .reduce(SqlFragment::plus)
    }

    /// Wraps the SQL in parentheses.
    pub fn parenthesized(mut self) -> Self {
        if !self.sql.is_empty() {
            self.sql = format!("({})", self.sql);
        }
        self
    }

    /// Returns the number of `?` placeholders outside string literals.
    pub fn placeholder_count(&self) -> usize {
        let mut in_literal = false;
        let mut count = 0;
        for c in self.sql.chars() {
            match c {
                '\'' => in_literal = !in_literal,
                '?' if !in_literal => count += 1,
                _ => {}
            }
        }
        count
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}
