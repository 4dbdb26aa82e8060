//! Whole-phrase matchers.

use crate::query::{SqlFragment, SqlParam};

use super::{case_when, escape_like, like, lowered};

/// Scores columns equal to the whole search phrase.
pub struct ExactFullMatcher;

impl ExactFullMatcher {
    /// Builds `CASE WHEN LOWER(column) = ? ...` bound to `phrase`.
    pub fn build_sql(phrase: &str, column: &str, weight: f64) -> SqlFragment {
        SqlFragment::with_params(
            case_when(&format!("{} = ?", lowered(column)), weight),
            vec![SqlParam::string(phrase)],
        )
    }
}

/// Scores columns containing the whole search phrase.
pub struct ExactInStringMatcher;

impl ExactInStringMatcher {
    /// Builds `CASE WHEN LOWER(column) LIKE ? ...` bound to `%phrase%`.
    pub fn build_sql(phrase: &str, column: &str, weight: f64) -> SqlFragment {
        SqlFragment::with_params(
            case_when(&like(column), weight),
            vec![SqlParam::string(format!("%{}%", escape_like(phrase)))],
        )
    }
}
