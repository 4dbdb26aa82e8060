//! Prefix matchers.

use crate::query::{SqlFragment, SqlParam};

use super::{case_when, escape_like, like};

/// Scores columns that start with the token.
pub struct StartOfStringMatcher;

impl StartOfStringMatcher {
    /// Builds a `LIKE 'token%'` comparison.
    pub fn build_sql(token: &str, column: &str, weight: f64) -> SqlFragment {
        SqlFragment::with_params(
            case_when(&like(column), weight),
            vec![SqlParam::string(format!("{}%", escape_like(token)))],
        )
    }
}

/// Scores columns whose successive words start with the token's words.
///
/// `"new yo"` becomes `new% yo%`: each word boundary in the token becomes
/// a wildcard followed by a word boundary in the column.
pub struct StartOfWordsMatcher;

impl StartOfWordsMatcher {
    /// Builds the word-prefix comparison.
    pub fn build_sql(token: &str, column: &str, weight: f64) -> SqlFragment {
        SqlFragment::with_params(
            case_when(&like(column), weight),
            vec![SqlParam::string(Self::pattern(token))],
        )
    }

    fn pattern(token: &str) -> String {
        let words: Vec<String> = token.split_whitespace().map(escape_like).collect();
        format!("{}%", words.join("% "))
    }
}
