//! Occurrence-count matcher.

use crate::dialect::SqlDialect;
use crate::query::{SqlFragment, SqlParam};

use super::{format_number, lowered};

/// Scores columns by how many times the token occurs in them.
///
/// The count is `(length(column) - length(column without token)) /
/// length(token)`. The token length is a literal known at compile time; an
/// empty token contributes nothing. NULL columns score zero.
pub struct TimesInStringMatcher;

impl TimesInStringMatcher {
    /// Builds the graded occurrence expression.
    pub fn build_sql(
        token: &str,
        column: &str,
        weight: f64,
        dialect: &dyn SqlDialect,
    ) -> SqlFragment {
        let token_len = token.chars().count();
        if token_len == 0 {
            return SqlFragment::new("0");
        }

        SqlFragment::with_params(
            format!(
                "COALESCE(ROUND({} * ({} - {}) / {}, 0), 0)",
                format_number(weight),
                dialect.length(&lowered(column)),
                dialect.length(&format!("REPLACE({}, ?, '')", lowered(column))),
                token_len
            ),
            vec![SqlParam::string(token)],
        )
    }
}
