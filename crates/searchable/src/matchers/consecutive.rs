//! Subsequence matcher.

use crate::dialect::SqlDialect;
use crate::query::{SqlFragment, SqlParam};

use super::{escape_like, format_decimal, like};

/// Scores columns containing the token's characters in order.
///
/// The score is the weight scaled by how much of the column (spaces removed)
/// the match pattern covers, rounded to an integer. Columns that are empty
/// once spaces are removed score zero instead of dividing by zero.
pub struct ConsecutiveCharactersMatcher;

impl ConsecutiveCharactersMatcher {
    /// Builds the graded subsequence expression.
    pub fn build_sql(
        token: &str,
        column: &str,
        weight: f64,
        dialect: &dyn SqlDialect,
    ) -> SqlFragment {
        let Some(pattern) = Self::pattern(token) else {
            return SqlFragment::new("0");
        };
        let pattern_len = Self::pattern_len(token);
        let stripped_len = dialect.length(&format!("REPLACE({}, ' ', '')", column));

        SqlFragment::with_params(
            format!(
                "CASE WHEN {} AND {} > 0 THEN ROUND({} * {} / {}, 0) ELSE 0 END",
                like(column),
                stripped_len,
                format_decimal(weight),
                pattern_len,
                stripped_len
            ),
            vec![SqlParam::string(pattern)],
        )
    }

    fn pattern(token: &str) -> Option<String> {
        let chars: Vec<String> = token
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| escape_like(&c.to_string()))
            .collect();
        if chars.is_empty() {
            return None;
        }
        Some(format!("%{}%", chars.join("%")))
    }

    /// Length of the unescaped pattern: one wildcard around each character.
    fn pattern_len(token: &str) -> usize {
        let chars = token.chars().filter(|c| !c.is_whitespace()).count();
        2 * chars + 1
    }
}
