//! Phonetic matcher.

use crate::dialect::SqlDialect;
use crate::query::{SqlFragment, SqlParam};

use super::case_when;

/// Scores columns that sound like the token.
pub struct SimilarStringMatcher;

impl SimilarStringMatcher {
    /// Builds the dialect's phonetic comparison.
    pub fn build_sql(
        token: &str,
        column: &str,
        weight: f64,
        dialect: &dyn SqlDialect,
    ) -> SqlFragment {
        SqlFragment::with_params(
            case_when(&dialect.phonetic_comparison(column), weight),
            vec![SqlParam::string(token)],
        )
    }
}
