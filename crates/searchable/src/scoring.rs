//! Score expression builder.
//!
//! Walks the searchable columns in configuration order and, for each one,
//! every applicable matcher, producing one [`ScoredTerm`] per pair. Full-text
//! columns follow as dialect-native terms. The walk also accumulates the
//! relevance count the threshold is derived from, so the order here fixes both
//! the expression's value and the order of its bound values.

use crate::dialect::SqlDialect;
use crate::matchers::{MatcherKind, MatcherSet, format_number};
use crate::query::{SqlFragment, SqlParam};
use crate::tokenizer::TokenSet;
use crate::types::{SearchSpec, qualify};

/// Name of the computed relevance column.
pub const RELEVANCE_ALIAS: &str = "relevance";

/// What produced a scoring term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSource {
    /// A matcher from the matcher library.
    Matcher(MatcherKind),
    /// The dialect's native full-text search.
    FullText,
}

/// One contribution to the relevance expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTerm {
    /// Qualified column name.
    pub column: String,
    /// Matcher or full-text search.
    pub source: TermSource,
    /// Combined weight baked into the expression.
    pub weight: f64,
    /// Rendered SQL and its bound values, in placeholder order.
    pub fragment: SqlFragment,
}

impl ScoredTerm {
    fn is_matcher(&self) -> bool {
        matches!(self.source, TermSource::Matcher(_))
    }
}

/// The scoring terms of one compilation and the statistics derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreExpression {
    terms: Vec<ScoredTerm>,
    relevance_count: f64,
    column_count: usize,
    matcher_count: usize,
}

impl ScoreExpression {
    /// Builds every scoring term for `tokens`.
    ///
    /// `table` qualifies bare column names. Matchers are pruned by token count
    /// and dialect support before any term is emitted.
    pub fn build(
        spec: &SearchSpec,
        table: &str,
        tokens: &TokenSet,
        matchers: &MatcherSet,
        dialect: &dyn SqlDialect,
    ) -> Self {
        let applicable = matchers.applicable(tokens.len(), dialect);
        let mut terms = Vec::new();
        let mut relevance_count = matchers.total_weight();

        for (name, column_weight) in spec.columns.iter() {
            relevance_count += column_weight;
            let qualified = qualify(table, name);
            let reference = column_reference(spec, name, &qualified, dialect);

            for (kind, matcher_weight) in &applicable {
                let weight = column_weight * matcher_weight;
                terms.push(ScoredTerm {
                    column: qualified.clone(),
                    source: TermSource::Matcher(*kind),
                    weight,
                    fragment: kind.build(tokens, &reference, weight, dialect),
                });
            }
        }

        for (name, column_weight) in spec.fulltext_columns.iter() {
            relevance_count += column_weight;
            if !dialect.supports_full_text() {
                continue;
            }
            let qualified = qualify(table, name);
            let expression = dialect.full_text_expression(&dialect.quote_identifier(&qualified));
            terms.push(ScoredTerm {
                column: qualified,
                source: TermSource::FullText,
                weight: *column_weight,
                fragment: SqlFragment::with_params(
                    format!("({}) * {} * 2 * 100", expression, format_number(*column_weight)),
                    vec![SqlParam::string(tokens.fulltext_phrase())],
                ),
            });
        }

        Self {
            terms,
            relevance_count,
            column_count: spec.columns.len(),
            matcher_count: matchers.len(),
        }
    }

    /// Terms in evaluation order.
    pub fn terms(&self) -> &[ScoredTerm] {
        &self.terms
    }

    /// Matcher weights plus every column and full-text column weight.
    pub fn relevance_count(&self) -> f64 {
        self.relevance_count
    }

    /// Number of regular searchable columns.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Number of configured matchers.
    pub fn matcher_count(&self) -> usize {
        self.matcher_count
    }

    /// The summed relevance expression.
    ///
    /// Each column's matcher terms are summed and parenthesized, then added
    /// to the other columns and the full-text terms. With no terms at all the
    /// expression is `0`.
    pub fn to_fragment(&self) -> SqlFragment {
        let parts = self
            .terms
            .chunk_by(|a, b| a.is_matcher() && b.is_matcher() && a.column == b.column)
            .map(|chunk| {
                let summed = SqlFragment::sum(chunk.iter().map(|t| t.fragment.clone()))
                    .unwrap_or_else(|| SqlFragment::new("0"));
                if chunk[0].is_matcher() {
                    summed.parenthesized()
                } else {
                    summed
                }
            });
        SqlFragment::sum(parts).unwrap_or_else(|| SqlFragment::new("0"))
    }

    /// `(<expression>) AS relevance`, quoted for `dialect`.
    pub fn select_expression(&self, dialect: &dyn SqlDialect) -> SqlFragment {
        let fragment = self.to_fragment();
        SqlFragment::with_params(
            format!(
                "({}) AS {}",
                fragment.sql,
                dialect.quote_identifier(RELEVANCE_ALIAS)
            ),
            fragment.params,
        )
    }

    /// Bound values of every term, in placeholder order.
    pub fn params(&self) -> Vec<SqlParam> {
        self.terms
            .iter()
            .flat_map(|t| t.fragment.params.iter().cloned())
            .collect()
    }
}

/// Quoted column reference, wrapped in its mutation function if one is
/// configured under either the bare or the qualified name.
fn column_reference(
    spec: &SearchSpec,
    name: &str,
    qualified: &str,
    dialect: &dyn SqlDialect,
) -> String {
    let quoted = dialect.quote_identifier(qualified);
    match spec
        .mutations
        .get(name)
        .or_else(|| spec.mutations.get(qualified))
    {
        Some(function) => format!("{}({})", function, quoted),
        None => quoted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, SqliteDialect};

    fn matchers(names: &[(&str, f64)]) -> MatcherSet {
        MatcherSet::resolve(names.iter().copied()).unwrap()
    }

    #[test]
    fn test_terms_follow_column_then_matcher_order() {
        let spec = SearchSpec::new()
            .column("users.first_name", 10.0)
            .column("users.last_name", 5.0)
            .fulltext_column("users.bio", 2.0);
        let set = matchers(&[("startofStringMatcher", 50.0), ("acronymMatcher", 42.0)]);
        let tokens = TokenSet::parse("jo", 5).unwrap();

        let score = ScoreExpression::build(&spec, "users", &tokens, &set, &MySqlDialect);

        let order: Vec<(&str, TermSource)> = score
            .terms()
            .iter()
            .map(|t| (t.column.as_str(), t.source))
            .collect();
        assert_eq!(
            order,
            vec![
                ("users.first_name", TermSource::Matcher(MatcherKind::StartOfString)),
                ("users.first_name", TermSource::Matcher(MatcherKind::Acronym)),
                ("users.last_name", TermSource::Matcher(MatcherKind::StartOfString)),
                ("users.last_name", TermSource::Matcher(MatcherKind::Acronym)),
                ("users.bio", TermSource::FullText),
            ]
        );
        assert_eq!(score.terms()[0].weight, 500.0);
        assert_eq!(
            score.params(),
            vec![
                SqlParam::string("jo%"),
                SqlParam::string("j% o%"),
                SqlParam::string("jo%"),
                SqlParam::string("j% o%"),
                SqlParam::string("jo"),
            ]
        );
    }

    #[test]
    fn test_relevance_count() {
        let spec = SearchSpec::new()
            .column("users.first_name", 10.0)
            .column("users.last_name", 5.0)
            .fulltext_column("users.bio", 2.0);
        let set = matchers(&[("startofStringMatcher", 50.0), ("acronymMatcher", 42.0)]);
        let tokens = TokenSet::parse("jo", 5).unwrap();

        let score = ScoreExpression::build(&spec, "users", &tokens, &set, &SqliteDialect);
        assert_eq!(score.relevance_count(), 109.0);
        assert_eq!(score.column_count(), 2);
        assert_eq!(score.matcher_count(), 2);
    }

    #[test]
    fn test_full_text_skipped_on_sqlite() {
        let spec = SearchSpec::new()
            .column("users.name", 1.0)
            .fulltext_column("users.bio", 2.0);
        let set = matchers(&[("startofStringMatcher", 50.0)]);
        let tokens = TokenSet::parse("jo", 5).unwrap();

        let score = ScoreExpression::build(&spec, "users", &tokens, &set, &SqliteDialect);
        assert!(score.terms().iter().all(|t| t.source != TermSource::FullText));
        assert!(!score.to_fragment().sql.contains("MATCH"));
    }

    #[test]
    fn test_full_text_term_shape() {
        let spec = SearchSpec::new().fulltext_column("posts.body", 3.0);
        let set = matchers(&[]);
        let tokens = TokenSet::parse("ab cdef", 5).unwrap();

        let score = ScoreExpression::build(&spec, "posts", &tokens, &set, &MySqlDialect);
        let fragment = score.to_fragment();
        assert_eq!(
            fragment.sql,
            "(MATCH(`posts`.`body`) AGAINST (?)) * 3 * 2 * 100"
        );
        assert_eq!(fragment.params, vec![SqlParam::string("cdef ab")]);
    }

    #[test]
    fn test_columns_are_parenthesized_and_summed() {
        let spec = SearchSpec::new().column("a", 1.0).column("b", 2.0);
        let set = matchers(&[("startofStringMatcher", 10.0)]);
        let tokens = TokenSet::parse("x", 5).unwrap();

        let score = ScoreExpression::build(&spec, "t", &tokens, &set, &MySqlDialect);
        assert_eq!(
            score.select_expression(&MySqlDialect).sql,
            "((CASE WHEN LOWER(`t`.`a`) LIKE ? ESCAPE '!' THEN 10 ELSE 0 END) + \
             (CASE WHEN LOWER(`t`.`b`) LIKE ? ESCAPE '!' THEN 20 ELSE 0 END)) AS `relevance`"
        );
    }

    #[test]
    fn test_mutation_wraps_column() {
        let spec = SearchSpec::new()
            .column("users.phone", 1.0)
            .mutation("users.phone", "TRIM");
        let set = matchers(&[("startofStringMatcher", 10.0)]);
        let tokens = TokenSet::parse("555", 5).unwrap();

        let score = ScoreExpression::build(&spec, "users", &tokens, &set, &MySqlDialect);
        assert!(
            score.terms()[0]
                .fragment
                .sql
                .contains("LOWER(TRIM(`users`.`phone`))")
        );
    }

    #[test]
    fn test_no_terms_scores_zero() {
        let spec = SearchSpec::new();
        let set = matchers(&[("startofStringMatcher", 10.0)]);
        let tokens = TokenSet::parse("x", 5).unwrap();

        let score = ScoreExpression::build(&spec, "t", &tokens, &set, &MySqlDialect);
        assert_eq!(score.select_expression(&MySqlDialect).sql, "(0) AS `relevance`");
        assert!(score.params().is_empty());
    }
}
