//! Query assembly.
//!
//! Turns a caller's query and a [`ScoreExpression`] into the scored,
//! thresholded subquery and merges it back into the caller's query as a
//! derived table named after the model's table.
//!
//! Assembly happens in two steps so that a restriction hook can run in
//! between:
//!
//! 1. [`prepare`] clones the caller's query, selects the base table's columns,
//!    applies the configured joins and adds the relevance column.
//! 2. [`finalize`] applies the threshold filter and group-by, orders by
//!    relevance, applies the limit, rebinds the values as
//!    `[scoring bindings] + [clone's own bindings]` and merges.

use crate::dialect::{RelevanceFilter, SqlDialect};
use crate::error::ConfigResult;
use crate::matchers::format_number;
use crate::query::{BindingCategory, Bindings, QueryBuilder, SqlFragment, SqlParam};
use crate::scoring::{RELEVANCE_ALIAS, ScoreExpression};
use crate::types::{SearchSpec, qualify, table_of};

/// A scored query between preparation and merge.
///
/// Restriction hooks receive this value and may add conditions to the scored
/// query or adjust threshold, limit and group-by before it is finalized.
#[derive(Debug, Clone)]
pub struct CompiledQuery<Q> {
    query: Q,
    table: String,
    relevance: SqlFragment,
    threshold: f64,
    limit: usize,
    group_by: Vec<String>,
    filter: RelevanceFilter,
}

impl<Q: QueryBuilder> CompiledQuery<Q> {
    /// The scored query.
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Mutable access to the scored query. Values bound through the query's
    /// own API are placed after the scoring bindings.
    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    /// Replaces the scored query with `f(query)`.
    pub fn map_query(mut self, f: impl FnOnce(Q) -> Q) -> Self {
        self.query = f(self.query);
        self
    }

    /// Name the scored query is merged under.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The relevance select expression and its bound values.
    pub fn relevance(&self) -> &SqlFragment {
        &self.relevance
    }

    /// Bound values of the relevance expression, in placeholder order.
    pub fn scoring_bindings(&self) -> &[SqlParam] {
        &self.relevance.params
    }

    /// Minimum relevance of returned rows.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Replaces the threshold.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Maximum number of rows.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Replaces the row limit.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// GROUP BY columns; unused when the dialect filters on the outer query.
    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    /// Replaces the GROUP BY columns.
    pub fn set_group_by(&mut self, columns: Vec<String>) {
        self.group_by = columns;
    }

    /// How the threshold will be enforced.
    pub fn filter(&self) -> RelevanceFilter {
        self.filter
    }
}

/// Inputs of [`prepare`] that come from the model and the compiler.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Base table of the model.
    pub table: &'a str,
    /// Primary key column of the model.
    pub key: &'a str,
    /// The model's search configuration.
    pub spec: &'a SearchSpec,
}

/// Clones `original` and turns the clone into the scored query.
///
/// Fails on a malformed join specification.
pub fn prepare<Q: QueryBuilder>(
    original: &Q,
    target: Target<'_>,
    score: &ScoreExpression,
    threshold: f64,
    limit: usize,
    dialect: &dyn SqlDialect,
) -> ConfigResult<CompiledQuery<Q>> {
    let mut query = original.clone();
    query.select_table_columns(target.table);

    for (table, join) in target.spec.joins.iter() {
        query.left_join(join.to_clause(table)?);
    }

    let relevance = score.select_expression(dialect);
    query.select_raw(&relevance.sql);

    Ok(CompiledQuery {
        query,
        table: target.table.to_string(),
        relevance,
        threshold,
        limit,
        group_by: default_group_by(target),
        filter: dialect.relevance_filter(),
    })
}

/// Applies filter, grouping, ordering and limit, fixes the binding order and
/// merges the scored query into `original`.
pub fn finalize<Q: QueryBuilder>(
    compiled: CompiledQuery<Q>,
    mut original: Q,
    dialect: &dyn SqlDialect,
) -> Q {
    let CompiledQuery {
        mut query,
        table,
        relevance,
        threshold,
        limit,
        group_by,
        filter,
    } = compiled;

    let relevance_column = dialect.quote_identifier(RELEVANCE_ALIAS);
    let threshold = format_number(threshold);

    if filter == RelevanceFilter::Having {
        if !group_by.is_empty() {
            query.group_by(&group_by);
        }
        query.having_raw(&format!("{} >= {}", relevance_column, threshold));
    }
    query.reorder_desc(RELEVANCE_ALIAS);
    query.limit(limit);

    let existing = query.take_bindings();
    let mut bindings = Bindings::new();
    bindings.extend(BindingCategory::Select, relevance.params);
    bindings.append(existing);
    query.set_bindings(bindings);

    original.merge_as_derived(query, &table);

    if filter == RelevanceFilter::OuterWhere {
        original.where_raw(&format!(
            "CAST({} AS DECIMAL(10,2)) >= {}",
            dialect.quote_identifier(&format!("{}.{}", table, RELEVANCE_ALIAS)),
            threshold
        ));
    }

    original
}

/// Primary key plus every searchable column that lives on a joined table,
/// unless an explicit group-by is configured.
fn default_group_by(target: Target<'_>) -> Vec<String> {
    if let Some(group_by) = &target.spec.group_by {
        return group_by
            .columns()
            .iter()
            .map(|c| qualify(target.table, c))
            .collect();
    }

    let mut columns = vec![qualify(target.table, target.key)];
    let searchable = target
        .spec
        .columns
        .keys()
        .chain(target.spec.fulltext_columns.keys())
        .map(|c| qualify(target.table, c));
    for column in searchable {
        let joined = table_of(&column)
            .is_some_and(|t| t != target.table && target.spec.joins.get(t).is_some());
        if joined && !columns.contains(&column) {
            columns.push(column);
        }
    }
    columns
}
