//! Relational query builder consumed by the relevance compiler.
//!
//! The compiler only needs a narrow capability from the application's query
//! builder, expressed as the [`QueryBuilder`] trait. [`SelectQuery`] is the
//! implementation shipped with the crate; it renders to a [`SqlFragment`] for
//! any [`SqlDialect`].

use crate::dialect::{LimitStyle, SqlDialect};

use super::fragment::{SqlFragment, SqlParam};

/// Clause categories that own bound parameters.
///
/// Categories are listed in the order their clauses appear in a rendered
/// `SELECT`, which is also the order bindings are flattened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingCategory {
    /// Select-list expressions.
    Select,
    /// Derived tables in FROM.
    From,
    /// Join conditions.
    Join,
    /// WHERE conditions.
    Where,
    /// HAVING conditions.
    Having,
    /// ORDER BY expressions.
    Order,
}

impl BindingCategory {
    /// All categories in clause order.
    pub const ALL: [BindingCategory; 6] = [
        BindingCategory::Select,
        BindingCategory::From,
        BindingCategory::Join,
        BindingCategory::Where,
        BindingCategory::Having,
        BindingCategory::Order,
    ];
}

/// Bound parameter values keyed by clause category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    select: Vec<SqlParam>,
    from: Vec<SqlParam>,
    join: Vec<SqlParam>,
    where_: Vec<SqlParam>,
    having: Vec<SqlParam>,
    order: Vec<SqlParam>,
}

impl Bindings {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, category: BindingCategory) -> &mut Vec<SqlParam> {
        match category {
            BindingCategory::Select => &mut self.select,
            BindingCategory::From => &mut self.from,
            BindingCategory::Join => &mut self.join,
            BindingCategory::Where => &mut self.where_,
            BindingCategory::Having => &mut self.having,
            BindingCategory::Order => &mut self.order,
        }
    }

    /// Returns the values bound in one category.
    pub fn get(&self, category: BindingCategory) -> &[SqlParam] {
        match category {
            BindingCategory::Select => &self.select,
            BindingCategory::From => &self.from,
            BindingCategory::Join => &self.join,
            BindingCategory::Where => &self.where_,
            BindingCategory::Having => &self.having,
            BindingCategory::Order => &self.order,
        }
    }

    /// Appends one value to a category.
    pub fn push(&mut self, category: BindingCategory, param: SqlParam) {
        self.slot_mut(category).push(param);
    }

    /// Appends values to a category, keeping their order.
    pub fn extend(
        &mut self,
        category: BindingCategory,
        params: impl IntoIterator<Item = SqlParam>,
    ) {
        self.slot_mut(category).extend(params);
    }

    /// Replaces the values of one category.
    pub fn replace(&mut self, category: BindingCategory, params: Vec<SqlParam>) {
        *self.slot_mut(category) = params;
    }

    /// Removes and returns the values of one category.
    pub fn take(&mut self, category: BindingCategory) -> Vec<SqlParam> {
        std::mem::take(self.slot_mut(category))
    }

    /// Appends every category of `other` after the values already held.
    pub fn append(&mut self, other: Bindings) {
        let mut other = other;
        for category in BindingCategory::ALL {
            let values = other.take(category);
            self.extend(category, values);
        }
    }

    /// Flattens all categories in clause order.
    pub fn flatten(&self) -> Vec<SqlParam> {
        BindingCategory::ALL
            .iter()
            .flat_map(|c| self.get(*c).iter().cloned())
            .collect()
    }

    /// Total number of bound values.
    pub fn len(&self) -> usize {
        BindingCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extra refinement on a join beyond its key pair.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinFilter {
    /// `column = ?`
    Equals {
        /// Column compared.
        column: String,
        /// Bound value.
        value: SqlParam,
    },
    /// `column IN (?, ...)`
    In {
        /// Column compared.
        column: String,
        /// Bound values.
        values: Vec<SqlParam>,
    },
}

/// A left join on a key pair.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Joined table.
    pub table: String,
    /// Left-hand key column.
    pub first: String,
    /// Right-hand key column.
    pub second: String,
    /// Additional conditions ANDed into the ON clause.
    pub filters: Vec<JoinFilter>,
}

impl JoinClause {
    /// Creates a join on `first = second`.
    pub fn new(
        table: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            first: first.into(),
            second: second.into(),
            filters: Vec::new(),
        }
    }

    /// Adds a refinement.
    pub fn with_filter(mut self, filter: JoinFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Bound values of the refinements, in placeholder order.
    pub fn params(&self) -> Vec<SqlParam> {
        self.filters
            .iter()
            .flat_map(|f| match f {
                JoinFilter::Equals { value, .. } => vec![value.clone()],
                JoinFilter::In { values, .. } => values.clone(),
            })
            .collect()
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Capability the relevance compiler needs from a query builder.
///
/// Raw SQL handed to these methods uses `?` placeholders; the values are
/// supplied separately through [`QueryBuilder::set_bindings`].
pub trait QueryBuilder: Clone {
    /// Replaces the select list with every column of `table`.
    fn select_table_columns(&mut self, table: &str);

    /// Adds a raw select-list expression.
    fn select_raw(&mut self, sql: &str);

    /// Adds a left join. Refinement values are bound in the join category.
    fn left_join(&mut self, join: JoinClause);

    /// Adds a raw condition to WHERE.
    fn where_raw(&mut self, sql: &str);

    /// Adds a raw condition to HAVING.
    fn having_raw(&mut self, sql: &str);

    /// Groups by the given columns.
    fn group_by(&mut self, columns: &[String]);

    /// Replaces any ordering with `column DESC`.
    fn reorder_desc(&mut self, column: &str);

    /// Limits the number of rows.
    fn limit(&mut self, count: usize);

    /// Returns the bound values keyed by category.
    fn bindings(&self) -> &Bindings;

    /// Removes and returns every bound value.
    fn take_bindings(&mut self) -> Bindings;

    /// Replaces every bound value.
    fn set_bindings(&mut self, bindings: Bindings);

    /// Nests `inner` as a derived table named `alias` inside this query.
    ///
    /// Conditions of this query that were cloned into `inner` are not
    /// repeated at the outer level.
    fn merge_as_derived(&mut self, inner: Self, alias: &str);
}

#[derive(Debug, Clone, PartialEq)]
enum SelectColumn {
    Column(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
enum FromClause {
    Table(String),
    Derived {
        query: Box<SelectQuery>,
        alias: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Raw(String),
    Equals(String),
    In(String, usize),
}

/// A `SELECT` statement under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    from: FromClause,
    columns: Vec<SelectColumn>,
    joins: Vec<JoinClause>,
    wheres: Vec<Condition>,
    groups: Vec<String>,
    havings: Vec<String>,
    orders: Vec<(String, SortDirection)>,
    limit: Option<usize>,
    offset: Option<usize>,
    bindings: Bindings,
}

impl SelectQuery {
    /// Starts a query against `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            from: FromClause::Table(table.into()),
            columns: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            groups: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            bindings: Bindings::new(),
        }
    }

    /// Adds columns to the select list.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| SelectColumn::Column(c.into())));
        self
    }

    /// Adds `column = ?` to WHERE.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        self.wheres.push(Condition::Equals(column.into()));
        self.bindings.push(BindingCategory::Where, value.into());
        self
    }

    /// Adds `column IN (?, ...)` to WHERE.
    pub fn where_in(mut self, column: impl Into<String>, values: Vec<SqlParam>) -> Self {
        self.wheres.push(Condition::In(column.into(), values.len()));
        self.bindings.extend(BindingCategory::Where, values);
        self
    }

    /// Adds a raw WHERE condition together with its bound values.
    pub fn where_raw_with(mut self, sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        self.wheres.push(Condition::Raw(sql.into()));
        self.bindings.extend(BindingCategory::Where, params);
        self
    }

    /// Adds an ORDER BY column.
    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.orders.push((column.into(), direction));
        self
    }

    /// Skips rows.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Name of the base table, or the alias of a derived table.
    pub fn from_name(&self) -> &str {
        match &self.from {
            FromClause::Table(name) => name,
            FromClause::Derived { alias, .. } => alias,
        }
    }

    /// The nested query, when FROM is a derived table.
    pub fn derived(&self) -> Option<&SelectQuery> {
        match &self.from {
            FromClause::Table(_) => None,
            FromClause::Derived { query, .. } => Some(query),
        }
    }

    /// Renders the statement for `dialect`.
    ///
    /// Placeholders are numbered in the dialect's syntax; `params` is the
    /// flattened binding list in placeholder order.
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> SqlFragment {
        let sql = self.render(dialect);
        SqlFragment::with_params(number_placeholders(&sql, dialect), self.bindings.flatten())
    }

    fn render(&self, dialect: &dyn SqlDialect) -> String {
        let mut sql = String::from("SELECT ");

        let top = dialect.limit_style() == LimitStyle::Top;
        if let (true, Some(limit), None) = (top, self.limit, self.offset) {
            sql.push_str(&format!("TOP {} ", limit));
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self
                .columns
                .iter()
                .map(|c| match c {
                    SelectColumn::Column(name) => dialect.quote_identifier(name),
                    SelectColumn::Raw(raw) => raw.clone(),
                })
                .collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        match &self.from {
            FromClause::Table(name) => sql.push_str(&dialect.quote_identifier(name)),
            FromClause::Derived { query, alias } => {
                sql.push_str(&format!(
                    "({}) AS {}",
                    query.render(dialect),
                    dialect.quote_identifier(alias)
                ));
            }
        }

        for join in &self.joins {
            sql.push_str(&format!(
                " LEFT JOIN {} ON {} = {}",
                dialect.quote_identifier(&join.table),
                dialect.quote_identifier(&join.first),
                dialect.quote_identifier(&join.second)
            ));
            for filter in &join.filters {
                sql.push_str(" AND ");
                sql.push_str(&match filter {
                    JoinFilter::Equals { column, .. } => {
                        format!("{} = ?", dialect.quote_identifier(column))
                    }
                    JoinFilter::In { column, values } => {
                        in_list(&dialect.quote_identifier(column), values.len())
                    }
                });
            }
        }

        if !self.wheres.is_empty() {
            let conditions: Vec<String> = self
                .wheres
                .iter()
                .map(|c| match c {
                    Condition::Raw(raw) => format!("({})", raw),
                    Condition::Equals(column) => {
                        format!("{} = ?", dialect.quote_identifier(column))
                    }
                    Condition::In(column, count) => {
                        in_list(&dialect.quote_identifier(column), *count)
                    }
                })
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if !self.groups.is_empty() {
            let groups: Vec<String> = self
                .groups
                .iter()
                .map(|g| dialect.quote_identifier(g))
                .collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));
        }

        if !self.havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.havings.join(" AND "));
        }

        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(column, dir)| {
                    format!("{} {}", dialect.quote_identifier(column), dir.as_sql())
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        match (dialect.limit_style(), self.limit, self.offset) {
            (LimitStyle::Limit, Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
            }
            (LimitStyle::Limit, Some(limit), None) => {
                sql.push_str(&format!(" LIMIT {}", limit));
            }
            (LimitStyle::Limit, None, Some(offset)) => {
                sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset));
            }
            (LimitStyle::Top, limit, Some(offset)) => {
                if self.orders.is_empty() {
                    sql.push_str(" ORDER BY (SELECT NULL)");
                }
                sql.push_str(&format!(" OFFSET {} ROWS", offset));
                if let Some(limit) = limit {
                    sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit));
                }
            }
            _ => {}
        }

        sql
    }
}

impl QueryBuilder for SelectQuery {
    fn select_table_columns(&mut self, table: &str) {
        self.columns = vec![SelectColumn::Column(format!("{}.*", table))];
        self.bindings.replace(BindingCategory::Select, Vec::new());
    }

    fn select_raw(&mut self, sql: &str) {
        self.columns.push(SelectColumn::Raw(sql.to_string()));
    }

    fn left_join(&mut self, join: JoinClause) {
        self.bindings.extend(BindingCategory::Join, join.params());
        self.joins.push(join);
    }

    fn where_raw(&mut self, sql: &str) {
        self.wheres.push(Condition::Raw(sql.to_string()));
    }

    fn having_raw(&mut self, sql: &str) {
        self.havings.push(sql.to_string());
    }

    fn group_by(&mut self, columns: &[String]) {
        self.groups.extend(columns.iter().cloned());
    }

    fn reorder_desc(&mut self, column: &str) {
        self.orders = vec![(column.to_string(), SortDirection::Desc)];
        self.bindings.replace(BindingCategory::Order, Vec::new());
    }

    fn limit(&mut self, count: usize) {
        self.limit = Some(count);
    }

    fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    fn take_bindings(&mut self) -> Bindings {
        std::mem::take(&mut self.bindings)
    }

    fn set_bindings(&mut self, bindings: Bindings) {
        self.bindings = bindings;
    }

    fn merge_as_derived(&mut self, inner: Self, alias: &str) {
        self.joins.clear();
        self.wheres.clear();
        self.groups.clear();
        self.havings.clear();
        self.bindings.replace(BindingCategory::Join, Vec::new());
        self.bindings.replace(BindingCategory::Where, Vec::new());
        self.bindings.replace(BindingCategory::Having, Vec::new());
        self.bindings
            .replace(BindingCategory::From, inner.bindings.flatten());
        self.from = FromClause::Derived {
            query: Box::new(inner),
            alias: alias.to_string(),
        };
    }
}

fn in_list(column: &str, count: usize) -> String {
    if count == 0 {
        return "1 = 0".to_string();
    }
    let placeholders = vec!["?"; count].join(", ");
    format!("{} IN ({})", column, placeholders)
}

/// Rewrites `?` placeholders outside string literals into the dialect's
/// numbered form.
fn number_placeholders(sql: &str, dialect: &dyn SqlDialect) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_literal = false;
    let mut index = 0;
    for c in sql.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                index += 1;
                out.push_str(&dialect.placeholder(index));
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect, SqlServerDialect};

    #[test]
    fn test_basic_select() {
        let query = SelectQuery::table("users").select(["users.id", "users.name"]);
        let sql = query.to_sql(&MySqlDialect);
        assert_eq!(
            sql.sql,
            "SELECT `users`.`id`, `users`.`name` FROM `users`"
        );
        assert!(sql.params.is_empty());
    }

    #[test]
    fn test_where_and_limit() {
        let mut query = SelectQuery::table("users")
            .where_eq("users.active", 1)
            .where_in(
                "users.role",
                vec![SqlParam::string("admin"), SqlParam::string("staff")],
            );
        query.limit(10);

        let sql = query.to_sql(&MySqlDialect);
        assert_eq!(
            sql.sql,
            "SELECT * FROM `users` WHERE `users`.`active` = ? AND `users`.`role` IN (?, ?) LIMIT 10"
        );
        assert_eq!(sql.params.len(), 3);
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let query = SelectQuery::table("users").where_in("users.id", Vec::new());
        assert!(query.to_sql(&MySqlDialect).sql.ends_with("WHERE 1 = 0"));
    }

    #[test]
    fn test_join_with_refinements() {
        let mut query = SelectQuery::table("users");
        query.left_join(
            JoinClause::new("posts", "users.id", "posts.user_id")
                .with_filter(JoinFilter::Equals {
                    column: "posts.status".to_string(),
                    value: SqlParam::string("published"),
                })
                .with_filter(JoinFilter::In {
                    column: "posts.kind".to_string(),
                    values: vec![SqlParam::integer(1), SqlParam::integer(2)],
                }),
        );

        let sql = query.to_sql(&MySqlDialect);
        assert!(sql.sql.contains(
            "LEFT JOIN `posts` ON `users`.`id` = `posts`.`user_id` AND `posts`.`status` = ? AND `posts`.`kind` IN (?, ?)"
        ));
        assert_eq!(query.bindings().get(BindingCategory::Join).len(), 3);
    }

    #[test]
    fn test_postgres_numbers_placeholders() {
        let query = SelectQuery::table("users")
            .where_raw_with("note = '?'", Vec::new())
            .where_eq("users.a", 1)
            .where_eq("users.b", 2);
        let sql = query.to_sql(&PostgresDialect);
        assert!(sql.sql.contains("(note = '?')"));
        assert!(sql.sql.contains("\"users\".\"a\" = $1"));
        assert!(sql.sql.contains("\"users\".\"b\" = $2"));
    }

    #[test]
    fn test_sql_server_top() {
        let mut query = SelectQuery::table("users");
        query.limit(5);
        assert_eq!(
            query.to_sql(&SqlServerDialect).sql,
            "SELECT TOP 5 * FROM \"users\""
        );

        let query = query.offset(10);
        let sql = query.to_sql(&SqlServerDialect).sql;
        assert!(sql.ends_with("ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"));
    }

    #[test]
    fn test_bindings_flatten_in_clause_order() {
        let mut bindings = Bindings::new();
        bindings.push(BindingCategory::Where, SqlParam::string("w"));
        bindings.push(BindingCategory::Select, SqlParam::string("s"));
        bindings.push(BindingCategory::Join, SqlParam::string("j"));

        assert_eq!(
            bindings.flatten(),
            vec![
                SqlParam::string("s"),
                SqlParam::string("j"),
                SqlParam::string("w")
            ]
        );
        assert_eq!(bindings.len(), 3);
    }

    #[test]
    fn test_bindings_append_keeps_existing_first() {
        let mut first = Bindings::new();
        first.push(BindingCategory::Select, SqlParam::string("a"));
        let mut second = Bindings::new();
        second.push(BindingCategory::Select, SqlParam::string("b"));
        second.push(BindingCategory::Where, SqlParam::string("c"));

        first.append(second);
        assert_eq!(
            first.flatten(),
            vec![
                SqlParam::string("a"),
                SqlParam::string("b"),
                SqlParam::string("c")
            ]
        );
    }

    #[test]
    fn test_merge_as_derived() {
        let outer = SelectQuery::table("users").where_eq("users.active", 1);
        let mut inner = outer.clone();
        inner.select_table_columns("users");

        let mut outer = outer;
        outer.merge_as_derived(inner, "users");

        let sql = outer.to_sql(&MySqlDialect);
        assert_eq!(
            sql.sql,
            "SELECT * FROM (SELECT `users`.* FROM `users` WHERE `users`.`active` = ?) AS `users`"
        );
        assert_eq!(sql.params, vec![SqlParam::integer(1)]);
        assert!(outer.derived().is_some());
        assert_eq!(outer.from_name(), "users");
    }
}
