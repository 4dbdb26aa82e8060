//! Model-side search configuration.
//!
//! A [`SearchSpec`] describes which columns of a record type are searchable
//! and how strongly each one counts. Mappings keep insertion (or document)
//! order because that order is the evaluation order of the compiled
//! expression and of its bindings.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ConfigResult, ConfigurationError};
use crate::query::{JoinClause, JoinFilter, SqlParam};

/// String-keyed map that preserves insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Explicit GROUP BY configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupBy {
    /// A single column.
    Column(String),
    /// Several columns.
    Columns(Vec<String>),
}

impl GroupBy {
    /// The configured columns, in order.
    pub fn columns(&self) -> Vec<String> {
        match self {
            GroupBy::Column(c) => vec![c.clone()],
            GroupBy::Columns(cs) => cs.clone(),
        }
    }
}

/// Join configuration for one joined table.
///
/// In JSON: `{"keys": ["users.id", "posts.user_id"], "where": ["posts.status",
/// "published"], "whereIn": ["posts.kind", [1, 2]]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSpec {
    /// Key pair `[local, foreign]`.
    #[serde(default)]
    pub keys: Vec<String>,
    /// Optional `column = value` refinement.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_eq: Option<(String, SqlParam)>,
    /// Optional `column IN (values)` refinement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_in: Option<(String, Vec<SqlParam>)>,
}

impl JoinSpec {
    /// Joins on `first = second`.
    pub fn on(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            keys: vec![first.into(), second.into()],
            ..Default::default()
        }
    }

    /// Restricts joined rows to `column = value`.
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<SqlParam>) -> Self {
        self.where_eq = Some((column.into(), value.into()));
        self
    }

    /// Restricts joined rows to `column IN (values)`.
    pub fn where_in(mut self, column: impl Into<String>, values: Vec<SqlParam>) -> Self {
        self.where_in = Some((column.into(), values));
        self
    }

    /// Validates the spec and turns it into a join clause for `table`.
    pub fn to_clause(&self, table: &str) -> ConfigResult<JoinClause> {
        let invalid = |message: &str| ConfigurationError::InvalidJoin {
            table: table.to_string(),
            message: message.to_string(),
        };

        if table.trim().is_empty() {
            return Err(invalid("joined table name is empty"));
        }
        let [first, second] = self.keys.as_slice() else {
            return Err(invalid("expected exactly two key columns"));
        };
        if first.trim().is_empty() || second.trim().is_empty() {
            return Err(invalid("key columns must not be empty"));
        }

        let mut clause = JoinClause::new(table, first.as_str(), second.as_str());
        if let Some((column, value)) = &self.where_eq {
            if column.trim().is_empty() {
                return Err(invalid("where refinement has no column"));
            }
            clause = clause.with_filter(JoinFilter::Equals {
                column: column.clone(),
                value: value.clone(),
            });
        }
        if let Some((column, values)) = &self.where_in {
            if column.trim().is_empty() {
                return Err(invalid("whereIn refinement has no column"));
            }
            clause = clause.with_filter(JoinFilter::In {
                column: column.clone(),
                values: values.clone(),
            });
        }
        Ok(clause)
    }
}

/// Searchable-column configuration owned by a record type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSpec {
    /// Column name to weight; order is evaluation order.
    pub columns: OrderedMap<f64>,
    /// Full-text column name to weight.
    pub fulltext_columns: OrderedMap<f64>,
    /// Joined table name to join configuration.
    pub joins: OrderedMap<JoinSpec>,
    /// Explicit GROUP BY; defaults to the primary key plus joined columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
    /// Column name to SQL function applied before comparison.
    pub mutations: OrderedMap<String>,
    /// Token cap; overrides the process-wide setting when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_words: Option<usize>,
}

impl SearchSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a searchable column.
    pub fn column(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.columns.insert(name, weight);
        self
    }

    /// Adds a full-text column.
    pub fn fulltext_column(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.fulltext_columns.insert(name, weight);
        self
    }

    /// Adds a joined table.
    pub fn join(mut self, table: impl Into<String>, join: JoinSpec) -> Self {
        self.joins.insert(table, join);
        self
    }

    /// Sets an explicit GROUP BY.
    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    /// Applies `function` to `column` before comparing it.
    pub fn mutation(mut self, column: impl Into<String>, function: impl Into<String>) -> Self {
        self.mutations.insert(column, function.into());
        self
    }

    /// Caps the number of tokens.
    pub fn max_words(mut self, max_words: usize) -> Self {
        self.max_words = Some(max_words);
        self
    }

    /// Checks weights, column names and mutation functions.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, weight) in self.columns.iter().chain(self.fulltext_columns.iter()) {
            if !is_identifier_path(name) {
                return Err(ConfigurationError::InvalidColumn {
                    column: name.to_string(),
                });
            }
            if *weight < 0.0 || weight.is_nan() {
                return Err(ConfigurationError::NegativeWeight {
                    name: name.to_string(),
                    weight: *weight,
                });
            }
        }
        for (column, function) in self.mutations.iter() {
            if !is_identifier(function) {
                return Err(ConfigurationError::InvalidMutation {
                    column: column.to_string(),
                    function: function.clone(),
                });
            }
        }
        if self.max_words == Some(0) {
            return Err(ConfigurationError::InvalidMaxWords);
        }
        Ok(())
    }
}

/// Qualifies a bare column name with `table`.
pub(crate) fn qualify(table: &str, column: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("{}.{}", table, column)
    }
}

/// Returns the table part of a qualified column name.
pub(crate) fn table_of(column: &str) -> Option<&str> {
    column.rsplit_once('.').map(|(table, _)| table)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_identifier_path(s: &str) -> bool {
    !s.is_empty()
        && s
            .split('.')
            .all(|segment| !segment.is_empty() && !segment.chars().any(char::is_whitespace))
}
