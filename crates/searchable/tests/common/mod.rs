//! Test infrastructure for the relevance compiler.
//!
//! Compiled queries are executed against an in-memory SQLite database so the
//! tests check what the database actually returns, not just the SQL text.

#![allow(dead_code)]

use rusqlite::Connection;
use rusqlite::types::Value;

use helios_searchable::{
    JoinSpec, SearchConfig, SearchModel, SearchSpec, Searcher, SelectQuery, SqlParam,
};

/// One returned row: company name and its relevance.
pub type Hit = (String, f64);

/// Creates `companies(id, name, active)` and `locations(id, company_id, city)`.
pub fn create_database(companies: &[&str]) -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open SQLite database");
    conn.execute_batch(
        "CREATE TABLE companies (id INTEGER PRIMARY KEY, name TEXT, active INTEGER NOT NULL DEFAULT 1);
         CREATE TABLE locations (id INTEGER PRIMARY KEY, company_id INTEGER NOT NULL, city TEXT);",
    )
    .expect("Failed to create schema");
    for name in companies {
        conn.execute("INSERT INTO companies (name) VALUES (?1)", [name])
            .expect("Failed to insert company");
    }
    conn
}

/// Adds a location for the company with `name`.
pub fn add_location(conn: &Connection, name: &str, city: &str) {
    conn.execute(
        "INSERT INTO locations (company_id, city) SELECT id, ?2 FROM companies WHERE name = ?1",
        [name, city],
    )
    .expect("Failed to insert location");
}

/// Searchable companies, by name only.
pub fn companies_model() -> SearchModel {
    SearchModel::new("companies", SearchSpec::new().column("companies.name", 10.0))
}

/// Companies searchable by name and by the city of their locations.
pub fn companies_with_locations() -> SearchModel {
    SearchModel::new(
        "companies",
        SearchSpec::new()
            .column("companies.name", 10.0)
            .column("locations.city", 5.0)
            .join(
                "locations",
                JoinSpec::on("companies.id", "locations.company_id"),
            ),
    )
}

/// SQLite searcher running only the named matchers.
pub fn sqlite_searcher(matchers: &[(&str, f64)]) -> Searcher {
    let config = SearchConfig {
        matchers: matchers.iter().copied().collect(),
        ..SearchConfig::default()
    };
    Searcher::for_driver(&config, "sqlite").expect("Failed to build searcher")
}

/// SQLite searcher with the default matcher weights.
pub fn default_sqlite_searcher() -> Searcher {
    Searcher::for_driver(&SearchConfig::default(), "sqlite").expect("Failed to build searcher")
}

/// Converts a bound value for rusqlite.
pub fn to_value(param: &SqlParam) -> Value {
    match param {
        SqlParam::String(s) => Value::Text(s.clone()),
        SqlParam::Integer(i) => Value::Integer(*i),
        SqlParam::Float(f) => Value::Real(*f),
        SqlParam::Null => Value::Null,
    }
}

/// Executes `query` and returns `(name, relevance)` rows in result order.
pub fn run(conn: &Connection, searcher: &Searcher, query: &SelectQuery) -> Vec<Hit> {
    let fragment = query.to_sql(searcher.dialect());
    let mut stmt = conn
        .prepare(&fragment.sql)
        .unwrap_or_else(|e| panic!("Failed to prepare {}: {}", fragment.sql, e));
    let params: Vec<Value> = fragment.params.iter().map(to_value).collect();
    stmt.query_map(rusqlite::params_from_iter(params), |row| {
        Ok((row.get::<_, String>("name")?, row.get::<_, f64>("relevance")?))
    })
    .expect("Failed to execute search")
    .collect::<Result<Vec<_>, _>>()
    .expect("Failed to read rows")
}

/// Names of the returned rows.
pub fn names(hits: &[Hit]) -> Vec<&str> {
    hits.iter().map(|(name, _)| name.as_str()).collect()
}
