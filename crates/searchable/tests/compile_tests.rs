//! Compiled SQL and binding-order tests across dialects.

use std::thread;

use helios_searchable::{
    ConfigurationError, JoinSpec, MatcherKind, SearchConfig, SearchError, SearchModel,
    SearchSpec, Searcher, SelectQuery, SqlParam,
};

fn two_matcher_config() -> SearchConfig {
    SearchConfig::from_json(r#"{"matchers": {"startofStringMatcher": 50, "acronymMatcher": 42}}"#)
        .unwrap()
}

fn articles() -> SearchModel {
    SearchModel::new(
        "articles",
        SearchSpec::new()
            .column("articles.title", 10.0)
            .column("articles.summary", 5.0)
            .fulltext_column("articles.body", 2.0),
    )
}

#[test]
fn test_binding_order() {
    let searcher = Searcher::for_driver(&two_matcher_config(), "mysql").unwrap();
    let query = SelectQuery::table("articles").where_eq("articles.published", 1);

    let sql = searcher
        .search(&articles(), query, "fb")
        .unwrap()
        .to_sql(searcher.dialect());

    assert_eq!(
        sql.params,
        vec![
            SqlParam::string("fb%"),
            SqlParam::string("f% b%"),
            SqlParam::string("fb%"),
            SqlParam::string("f% b%"),
            SqlParam::string("fb"),
            SqlParam::integer(1),
        ]
    );
    assert_eq!(sql.sql.matches('?').count(), sql.params.len());
}

#[test]
fn test_join_refinement_bindings_follow_scoring() {
    let model = SearchModel::new(
        "users",
        SearchSpec::new()
            .column("users.name", 10.0)
            .join(
                "posts",
                JoinSpec::on("users.id", "posts.user_id").where_eq("posts.status", "live"),
            ),
    );
    let config = SearchConfig::from_json(r#"{"matchers": {"startofStringMatcher": 50}}"#).unwrap();
    let searcher = Searcher::for_driver(&config, "mysql").unwrap();

    let sql = searcher
        .search(&model, SelectQuery::table("users").where_eq("users.active", 1), "jo")
        .unwrap()
        .to_sql(searcher.dialect());

    assert!(sql.sql.contains(
        "LEFT JOIN `posts` ON `users`.`id` = `posts`.`user_id` AND `posts`.`status` = ?"
    ));
    assert_eq!(
        sql.params,
        vec![
            SqlParam::string("jo%"),
            SqlParam::string("live"),
            SqlParam::integer(1)
        ]
    );
}

#[test]
fn test_compilation_is_deterministic() {
    let searcher = Searcher::for_driver(&SearchConfig::default(), "mysql").unwrap();
    let compile = || {
        searcher
            .search(&articles(), SelectQuery::table("articles"), "rust \"borrow checker\" tips")
            .unwrap()
            .to_sql(searcher.dialect())
    };
    assert_eq!(compile(), compile());
}

#[test]
fn test_concurrent_searches_share_one_searcher() {
    let searcher = Searcher::for_driver(&SearchConfig::default(), "pgsql").unwrap();
    let model = articles();
    let inputs = ["alpha", "beta gamma", "\"delta epsilon\" zeta", "555-1234", "omega"];

    let expected: Vec<_> = inputs
        .iter()
        .map(|s| {
            searcher
                .search(&model, SelectQuery::table("articles"), s)
                .unwrap()
                .to_sql(searcher.dialect())
        })
        .collect();

    thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|s| {
                let searcher = &searcher;
                let model = &model;
                scope.spawn(move || {
                    searcher
                        .search(model, SelectQuery::table("articles"), s)
                        .unwrap()
                        .to_sql(searcher.dialect())
                })
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_whitespace_search_is_unchanged() {
    let searcher = Searcher::for_driver(&SearchConfig::default(), "sqlsrv").unwrap();
    let query = SelectQuery::table("articles").where_eq("articles.published", 1);
    assert_eq!(
        searcher.search(&articles(), query.clone(), "  \t ").unwrap(),
        query
    );
}

#[test]
fn test_single_token_drops_exact_matchers() {
    let searcher = Searcher::for_driver(&SearchConfig::default(), "mysql").unwrap();
    let applied = searcher.applicable_matchers(1);
    assert!(!applied.contains(&MatcherKind::ExactFull));
    assert!(!applied.contains(&MatcherKind::ExactInString));

    let sql = searcher
        .search(&articles(), SelectQuery::table("articles"), "rust")
        .unwrap()
        .to_sql(searcher.dialect())
        .sql;
    assert!(!sql.contains(") = ?"));
}

#[test]
fn test_sqlite_has_no_full_text_or_phonetic_terms() {
    let searcher = Searcher::for_driver(&SearchConfig::default(), "sqlite").unwrap();
    let sql = searcher
        .search(&articles(), SelectQuery::table("articles"), "rust lang")
        .unwrap()
        .to_sql(searcher.dialect())
        .sql;
    assert!(!sql.contains("MATCH("));
    assert!(!sql.contains("SOUNDS LIKE"));
    assert!(!sql.contains("CHAR_LENGTH"));
    assert!(sql.contains("LENGTH("));
}

#[test]
fn test_postgres_shape() {
    let searcher = Searcher::for_driver(&two_matcher_config(), "pgsql").unwrap();
    let query = SelectQuery::table("articles").where_eq("articles.published", 1);
    let sql = searcher
        .search(&articles(), query, "fb")
        .unwrap()
        .to_sql(searcher.dialect());

    assert!(sql.sql.contains("ts_rank(to_tsvector(\"articles\".\"body\"), plainto_tsquery($5))"));
    assert!(sql.sql.contains("\"articles\".\"published\" = $6"));
    assert!(!sql.sql.contains("GROUP BY"));
    assert!(!sql.sql.contains("HAVING"));
    // (15 + 92 + 2) * (2 / 6) * (2 / 6)
    assert!(
        sql.sql
            .ends_with("WHERE (CAST(\"articles\".\"relevance\" AS DECIMAL(10,2)) >= 12.11)")
    );
    assert_eq!(sql.params.len(), 6);
}

#[test]
fn test_sql_server_shape() {
    let searcher = Searcher::for_driver(&SearchConfig::default(), "sqlsrv").unwrap();
    let sql = searcher
        .search(&articles(), SelectQuery::table("articles"), "rust lang")
        .unwrap()
        .to_sql(searcher.dialect())
        .sql;

    assert!(sql.contains("SELECT TOP 25 \"articles\".*"));
    assert!(sql.contains("CASE WHEN FREETEXT(\"articles\".\"body\", ?) THEN 1 ELSE 0 END"));
    assert!(sql.contains("LEN(REPLACE("));
    assert!(!sql.contains("SOUNDEX"));
    assert!(sql.contains("CAST(\"articles\".\"relevance\" AS DECIMAL(10,2))"));
}

#[test]
fn test_unknown_driver_falls_back() {
    let searcher = Searcher::for_driver(&SearchConfig::default(), "firebird").unwrap();
    let sql = searcher
        .search(&articles(), SelectQuery::table("articles"), "rust lang")
        .unwrap()
        .to_sql(searcher.dialect())
        .sql;
    assert!(sql.contains("HAVING `relevance` >="));
    assert!(sql.contains("SOUNDS LIKE ?"));
}

#[test]
fn test_invalid_join_is_a_configuration_error() {
    let model = SearchModel::new(
        "users",
        SearchSpec::new().column("users.name", 1.0).join(
            "posts",
            JoinSpec {
                keys: vec!["users.id".to_string()],
                ..Default::default()
            },
        ),
    );
    let searcher = Searcher::for_driver(&SearchConfig::default(), "mysql").unwrap();
    let err = searcher
        .search(&model, SelectQuery::table("users"), "jo")
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Configuration(ConfigurationError::InvalidJoin { .. })
    ));
}

#[test]
fn test_spec_max_words_overrides_config() {
    let searcher = Searcher::for_driver(&two_matcher_config(), "mysql").unwrap();
    let model = SearchModel::new(
        "articles",
        SearchSpec::new().column("articles.title", 1.0).max_words(2),
    );
    let sql = searcher
        .search(&model, SelectQuery::table("articles"), "a b c d")
        .unwrap()
        .to_sql(searcher.dialect());
    // two tokens, two matchers
    assert_eq!(sql.params.len(), 4);
}
