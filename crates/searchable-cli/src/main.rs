//! Helios Searchable CLI
//!
//! Compiles a search string against a model description and prints the
//! resulting SQL together with its ordered bindings.
//!
//! ```text
//! searchable --model users.json --driver pgsql "john smith"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use helios_searchable::{
    SearchConfig, SearchModel, SearchOptions, Searcher, SelectQuery, SqlFragment, SqlParam,
};

/// Command line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "searchable")]
#[command(about = "Compile a relevance-scored search into SQL")]
struct Cli {
    /// Search string.
    search: String,

    /// JSON model description: `{"table": ..., "key": ..., "search": {...}}`.
    #[arg(short, long)]
    model: PathBuf,

    /// JSON matcher configuration. Falls back to SEARCHABLE_CONFIG, then defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database driver (mysql, pgsql, sqlite, sqlsrv).
    #[arg(short, long, env = "SEARCHABLE_DRIVER", default_value = "mysql")]
    driver: String,

    /// Maximum number of rows.
    #[arg(short, long, default_value = "25")]
    limit: usize,

    /// Fixed relevance threshold instead of the computed one.
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Token cap override.
    #[arg(long)]
    max_words: Option<usize>,

    /// Print a JSON document instead of plain text.
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCHABLE_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Serialize)]
struct Output<'a> {
    driver: &'a str,
    sql: &'a str,
    params: &'a [SqlParam],
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_searchable={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<SearchConfig> {
    let config = match &cli.config {
        Some(path) => SearchConfig::from_path(path)?,
        None => SearchConfig::from_env()?,
    };
    Ok(match cli.max_words {
        Some(max_words) => config.with_max_words(max_words),
        None => config,
    })
}

fn load_model(path: &Path) -> anyhow::Result<SearchModel> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse model from {}", path.display()))
}

fn compile(cli: &Cli) -> anyhow::Result<SqlFragment> {
    let config = load_config(cli)?;
    let model = load_model(&cli.model)?;
    let searcher = Searcher::for_driver(&config, &cli.driver)?;

    info!(
        table = %model.table,
        driver = %cli.driver,
        matchers = searcher.matchers().len(),
        "Compiling search"
    );

    let mut options = SearchOptions::new().limit(cli.limit);
    if let Some(threshold) = cli.threshold {
        options = options.threshold(threshold);
    }

    let query = searcher.search_with(
        &model,
        SelectQuery::table(model.table.as_str()),
        &cli.search,
        options,
    )?;
    Ok(query.to_sql(searcher.dialect()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let fragment = compile(&cli)?;

    if cli.json {
        let output = Output {
            driver: &cli.driver,
            sql: &fragment.sql,
            params: &fragment.params,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", fragment.sql);
        for (index, param) in fragment.params.iter().enumerate() {
            println!("  {:>3}: {}", index + 1, param);
        }
    }

    Ok(())
}
