//! Library module for schemagraph-collect
//!
//! Exposes the CLI definition and the crawl command so they can be tested
//! without spawning the binary.

pub mod report;

use anyhow::{Context, Result, bail};
use clap::Parser;
use schemagraph_core::{
    CrawlOptions, CrawlResult, InMemoryMetadataSource, MetadataSource,
    SchemaCrawler, error::redact_database_url,
};
use std::path::PathBuf;

pub use report::CatalogReport;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "schemagraph-collect")]
#[command(about = "Database metadata crawl tool")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "
schemagraph collector - crawl database metadata into a JSON catalog

Schemas, tables, columns, foreign keys, constraints, triggers and routines
are read, reduced to the requested objects and written as one report, with
weak-association match keys derived from table names.

SOURCES:
- SQLite (sqlite:// URLs or .db/.sqlite files) [feature sqlite]
- Offline metadata snapshots (--snapshot file.json)

EXAMPLES:
  schemagraph-collect sqlite:///path/to/database.db
  schemagraph-collect --snapshot metadata.json --output catalog.json
  schemagraph-collect --config crawl.json --parent-depth 1 shop.db
")]
pub struct Cli {
    /// Database connection string
    #[arg(
        conflicts_with = "snapshot",
        help = "Database connection string (credentials will be sanitized in logs)"
    )]
    pub source: Option<String>,

    /// Offline metadata snapshot
    #[arg(long, value_name = "FILE", help = "Crawl a JSON metadata snapshot instead of a database")]
    pub snapshot: Option<PathBuf>,

    /// Crawl configuration file
    #[arg(long, value_name = "FILE", help = "JSON crawl options")]
    pub config: Option<PathBuf>,

    /// Output file path
    #[arg(
        short,
        long,
        default_value = "catalog.schemagraph.json",
        help = "Output file path"
    )]
    pub output: PathBuf,

    #[arg(long, help = "Keep tables referencing selected tables, up to this depth")]
    pub child_depth: Option<u32>,

    #[arg(long, help = "Keep tables referenced by selected tables, up to this depth")]
    pub parent_depth: Option<u32>,

    #[arg(long, value_name = "REGEX", help = "Select tables with a matching <table>.<column>")]
    pub grep_columns: Option<String>,

    #[arg(long, help = "Mark tables kept only as relatives as not matching")]
    pub grep_only_matching: bool,

    #[arg(long, help = "Count rows of retained tables")]
    pub row_counts: bool,

    #[arg(long, value_name = "BOOL", help = "Derive weak-association match keys")]
    pub weak_associations: Option<bool>,

    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

impl Cli {
    /// Crawl options from the configuration file, with command line
    /// overrides applied.
    ///
    /// # Errors
    /// Returns error if the configuration file cannot be loaded
    pub fn crawl_options(&self) -> Result<CrawlOptions> {
        let mut options = match &self.config {
            Some(path) => CrawlOptions::from_json_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => CrawlOptions::new(),
        };

        if let Some(depth) = self.child_depth {
            options.filter = options.filter.with_child_depth(depth);
        }
        if let Some(depth) = self.parent_depth {
            options.filter = options.filter.with_parent_depth(depth);
        }
        if let Some(pattern) = &self.grep_columns {
            options.grep = options.grep.with_grep_columns(pattern.clone());
        }
        if self.grep_only_matching {
            options.grep = options.grep.with_grep_only_matching(true);
        }
        if self.row_counts {
            options.load_row_counts = true;
        }
        if let Some(enabled) = self.weak_associations {
            options.infer_weak_associations = enabled;
        }
        Ok(options)
    }
}

/// Runs a crawl and writes its report.
///
/// # Errors
/// Returns error if no source is given, the source cannot be opened, the
/// crawl fails or the report cannot be written
pub async fn run(cli: &Cli) -> Result<CatalogReport> {
    let options = cli.crawl_options()?;

    let result = if let Some(path) = &cli.snapshot {
        tracing::info!("Crawling snapshot {}", path.display());
        let source = InMemoryMetadataSource::from_json_file(path)
            .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
        crawl(&source, options).await?
    } else if let Some(connection_string) = &cli.source {
        tracing::info!("Target: {}", redact_database_url(connection_string));
        crawl_database(connection_string, options).await?
    } else {
        bail!("A database connection string or --snapshot is required");
    };

    let report = CatalogReport::from_result(&result);
    report::save_report(&report, &cli.output).await?;
    tracing::info!("Catalog saved to {}", cli.output.display());
    Ok(report)
}

async fn crawl(source: &dyn MetadataSource, options: CrawlOptions) -> Result<CrawlResult> {
    SchemaCrawler::new(source, options)
        .crawl()
        .await
        .context("Crawl failed")
}

#[cfg(feature = "sqlite")]
async fn crawl_database(connection_string: &str, options: CrawlOptions) -> Result<CrawlResult> {
    let source = schemagraph_core::SqliteMetadataSource::connect(connection_string)
        .await
        .context("Failed to open SQLite database")?;
    let result = crawl(&source, options).await;
    source.close().await;
    result
}

#[cfg(not(feature = "sqlite"))]
async fn crawl_database(_connection_string: &str, _options: CrawlOptions) -> Result<CrawlResult> {
    bail!("SQLite support not available. Compile with --features sqlite")
}
