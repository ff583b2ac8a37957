//! Database metadata crawl tool.
//!
//! Crawls a SQLite database or an offline metadata snapshot, reduces the
//! catalog to the requested objects and writes it as a JSON report.
//!
//! # Guarantees
//! - Read-only database access
//! - Connection strings are redacted in logs

use anyhow::Result;
use clap::Parser;
use schemagraph_collect::{Cli, run};
use schemagraph_core::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    let report = run(&cli).await.inspect_err(|e| {
        tracing::error!("{:#}", e);
    })?;

    if !cli.quiet {
        println!("Crawl completed successfully");
        println!("Output: {}", cli.output.display());
        println!("Schemas: {}", report.schemas.len());
        println!("Tables: {}", report.tables.len());
        println!("Foreign keys: {}", report.foreign_keys.len());
        println!("Routines: {}", report.routines.len());
        if !report.warnings.is_empty() {
            println!("Warnings: {}", report.warnings.len());
        }
    }
    Ok(())
}
