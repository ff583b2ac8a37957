//! Core library for schemagraph.
//!
//! schemagraph crawls the metadata of a relational database into an
//! in-memory catalog of schemas, tables, columns, foreign keys, constraints,
//! triggers and routines, reduces it to the objects a user asked for, and
//! derives weak-association match keys from table names.
//!
//! # Guarantees
//! - Metadata access is read-only
//! - Connection strings are redacted before they reach logs or errors
//! - Unsupported introspection calls degrade to warnings, never to a
//!   failed crawl
//!
//! # Architecture
//! - [`adapters`]: the [`MetadataSource`] seam with in-memory and SQLite
//!   sources
//! - [`retriever`]: per-category retrieval with a configurable strategy
//! - [`query`]: SQL templates and their registry
//! - [`inclusion`]: include/exclude rules on qualified names
//! - [`reducer`]: table and routine reduction along foreign keys
//! - [`weak_associations`]: name-derived match keys
//! - [`crawler`]: the pipeline tying the stages together

pub mod adapters;
pub mod config;
pub mod crawler;
pub mod error;
pub mod inclusion;
pub mod logging;
pub mod models;
pub mod query;
pub mod reducer;
pub mod retriever;
pub mod weak_associations;

// Re-export commonly used types
pub use adapters::{InMemoryMetadataSource, MetadataRow, MetadataSource, SchemaRows};
#[cfg(feature = "sqlite")]
pub use adapters::SqliteMetadataSource;
pub use config::{
    CrawlOptions, FilterOptions, GrepOptions, LimitOptions, MetadataCategory, RetrievalStrategies,
    RetrievalStrategy,
};
pub use crawler::{CrawlResult, SchemaCrawler};
pub use error::{Result, SchemaGraphError};
pub use inclusion::{InclusionRule, RulePatterns};
pub use logging::init_logging;
pub use models::{Catalog, Routine, Schema, Table, TableId};
pub use query::{InformationSchemaKey, InformationSchemaViews, Query};
pub use weak_associations::TableMatchKeys;
