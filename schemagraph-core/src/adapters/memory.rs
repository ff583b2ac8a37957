//! Metadata source replaying preloaded rows.
//!
//! Snapshots are plain JSON, so a crawl can be reproduced without a live
//! database. Every request is recorded; tests use the call log to check
//! which requests a crawl made.

use super::{MetadataCategory, MetadataRow, MetadataSource, SchemaRows};
use crate::Result;
use crate::error::SchemaGraphError;
use crate::models::{Schema, normalize_name};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Rows a source answers with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSnapshot {
    pub product_name: String,
    /// `TABLE_CATALOG`/`TABLE_SCHEM` rows
    pub schemas: Vec<MetadataRow>,
    /// Introspection rows per category, for all schemas
    pub metadata: BTreeMap<MetadataCategory, Vec<MetadataRow>>,
    /// Result rows keyed by exact SQL text
    pub queries: BTreeMap<String, Vec<MetadataRow>>,
    /// Categories reported as unsupported for every schema
    pub unsupported: BTreeSet<MetadataCategory>,
    /// Schema full names a category is unsupported for
    pub unsupported_schemas: BTreeMap<MetadataCategory, BTreeSet<String>>,
}

/// A request received by an [`InMemoryMetadataSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Schemas,
    SchemaMetadata {
        category: MetadataCategory,
        schema: String,
    },
    ExecuteQuery {
        sql: String,
    },
}

/// Metadata source backed by a [`MetadataSnapshot`].
#[derive(Debug, Default)]
pub struct InMemoryMetadataSource {
    snapshot: MetadataSnapshot,
    calls: Mutex<Vec<SourceCall>>,
}

impl InMemoryMetadataSource {
    pub fn new(product_name: impl Into<String>) -> Self {
        Self::from_snapshot(MetadataSnapshot {
            product_name: product_name.into(),
            ..MetadataSnapshot::default()
        })
    }

    pub fn from_snapshot(snapshot: MetadataSnapshot) -> Self {
        Self {
            snapshot,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Loads a snapshot from a JSON file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid snapshot
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SchemaGraphError::Io {
            context: format!("Failed to read snapshot {}", path.display()),
            source,
        })?;
        let snapshot =
            serde_json::from_str(&contents).map_err(|source| SchemaGraphError::Serialization {
                context: format!("Invalid snapshot {}", path.display()),
                source,
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Builder method to add a schema.
    pub fn with_schema(mut self, catalog_name: Option<&str>, schema_name: &str) -> Self {
        let mut row = MetadataRow::new().with("TABLE_SCHEM", schema_name);
        row.insert("TABLE_CATALOG", catalog_name.map(str::to_string));
        self.snapshot.schemas.push(row);
        self
    }

    /// Builder method to add introspection rows for a category.
    pub fn with_rows(
        mut self,
        category: MetadataCategory,
        rows: impl IntoIterator<Item = MetadataRow>,
    ) -> Self {
        self.snapshot
            .metadata
            .entry(category)
            .or_default()
            .extend(rows);
        self
    }

    /// Builder method to register the result of a SQL statement.
    pub fn with_query_result(
        mut self,
        sql: impl Into<String>,
        rows: impl IntoIterator<Item = MetadataRow>,
    ) -> Self {
        self.snapshot
            .queries
            .insert(sql.into().trim().to_string(), rows.into_iter().collect());
        self
    }

    /// Builder method to report a category as unsupported.
    pub fn with_unsupported(mut self, category: MetadataCategory) -> Self {
        self.snapshot.unsupported.insert(category);
        self
    }

    /// Builder method to report a category as unsupported for one schema.
    pub fn with_unsupported_schema(
        mut self,
        category: MetadataCategory,
        schema_full_name: impl Into<String>,
    ) -> Self {
        self.snapshot
            .unsupported_schemas
            .entry(category)
            .or_default()
            .insert(schema_full_name.into());
        self
    }

    fn is_unsupported(&self, category: MetadataCategory, schema: &Schema) -> bool {
        self.snapshot.unsupported.contains(&category)
            || self
                .snapshot
                .unsupported_schemas
                .get(&category)
                .is_some_and(|schemas| schemas.contains(&schema.full_name))
    }

    pub fn snapshot(&self) -> &MetadataSnapshot {
        &self.snapshot
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<SourceCall> {
        self.lock_calls().clone()
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn record(&self, call: SourceCall) {
        self.lock_calls().push(call);
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<SourceCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn belongs_to(row: &MetadataRow, category: MetadataCategory, schema: &Schema) -> bool {
    let (catalog_column, schema_column) = category.schema_columns();
    normalize_name(row.string(catalog_column)) == schema.catalog_name
        && normalize_name(row.string(schema_column)) == schema.schema_name
}

#[async_trait]
impl MetadataSource for InMemoryMetadataSource {
    fn product_name(&self) -> &str {
        &self.snapshot.product_name
    }

    async fn schemas(&self) -> Result<Vec<MetadataRow>> {
        self.record(SourceCall::Schemas);
        Ok(self.snapshot.schemas.clone())
    }

    async fn schema_metadata(
        &self,
        category: MetadataCategory,
        schema: &Schema,
    ) -> Result<SchemaRows> {
        self.record(SourceCall::SchemaMetadata {
            category,
            schema: schema.full_name.clone(),
        });
        if self.is_unsupported(category, schema) {
            return Ok(SchemaRows::unsupported(category));
        }

        let rows = self
            .snapshot
            .metadata
            .get(&category)
            .into_iter()
            .flatten()
            .filter(|row| belongs_to(row, category, schema))
            .cloned()
            .collect();
        Ok(SchemaRows::Rows(rows))
    }

    async fn execute_query(&self, sql: &str) -> Result<Vec<MetadataRow>> {
        let sql = sql.trim();
        self.record(SourceCall::ExecuteQuery {
            sql: sql.to_string(),
        });
        self.snapshot
            .queries
            .get(sql)
            .cloned()
            .ok_or_else(|| SchemaGraphError::query_failed(format!("no result registered for {}", sql)))
    }
}
