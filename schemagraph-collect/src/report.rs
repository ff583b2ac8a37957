//! JSON report of a crawled catalog.
//!
//! The report flattens the catalog's id-linked arenas into qualified names,
//! so it can be read without the catalog types.

use anyhow::{Context, Result};
use schemagraph_core::{
    CrawlResult,
    models::{Catalog, TableId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level report written by the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogReport {
    pub product_name: String,
    pub crawled_at: String,
    pub crawler_version: String,
    pub warnings: Vec<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<TableReport>,
    pub foreign_keys: Vec<ForeignKeyReport>,
    pub routines: Vec<RoutineReport>,
    /// Match keys by table full name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_keys: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub full_name: String,
    pub table_type: String,
    pub columns: Vec<ColumnReport>,
    pub constraints: Vec<String>,
    pub triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyReport {
    pub name: String,
    /// Table holding the key columns
    pub child_table: String,
    pub parent_table: String,
    /// `(child column, parent column)` in key order
    pub columns: Vec<(String, String)>,
    /// True when either end was not retained
    pub dangling: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineReport {
    pub full_name: String,
    pub specific_name: String,
    pub routine_type: String,
}

impl CatalogReport {
    pub fn from_result(result: &CrawlResult) -> Self {
        let catalog = &result.catalog;
        let info = catalog.info();

        let tables = catalog
            .tables()
            .map(|table| TableReport {
                full_name: table.full_name.clone(),
                table_type: table.table_type.clone(),
                columns: table
                    .columns()
                    .iter()
                    .map(|c| ColumnReport {
                        name: c.name.clone(),
                        data_type: c.data_type.name.clone(),
                        nullable: c.nullable,
                    })
                    .collect(),
                constraints: table.constraints().iter().map(|c| c.name.clone()).collect(),
                triggers: table.triggers().iter().map(|t| t.name.clone()).collect(),
                row_count: table.row_count,
                remarks: table.remarks.clone(),
            })
            .collect();

        let routines = catalog
            .routines()
            .map(|routine| RoutineReport {
                full_name: routine.full_name.clone(),
                specific_name: routine.specific_name.clone(),
                routine_type: if routine.is_function() {
                    "function".to_string()
                } else {
                    "procedure".to_string()
                },
            })
            .collect();

        let match_keys = result.match_keys.as_ref().map(|keys| {
            keys.iter()
                .map(|(id, table_keys)| (catalog.table(id).full_name.clone(), table_keys.to_vec()))
                .collect()
        });

        Self {
            product_name: info.product_name.clone(),
            crawled_at: info.crawled_at.to_rfc3339(),
            crawler_version: info.crawler_version.clone(),
            warnings: info.warnings.clone(),
            schemas: catalog.schemas().map(|s| s.full_name.clone()).collect(),
            tables,
            foreign_keys: foreign_keys(catalog),
            routines,
            match_keys,
        }
    }

    pub fn table(&self, full_name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.full_name == full_name)
    }
}

/// Foreign keys with at least one retained end.
fn foreign_keys(catalog: &Catalog) -> Vec<ForeignKeyReport> {
    let retained = |id: TableId| !catalog.is_table_reduced(id) && !catalog.table(id).is_partial();
    catalog
        .foreign_keys()
        .iter()
        .filter_map(|foreign_key| {
            let child = foreign_key.child_table()?;
            let parent = foreign_key.parent_table()?;
            if !retained(child) && !retained(parent) {
                return None;
            }
            Some(ForeignKeyReport {
                name: foreign_key.name.clone(),
                child_table: catalog.table(child).full_name.clone(),
                parent_table: catalog.table(parent).full_name.clone(),
                columns: foreign_key
                    .column_references
                    .iter()
                    .map(|r| {
                        (
                            r.foreign_key_column.column.clone(),
                            r.primary_key_column.column.clone(),
                        )
                    })
                    .collect(),
                dangling: !retained(child) || !retained(parent),
            })
        })
        .collect()
}

/// Writes the report as pretty-printed JSON.
///
/// # Errors
/// Returns error if serialization or the write fails
pub async fn save_report(report: &CatalogReport, output_path: &Path) -> Result<()> {
    let json_data =
        serde_json::to_string_pretty(report).context("Failed to serialize catalog report")?;
    tokio::fs::write(output_path, json_data)
        .await
        .with_context(|| format!("Failed to write to {}", output_path.display()))?;
    Ok(())
}
