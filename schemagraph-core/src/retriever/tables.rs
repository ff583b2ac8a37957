//! Tables, columns and foreign keys.

use super::{MetadataRetriever, row_schema};
use crate::Result;
use crate::adapters::MetadataRow;
use crate::config::{LimitRules, MetadataCategory};
use crate::models::{
    Catalog, Column, ColumnRef, ColumnReference, ForeignKey, ForeignKeyRule, TableId,
};
use std::collections::BTreeMap;

impl MetadataRetriever<'_> {
    /// Adds tables of crawled schemas, returning how many were added.
    ///
    /// The table inclusion rule is applied later by the reducer, so that
    /// tables outside it stay reachable through foreign keys. Only the
    /// table type restriction is checked here.
    ///
    /// # Errors
    /// Returns error if the source fails or the strategy is misconfigured
    pub async fn retrieve_tables(&self, catalog: &mut Catalog, limits: &LimitRules) -> Result<usize> {
        if limits.tables.is_exclude_all() {
            tracing::info!("Not retrieving tables, since this was not requested");
            return Ok(0);
        }

        let rows = self.retrieve_rows(MetadataCategory::Tables, catalog).await?;
        let columns = MetadataCategory::Tables.schema_columns();
        let mut count = 0;
        for row in &rows {
            let Some(name) = row.non_blank("TABLE_NAME") else {
                continue;
            };
            let Some(schema) = row_schema(catalog, row, columns) else {
                continue;
            };
            let table_type = row.non_blank("TABLE_TYPE").unwrap_or("TABLE").to_uppercase();
            if !limits.accepts_table_type(&table_type) {
                tracing::trace!("Skipping {} of type {}", name, table_type);
                continue;
            }

            let id = catalog.add_table(schema, name, &table_type);
            let table = catalog.table_mut(id);
            table.remarks = row.non_blank("REMARKS").map(str::to_string);
            table.definition = row.non_blank("VIEW_DEFINITION").map(str::to_string);
            tracing::debug!("Retrieved table {}", table.full_name);
            count += 1;
        }

        tracing::info!("Retrieved {} tables", count);
        Ok(count)
    }

    /// Adds columns to already retrieved tables.
    ///
    /// # Errors
    /// Returns error if the source fails or the strategy is misconfigured
    pub async fn retrieve_columns(&self, catalog: &mut Catalog) -> Result<usize> {
        let rows = self.retrieve_rows(MetadataCategory::Columns, catalog).await?;
        let columns = MetadataCategory::Columns.schema_columns();
        let mut count = 0;
        for row in &rows {
            let (Some(table_name), Some(column_name)) =
                (row.non_blank("TABLE_NAME"), row.non_blank("COLUMN_NAME"))
            else {
                continue;
            };
            let Some(table) = row_schema(catalog, row, columns)
                .and_then(|schema| catalog.lookup_table(schema, table_name))
            else {
                continue;
            };
            if catalog.table(table).is_partial() {
                continue;
            }

            if catalog.table_mut(table).add_column(build_column(row, column_name)) {
                count += 1;
            }
        }

        tracing::info!("Retrieved {} columns", count);
        Ok(count)
    }

    /// Adds foreign keys between tables.
    ///
    /// A key needs at least one end among the retrieved tables. An end that
    /// was not retrieved becomes a partial table.
    ///
    /// # Errors
    /// Returns error if the source fails or the strategy is misconfigured
    pub async fn retrieve_foreign_keys(&self, catalog: &mut Catalog) -> Result<usize> {
        let rows = self
            .retrieve_rows(MetadataCategory::ForeignKeys, catalog)
            .await?;

        // Rows of one key share the dependent table and the key name
        let mut keys: BTreeMap<(TableId, String), Vec<&MetadataRow>> = BTreeMap::new();
        let mut order: Vec<(TableId, String)> = Vec::new();
        for row in &rows {
            let Some(name) = row.non_blank("FK_NAME") else {
                continue;
            };
            let Some((child, _)) = resolve_key_ends(catalog, row) else {
                continue;
            };
            let key = (child, name.to_string());
            if !keys.contains_key(&key) {
                order.push(key.clone());
            }
            keys.entry(key).or_default().push(row);
        }

        let mut count = 0;
        for key in order {
            let Some(key_rows) = keys.get(&key) else {
                continue;
            };
            if let Some(foreign_key) = build_foreign_key(catalog, &key.1, key_rows)
                && catalog.add_foreign_key(foreign_key)
            {
                count += 1;
            }
        }

        tracing::info!("Retrieved {} foreign keys", count);
        Ok(count)
    }
}

fn build_column(row: &MetadataRow, name: &str) -> Column {
    let ordinal = row
        .i64("ORDINAL_POSITION")
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or_default();
    let mut column = Column::new(name, ordinal, row.non_blank("TYPE_NAME").unwrap_or_default());
    column.nullable = match row.non_blank("IS_NULLABLE") {
        Some(value) => !value.eq_ignore_ascii_case("NO"),
        None => row.i64("NULLABLE") != Some(0),
    };
    column.default_value = row.string("COLUMN_DEF").map(str::to_string);
    column.remarks = row.non_blank("REMARKS").map(str::to_string);
    column
}

/// Resolves the dependent and referenced tables of a foreign key row,
/// creating partial tables for ends that were not retrieved.
fn resolve_key_ends(catalog: &mut Catalog, row: &MetadataRow) -> Option<(TableId, TableId)> {
    let child_name = row.non_blank("FKTABLE_NAME")?;
    let parent_name = row.non_blank("PKTABLE_NAME")?;
    row.non_blank("FKCOLUMN_NAME")?;
    row.non_blank("PKCOLUMN_NAME")?;

    let child_catalog = row.string("FKTABLE_CAT");
    let child_schema = row.string("FKTABLE_SCHEM");
    let parent_catalog = row.string("PKTABLE_CAT");
    let parent_schema = row.string("PKTABLE_SCHEM");

    let is_full = |id: Option<TableId>| id.is_some_and(|id| !catalog.table(id).is_partial());
    let child_known = is_full(catalog.lookup_table_by_name(child_catalog, child_schema, child_name));
    let parent_known =
        is_full(catalog.lookup_table_by_name(parent_catalog, parent_schema, parent_name));
    if !child_known && !parent_known {
        return None;
    }

    let child = catalog.lookup_or_create_partial_table(child_catalog, child_schema, child_name);
    let parent = catalog.lookup_or_create_partial_table(parent_catalog, parent_schema, parent_name);
    Some((child, parent))
}

fn build_foreign_key(catalog: &mut Catalog, name: &str, rows: &[&MetadataRow]) -> Option<ForeignKey> {
    let mut column_references = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let (child, parent) = resolve_key_ends(catalog, row)?;
        let key_sequence = row
            .i64("KEY_SEQ")
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(u32::try_from(index + 1).unwrap_or(u32::MAX));
        column_references.push(ColumnReference {
            key_sequence,
            foreign_key_column: ColumnRef {
                table: child,
                column: row.non_blank("FKCOLUMN_NAME")?.to_string(),
            },
            primary_key_column: ColumnRef {
                table: parent,
                column: row.non_blank("PKCOLUMN_NAME")?.to_string(),
            },
        });
    }
    column_references.sort_by_key(|r| r.key_sequence);

    let first = rows.first()?;
    let rule = |column: &str| {
        first
            .non_blank(column)
            .map(ForeignKeyRule::from_metadata)
            .unwrap_or_default()
    };
    Some(ForeignKey {
        name: name.to_string(),
        column_references,
        update_rule: rule("UPDATE_RULE"),
        delete_rule: rule("DELETE_RULE"),
    })
}
