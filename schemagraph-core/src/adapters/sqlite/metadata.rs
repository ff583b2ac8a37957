//! SQLite introspection queries.
//!
//! # SQLite System Tables
//! - `pragma_database_list`: attached databases, reported as schemas
//! - `sqlite_master`: definitions of tables, views and triggers
//! - `pragma_table_info()`: columns of a table
//! - `pragma_foreign_key_list()`: foreign keys of a table
//!
//! Every row is shaped like the matching JDBC `DatabaseMetaData` result so
//! the retrievers need no SQLite-specific code.

use crate::Result;
use crate::adapters::MetadataRow;
use crate::error::SchemaGraphError;
use sqlx::{Column as _, Row, SqlitePool};

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Converts a dynamically typed row into a [`MetadataRow`].
pub(crate) fn to_metadata_row(row: &sqlx::sqlite::SqliteRow) -> MetadataRow {
    let mut metadata = MetadataRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        metadata.insert(column.name(), extract_column_value(row, index));
    }
    metadata
}

fn extract_column_value(row: &sqlx::sqlite::SqliteRow, index: usize) -> Option<String> {
    // SQLite is dynamically typed, so try each storage class in turn
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v;
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map(|n| n.to_string());
    }
    None
}

async fn fetch_rows(pool: &SqlitePool, sql: &str, context: &str) -> Result<Vec<MetadataRow>> {
    let rows = sqlx::query(sql)
        .fetch_all(pool)
        .await
        .map_err(|e| SchemaGraphError::collection_failed(context.to_string(), e))?;
    Ok(rows.iter().map(to_metadata_row).collect())
}

pub(crate) async fn collect_schemas(pool: &SqlitePool) -> Result<Vec<MetadataRow>> {
    fetch_rows(
        pool,
        "SELECT NULL AS TABLE_CATALOG, name AS TABLE_SCHEM \
         FROM pragma_database_list WHERE name <> 'temp' ORDER BY seq",
        "Failed to list SQLite databases",
    )
    .await
}

pub(crate) async fn collect_tables(pool: &SqlitePool, schema: &str) -> Result<Vec<MetadataRow>> {
    let sql = format!(
        "SELECT NULL AS TABLE_CAT, {literal} AS TABLE_SCHEM, name AS TABLE_NAME, \
                UPPER(type) AS TABLE_TYPE, NULL AS REMARKS, \
                CASE WHEN type = 'view' THEN sql END AS VIEW_DEFINITION \
         FROM {schema}.sqlite_master \
         WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
        literal = quote_literal(schema),
        schema = quote_identifier(schema),
    );
    fetch_rows(pool, &sql, "Failed to collect SQLite tables").await
}

pub(crate) async fn collect_columns(pool: &SqlitePool, schema: &str) -> Result<Vec<MetadataRow>> {
    let sql = format!(
        "SELECT NULL AS TABLE_CAT, {literal} AS TABLE_SCHEM, m.name AS TABLE_NAME, \
                p.name AS COLUMN_NAME, p.cid + 1 AS ORDINAL_POSITION, p.type AS TYPE_NAME, \
                CASE WHEN p.\"notnull\" = 0 THEN 'YES' ELSE 'NO' END AS IS_NULLABLE, \
                p.dflt_value AS COLUMN_DEF \
         FROM {schema}.sqlite_master m \
         JOIN pragma_table_info(m.name, {literal}) p \
         WHERE m.type IN ('table', 'view') AND m.name NOT LIKE 'sqlite_%' \
         ORDER BY m.name, p.cid",
        literal = quote_literal(schema),
        schema = quote_identifier(schema),
    );
    fetch_rows(pool, &sql, "Failed to collect SQLite columns").await
}

/// Foreign keys, named `fk_<table>_<id>` since SQLite keeps no names.
pub(crate) async fn collect_foreign_keys(
    pool: &SqlitePool,
    schema: &str,
) -> Result<Vec<MetadataRow>> {
    let sql = format!(
        "SELECT NULL AS FKTABLE_CAT, {literal} AS FKTABLE_SCHEM, m.name AS FKTABLE_NAME, \
                p.\"from\" AS FKCOLUMN_NAME, \
                NULL AS PKTABLE_CAT, {literal} AS PKTABLE_SCHEM, p.\"table\" AS PKTABLE_NAME, \
                COALESCE(p.\"to\", \
                    (SELECT ti.name FROM pragma_table_info(p.\"table\", {literal}) ti \
                     WHERE ti.pk = p.seq + 1)) AS PKCOLUMN_NAME, \
                p.seq + 1 AS KEY_SEQ, p.on_update AS UPDATE_RULE, p.on_delete AS DELETE_RULE, \
                'fk_' || m.name || '_' || p.id AS FK_NAME \
         FROM {schema}.sqlite_master m \
         JOIN pragma_foreign_key_list(m.name, {literal}) p \
         WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%' \
         ORDER BY m.name, p.id, p.seq",
        literal = quote_literal(schema),
        schema = quote_identifier(schema),
    );
    fetch_rows(pool, &sql, "Failed to collect SQLite foreign keys").await
}

pub(crate) async fn collect_triggers(pool: &SqlitePool, schema: &str) -> Result<Vec<MetadataRow>> {
    let sql = format!(
        "SELECT name, tbl_name, sql FROM {schema}.sqlite_master \
         WHERE type = 'trigger' ORDER BY tbl_name, name",
        schema = quote_identifier(schema),
    );
    let rows = fetch_rows(pool, &sql, "Failed to collect SQLite triggers").await?;

    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(order, row)| {
            let name = row.non_blank("name")?;
            let table = row.non_blank("tbl_name")?;
            let definition = row.string("sql").unwrap_or_default();
            let (timing, event) = parse_trigger_definition(definition);
            Some(
                MetadataRow::new()
                    .with("TRIGGER_SCHEMA", schema)
                    .with("TRIGGER_NAME", name)
                    .with("EVENT_OBJECT_SCHEMA", schema)
                    .with("EVENT_OBJECT_TABLE", table)
                    .with("EVENT_MANIPULATION", event)
                    .with("ACTION_TIMING", timing)
                    .with("ACTION_ORIENTATION", "ROW")
                    .with("ACTION_ORDER", order.to_string())
                    .with("ACTION_STATEMENT", definition),
            )
        })
        .collect())
}

/// Extracts timing and event from a `CREATE TRIGGER` statement.
///
/// SQLite defaults to `BEFORE` when no timing is written.
pub(crate) fn parse_trigger_definition(sql: &str) -> (&'static str, &'static str) {
    let upper = sql.to_uppercase();
    let header = upper.split(" ON ").next().unwrap_or_default();
    let words: Vec<&str> = header.split_whitespace().collect();

    let timing = if words.windows(2).any(|w| w == ["INSTEAD", "OF"]) {
        "INSTEAD OF"
    } else if words.contains(&"AFTER") {
        "AFTER"
    } else {
        "BEFORE"
    };
    let event = ["INSERT", "UPDATE", "DELETE"]
        .into_iter()
        .find(|event| words.contains(event))
        .unwrap_or("UNKNOWN");
    (timing, event)
}
