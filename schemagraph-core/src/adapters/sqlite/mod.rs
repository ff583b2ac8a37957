//! SQLite metadata source.
//!
//! # Module Structure
//! - `connection`: connection string validation and read-only opening
//! - `metadata`: introspection through `sqlite_master` and pragma functions
//!
//! # SQLite-Specific Behavior
//! - Each attached database is a schema; `temp` is skipped
//! - Foreign keys always reference a table in the same database
//! - Functions, procedures and table constraints are not introspectable and
//!   are reported as unsupported

pub mod connection;
mod metadata;

pub use connection::{is_in_memory, validate_sqlite_connection_string};

use super::{MetadataCategory, MetadataRow, MetadataSource, SchemaRows};
use crate::Result;
use crate::models::Schema;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Metadata source reading a SQLite database through sqlx.
pub struct SqliteMetadataSource {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteMetadataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteMetadataSource")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl SqliteMetadataSource {
    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl MetadataSource for SqliteMetadataSource {
    fn product_name(&self) -> &str {
        "SQLite"
    }

    async fn schemas(&self) -> Result<Vec<MetadataRow>> {
        metadata::collect_schemas(&self.pool).await
    }

    async fn schema_metadata(
        &self,
        category: MetadataCategory,
        schema: &Schema,
    ) -> Result<SchemaRows> {
        let Some(name) = schema.schema_name.as_deref() else {
            return Ok(SchemaRows::Rows(Vec::new()));
        };

        let rows = match category {
            MetadataCategory::Tables => metadata::collect_tables(&self.pool, name).await?,
            MetadataCategory::Columns => metadata::collect_columns(&self.pool, name).await?,
            MetadataCategory::ForeignKeys => {
                metadata::collect_foreign_keys(&self.pool, name).await?
            }
            MetadataCategory::Triggers => metadata::collect_triggers(&self.pool, name).await?,
            MetadataCategory::Functions
            | MetadataCategory::Procedures
            | MetadataCategory::TableConstraints => {
                return Ok(SchemaRows::unsupported(category));
            }
        };
        Ok(SchemaRows::Rows(rows))
    }

    async fn execute_query(&self, sql: &str) -> Result<Vec<MetadataRow>> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await.map_err(|e| {
            crate::error::SchemaGraphError::query_failed(format!("{}: {}", sql, e))
        })?;
        Ok(rows.iter().map(metadata::to_metadata_row).collect())
    }
}
