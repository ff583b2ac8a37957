//! Retrieval of catalog objects from a metadata source.
//!
//! Each metadata category is retrieved with the [`RetrievalStrategy`] fixed
//! for it in configuration:
//!
//! - `Disabled`: nothing is requested and the category stays empty.
//! - `BulkQuery`: the category's registered SQL runs once, or once per
//!   table when it references `${table}`. A missing query is a fatal
//!   configuration error for the category.
//! - `PerObjectMetadata`: the source is asked once per crawled schema. A
//!   schema the source cannot introspect is logged and skipped.
//!
//! Row conversion is shared by both strategies. Rows with a blank name or an
//! unknown schema are dropped, and objects rejected by their inclusion rule
//! are discarded.
//!
//! # Module Structure
//! - `schemas`: schema discovery
//! - `tables`: tables, columns and foreign keys
//! - `constraints`: table constraints
//! - `triggers`: table triggers
//! - `routines`: functions and procedures
//! - `row_counts`: per-table row counts after reduction

mod constraints;
mod row_counts;
mod routines;
mod schemas;
mod tables;
mod triggers;


use crate::Result;
use crate::adapters::{MetadataRow, MetadataSource, SchemaRows};
use crate::config::{MetadataCategory, RetrievalStrategies, RetrievalStrategy};
use crate::error::SchemaGraphError;
use crate::models::{Catalog, Schema, SchemaId};
use crate::query::{InformationSchemaViews, TemplateContext};

/// Reads metadata rows for each category and converts them into catalog
/// objects.
pub struct MetadataRetriever<'a> {
    source: &'a dyn MetadataSource,
    strategies: RetrievalStrategies,
    views: &'a InformationSchemaViews,
    context: TemplateContext,
    alphabetical_column_sort: bool,
}

impl<'a> MetadataRetriever<'a> {
    pub fn new(
        source: &'a dyn MetadataSource,
        strategies: RetrievalStrategies,
        views: &'a InformationSchemaViews,
        context: TemplateContext,
    ) -> Self {
        Self {
            source,
            strategies,
            views,
            context,
            alphabetical_column_sort: false,
        }
    }

    /// Builder method to expand column lists in name order.
    pub fn with_alphabetical_column_sort(mut self, alphabetical: bool) -> Self {
        self.alphabetical_column_sort = alphabetical;
        self
    }

    pub fn strategy(&self, category: MetadataCategory) -> RetrievalStrategy {
        self.strategies.strategy(category)
    }

    /// Fetches the raw rows of one category using its configured strategy.
    ///
    /// # Errors
    /// Returns [`SchemaGraphError::MissingQuery`] for a bulk strategy without
    /// registered SQL, and any source error other than an unsupported
    /// category.
    pub async fn retrieve_rows(
        &self,
        category: MetadataCategory,
        catalog: &mut Catalog,
    ) -> Result<Vec<MetadataRow>> {
        match self.strategy(category) {
            RetrievalStrategy::Disabled => {
                tracing::debug!("Retrieval of {} is disabled", category);
                Ok(Vec::new())
            }
            RetrievalStrategy::BulkQuery => self.retrieve_bulk(category, catalog).await,
            RetrievalStrategy::PerObjectMetadata => {
                self.retrieve_per_schema(category, catalog).await
            }
        }
    }

    async fn retrieve_bulk(
        &self,
        category: MetadataCategory,
        catalog: &Catalog,
    ) -> Result<Vec<MetadataRow>> {
        let key = category.information_schema_key();
        let query = self
            .views
            .get(key)
            .ok_or_else(|| SchemaGraphError::missing_query(key.as_str()))?;

        if !query.is_per_table() {
            tracing::debug!("Retrieving {} with a bulk query", category);
            return self
                .source
                .execute_query(&query.sql_for_schemas(&self.context))
                .await;
        }

        tracing::debug!("Retrieving {} with a per-table query", category);
        let mut rows = Vec::new();
        for table in catalog.tables() {
            let sql = query.sql_for_table(
                table,
                catalog,
                self.alphabetical_column_sort,
                &self.context,
            );
            rows.extend(self.source.execute_query(&sql).await?);
        }
        Ok(rows)
    }

    async fn retrieve_per_schema(
        &self,
        category: MetadataCategory,
        catalog: &mut Catalog,
    ) -> Result<Vec<MetadataRow>> {
        let schemas: Vec<Schema> = catalog.schemas().cloned().collect();
        let mut rows = Vec::new();
        for schema in &schemas {
            match self.source.schema_metadata(category, schema).await? {
                SchemaRows::Rows(schema_rows) => {
                    tracing::trace!(
                        "Retrieved {} {} rows for schema {}",
                        schema_rows.len(),
                        category,
                        schema.full_name
                    );
                    rows.extend(schema_rows);
                }
                SchemaRows::Unsupported { feature } => {
                    let error =
                        SchemaGraphError::unsupported_feature(feature, self.source.product_name());
                    let warning = format!(
                        "Could not retrieve {} for schema '{}': {}",
                        category, schema.full_name, error
                    );
                    tracing::warn!("{}", warning);
                    catalog.add_warning(warning);
                }
            }
        }
        Ok(rows)
    }
}

/// Resolves the crawled schema of a row from its catalog and schema fields.
fn row_schema(catalog: &Catalog, row: &MetadataRow, columns: (&str, &str)) -> Option<SchemaId> {
    catalog.lookup_schema(row.string(columns.0), row.string(columns.1))
}
