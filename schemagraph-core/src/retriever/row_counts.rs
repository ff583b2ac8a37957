use super::MetadataRetriever;
use crate::Result;
use crate::error::SchemaGraphError;
use crate::models::{Catalog, TableId};
use crate::query::InformationSchemaKey;

impl MetadataRetriever<'_> {
    /// Counts rows of every retained table with the `table_row_counts`
    /// query. A table whose count fails is logged and left without a count.
    ///
    /// # Errors
    /// Returns a configuration error when no per-table row count query is
    /// registered
    pub async fn retrieve_row_counts(&self, catalog: &mut Catalog) -> Result<usize> {
        let key = InformationSchemaKey::TableRowCounts;
        let query = self
            .views
            .get(key)
            .ok_or_else(|| SchemaGraphError::missing_query(key.as_str()))?;
        if !query.is_per_table() {
            return Err(SchemaGraphError::configuration(
                "table_row_counts SQL must reference ${table}",
            ));
        }

        let tables: Vec<TableId> = catalog.tables().map(|t| t.id).collect();
        let mut count = 0;
        for id in tables {
            let sql = query.sql_for_table(
                catalog.table(id),
                catalog,
                self.alphabetical_column_sort,
                &self.context,
            );
            let rows = match self.source.execute_query(&sql).await {
                Ok(rows) => rows,
                Err(e) => {
                    let warning = format!(
                        "Could not count rows of {}: {}",
                        catalog.table(id).full_name,
                        e
                    );
                    tracing::warn!("{}", warning);
                    catalog.add_warning(warning);
                    continue;
                }
            };

            let row_count = rows.first().and_then(|row| {
                row.i64("ROW_COUNT")
                    .or_else(|| row.single_value().and_then(|v| v.trim().parse().ok()))
            });
            if let Some(row_count) = row_count {
                catalog.table_mut(id).row_count = Some(row_count);
                count += 1;
            }
        }

        tracing::info!("Retrieved row counts for {} tables", count);
        Ok(count)
    }
}
