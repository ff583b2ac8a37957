use super::{MetadataRetriever, row_schema};
use crate::Result;
use crate::config::MetadataCategory;
use crate::models::{Catalog, ConstraintType, TableConstraint};

impl MetadataRetriever<'_> {
    /// Adds primary key, unique and check constraints to retrieved tables.
    ///
    /// Foreign key constraints are retrieved separately and skipped here.
    ///
    /// # Errors
    /// Returns error if the source fails or the strategy is misconfigured
    pub async fn retrieve_table_constraints(&self, catalog: &mut Catalog) -> Result<usize> {
        let rows = self
            .retrieve_rows(MetadataCategory::TableConstraints, catalog)
            .await?;
        let columns = MetadataCategory::TableConstraints.schema_columns();
        let mut count = 0;
        for row in &rows {
            let (Some(name), Some(table_name)) =
                (row.non_blank("CONSTRAINT_NAME"), row.non_blank("TABLE_NAME"))
            else {
                continue;
            };
            let Some(table) = row_schema(catalog, row, columns)
                .and_then(|schema| catalog.lookup_table(schema, table_name))
            else {
                continue;
            };
            let type_name = row.non_blank("CONSTRAINT_TYPE").unwrap_or_default();
            if type_name.eq_ignore_ascii_case("FOREIGN KEY") {
                continue;
            }

            let constraint = TableConstraint {
                name: name.to_string(),
                constraint_type: ConstraintType::from_metadata(type_name),
                definition: row.non_blank("CHECK_CLAUSE").map(str::to_string),
            };
            if catalog.table_mut(table).add_constraint(constraint) {
                count += 1;
            }
        }

        tracing::info!("Retrieved {} table constraints", count);
        Ok(count)
    }
}
