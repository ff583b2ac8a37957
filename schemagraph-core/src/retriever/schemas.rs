use super::MetadataRetriever;
use crate::Result;
use crate::inclusion::{InclusionRule, InclusionRuleFilter};
use crate::models::{Catalog, normalize_name};

impl MetadataRetriever<'_> {
    /// Registers the schemas accepted by `rule`, returning how many were
    /// added.
    ///
    /// A source reporting no schemas at all gets one unnamed schema, so
    /// databases without schema support can still be crawled.
    ///
    /// # Errors
    /// Returns error if the source fails
    pub async fn retrieve_schemas(
        &self,
        catalog: &mut Catalog,
        rule: &InclusionRule,
    ) -> Result<usize> {
        let filter: InclusionRuleFilter<str> = InclusionRuleFilter::new(Some(rule.clone()));
        if filter.is_exclude_all() {
            tracing::info!("Not retrieving schemas, since this was not requested");
            return Ok(0);
        }

        let rows = self.source.schemas().await?;
        if rows.is_empty() {
            tracing::debug!("Source reports no schemas, using an unnamed schema");
            catalog.add_schema(None, None);
            return Ok(1);
        }

        let mut count = 0;
        for row in &rows {
            let catalog_name = normalize_name(row.string("TABLE_CATALOG").or(row.string("TABLE_CAT")));
            let schema_name = normalize_name(row.string("TABLE_SCHEM"));
            if catalog_name.is_none() && schema_name.is_none() {
                continue;
            }

            let full_name = [catalog_name.as_deref(), schema_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(".");
            if !filter.test(&full_name) {
                tracing::trace!("Schema {} excluded", full_name);
                continue;
            }

            catalog.add_schema(catalog_name.as_deref(), schema_name.as_deref());
            count += 1;
        }

        tracing::info!("Retrieved {} schemas", count);
        Ok(count)
    }
}
