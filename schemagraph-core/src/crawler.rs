//! Crawl orchestration.
//!
//! A crawl runs as one sequential pipeline against a single metadata source:
//! retrieval of every category, table and routine reduction, then the
//! optional row counts and weak-association match keys. The catalog is only
//! mutated by one stage at a time.

use crate::Result;
use crate::adapters::MetadataSource;
use crate::config::{CrawlOptions, LimitRules};
use crate::models::{Catalog, Table};
use crate::query::TemplateContext;
use crate::reducer::{RoutinesReducer, TableGrepFilter, TablesReducer};
use crate::retriever::MetadataRetriever;
use crate::weak_associations::TableMatchKeys;
use serde::Serialize;

/// Output of a crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub catalog: Catalog,
    /// Present when weak-association inference is enabled
    pub match_keys: Option<TableMatchKeys>,
}

/// Crawls one metadata source into a reduced catalog.
pub struct SchemaCrawler<'a> {
    source: &'a dyn MetadataSource,
    options: CrawlOptions,
}

impl<'a> SchemaCrawler<'a> {
    pub fn new(source: &'a dyn MetadataSource, options: CrawlOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Runs the full crawl.
    ///
    /// # Errors
    /// Returns a configuration error for invalid options or a category
    /// configured for bulk retrieval without its query, and any error the
    /// source raises other than an unsupported feature
    pub async fn crawl(&self) -> Result<CrawlResult> {
        self.options.validate()?;
        let limits = self.options.limit.compile()?;
        let grep = TableGrepFilter::new(&self.options.grep)?;

        tracing::info!("Crawling {} metadata", self.source.product_name());
        let mut catalog = Catalog::new(self.source.product_name());

        let context = TemplateContext::new(Some(&limits.schemas), &self.options.template_variables);
        let retriever = MetadataRetriever::new(
            self.source,
            self.options.retrieval,
            &self.options.information_schema_views,
            context,
        )
        .with_alphabetical_column_sort(self.options.alphabetical_column_sort);

        self.retrieve(&retriever, &mut catalog, &limits).await?;
        self.reduce(&mut catalog, &limits, &grep);

        if self.options.load_row_counts {
            retriever.retrieve_row_counts(&mut catalog).await?;
        }

        let match_keys = self.options.infer_weak_associations.then(|| {
            let tables: Vec<&Table> = catalog.tables().collect();
            TableMatchKeys::build(&tables, &self.options.match_keys)
        });

        tracing::info!(
            "Crawl completed: {} schemas, {} tables, {} routines",
            catalog.schemas().count(),
            catalog.table_count(),
            catalog.routine_count()
        );
        Ok(CrawlResult {
            catalog,
            match_keys,
        })
    }

    async fn retrieve(
        &self,
        retriever: &MetadataRetriever<'_>,
        catalog: &mut Catalog,
        limits: &LimitRules,
    ) -> Result<()> {
        let schemas = retriever.retrieve_schemas(catalog, &limits.schemas).await?;
        if schemas == 0 {
            tracing::warn!("No schemas matched, nothing else will be retrieved");
            return Ok(());
        }

        retriever.retrieve_tables(catalog, limits).await?;
        retriever.retrieve_columns(catalog).await?;
        retriever.retrieve_foreign_keys(catalog).await?;
        retriever.retrieve_table_constraints(catalog).await?;
        retriever.retrieve_triggers(catalog, &limits.triggers).await?;
        retriever.retrieve_functions(catalog, &limits.routines).await?;
        retriever.retrieve_procedures(catalog, &limits.routines).await?;
        Ok(())
    }

    fn reduce(&self, catalog: &mut Catalog, limits: &LimitRules, grep: &TableGrepFilter) {
        TablesReducer::new(&self.options.filter, &self.options.grep).reduce(catalog, |table| {
            limits.tables.test(&table.full_name) && grep.test(table)
        });
        RoutinesReducer::new().reduce(catalog, |routine| limits.routines.test(&routine.full_name));
        tracing::info!(
            "Reduced catalog to {} tables and {} routines",
            catalog.table_count(),
            catalog.routine_count()
        );
    }
}
