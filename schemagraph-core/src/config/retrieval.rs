//! Retrieval strategy per metadata category.

use crate::query::InformationSchemaKey;
use serde::{Deserialize, Serialize};

/// Category of database objects retrieved as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataCategory {
    Tables,
    Columns,
    ForeignKeys,
    Functions,
    Procedures,
    Triggers,
    TableConstraints,
}

impl MetadataCategory {
    pub const ALL: [MetadataCategory; 7] = [
        Self::Tables,
        Self::Columns,
        Self::ForeignKeys,
        Self::Functions,
        Self::Procedures,
        Self::Triggers,
        Self::TableConstraints,
    ];

    /// Key of the bulk-retrieval SQL for this category.
    pub fn information_schema_key(&self) -> InformationSchemaKey {
        match self {
            Self::Tables => InformationSchemaKey::Tables,
            Self::Columns => InformationSchemaKey::Columns,
            Self::ForeignKeys => InformationSchemaKey::ForeignKeys,
            Self::Functions => InformationSchemaKey::Functions,
            Self::Procedures => InformationSchemaKey::Procedures,
            Self::Triggers => InformationSchemaKey::Triggers,
            Self::TableConstraints => InformationSchemaKey::TableConstraints,
        }
    }

    /// Row fields holding the catalog and schema an object belongs to.
    pub fn schema_columns(&self) -> (&'static str, &'static str) {
        match self {
            Self::Tables | Self::Columns => ("TABLE_CAT", "TABLE_SCHEM"),
            Self::ForeignKeys => ("FKTABLE_CAT", "FKTABLE_SCHEM"),
            Self::Functions => ("FUNCTION_CAT", "FUNCTION_SCHEM"),
            Self::Procedures => ("PROCEDURE_CAT", "PROCEDURE_SCHEM"),
            Self::Triggers => ("EVENT_OBJECT_CATALOG", "EVENT_OBJECT_SCHEMA"),
            Self::TableConstraints => ("TABLE_CATALOG", "TABLE_SCHEMA"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.information_schema_key().as_str()
    }
}

impl std::fmt::Display for MetadataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a category is retrieved. Fixed for the duration of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// One configured SQL statement for all schemas, or one per table
    BulkQuery,
    /// One introspection call per crawled schema
    #[default]
    PerObjectMetadata,
    /// Nothing is retrieved
    Disabled,
}

/// Retrieval strategy for every metadata category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalStrategies {
    pub tables: RetrievalStrategy,
    pub columns: RetrievalStrategy,
    pub foreign_keys: RetrievalStrategy,
    pub functions: RetrievalStrategy,
    pub procedures: RetrievalStrategy,
    pub triggers: RetrievalStrategy,
    pub table_constraints: RetrievalStrategy,
}

impl RetrievalStrategies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(&self, category: MetadataCategory) -> RetrievalStrategy {
        match category {
            MetadataCategory::Tables => self.tables,
            MetadataCategory::Columns => self.columns,
            MetadataCategory::ForeignKeys => self.foreign_keys,
            MetadataCategory::Functions => self.functions,
            MetadataCategory::Procedures => self.procedures,
            MetadataCategory::Triggers => self.triggers,
            MetadataCategory::TableConstraints => self.table_constraints,
        }
    }

    /// Builder method to set the strategy of one category.
    pub fn with_strategy(mut self, category: MetadataCategory, strategy: RetrievalStrategy) -> Self {
        let slot = match category {
            MetadataCategory::Tables => &mut self.tables,
            MetadataCategory::Columns => &mut self.columns,
            MetadataCategory::ForeignKeys => &mut self.foreign_keys,
            MetadataCategory::Functions => &mut self.functions,
            MetadataCategory::Procedures => &mut self.procedures,
            MetadataCategory::Triggers => &mut self.triggers,
            MetadataCategory::TableConstraints => &mut self.table_constraints,
        };
        *slot = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_strategy_is_per_object() {
        let strategies = RetrievalStrategies::default();
        for category in MetadataCategory::ALL {
            assert_eq!(
                strategies.strategy(category),
                RetrievalStrategy::PerObjectMetadata
            );
        }
    }

    #[test]
    fn test_with_strategy_sets_one_category() {
        let strategies = RetrievalStrategies::new()
            .with_strategy(MetadataCategory::Functions, RetrievalStrategy::BulkQuery)
            .with_strategy(MetadataCategory::Triggers, RetrievalStrategy::Disabled);

        assert_eq!(
            strategies.strategy(MetadataCategory::Functions),
            RetrievalStrategy::BulkQuery
        );
        assert_eq!(
            strategies.strategy(MetadataCategory::Triggers),
            RetrievalStrategy::Disabled
        );
        assert_eq!(
            strategies.strategy(MetadataCategory::Procedures),
            RetrievalStrategy::PerObjectMetadata
        );
    }

    #[test]
    fn test_strategies_deserialize_snake_case() {
        let strategies: RetrievalStrategies =
            serde_json::from_str(r#"{"procedures": "bulk_query", "columns": "disabled"}"#)
                .expect("deserialize");
        assert_eq!(strategies.procedures, RetrievalStrategy::BulkQuery);
        assert_eq!(strategies.columns, RetrievalStrategy::Disabled);
        assert_eq!(strategies.tables, RetrievalStrategy::PerObjectMetadata);
    }

    #[test]
    fn test_category_keys() {
        assert_eq!(
            MetadataCategory::TableConstraints.information_schema_key(),
            InformationSchemaKey::TableConstraints
        );
        assert_eq!(MetadataCategory::ForeignKeys.to_string(), "foreign_keys");
    }
}
