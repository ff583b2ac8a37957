//! Registry of bulk-retrieval SQL, keyed by metadata category.

use super::Query;
use crate::error::SchemaGraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Names under which bulk-retrieval SQL can be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformationSchemaKey {
    Tables,
    Columns,
    ForeignKeys,
    Functions,
    Procedures,
    Triggers,
    TableConstraints,
    TableRowCounts,
}

impl InformationSchemaKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::ForeignKeys => "foreign_keys",
            Self::Functions => "functions",
            Self::Procedures => "procedures",
            Self::Triggers => "triggers",
            Self::TableConstraints => "table_constraints",
            Self::TableRowCounts => "table_row_counts",
        }
    }
}

impl std::fmt::Display for InformationSchemaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured SQL for each category retrieved with a bulk query.
///
/// Serialized as a JSON object mapping keys such as `"functions"` to SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<InformationSchemaKey, String>",
    into = "BTreeMap<InformationSchemaKey, String>"
)]
pub struct InformationSchemaViews {
    queries: BTreeMap<InformationSchemaKey, Query>,
}

impl InformationSchemaViews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers SQL for a key, replacing any previous entry.
    pub fn with_sql(mut self, key: InformationSchemaKey, sql: impl Into<String>) -> crate::Result<Self> {
        self.insert(key, sql)?;
        Ok(self)
    }

    pub fn insert(&mut self, key: InformationSchemaKey, sql: impl Into<String>) -> crate::Result<()> {
        let sql = sql.into();
        if sql.trim().is_empty() {
            return Err(SchemaGraphError::configuration(format!(
                "Empty SQL registered for {}",
                key
            )));
        }
        self.queries.insert(key, Query::new(key.as_str(), sql)?);
        Ok(())
    }

    pub fn get(&self, key: InformationSchemaKey) -> Option<&Query> {
        self.queries.get(&key)
    }

    pub fn has_query(&self, key: InformationSchemaKey) -> bool {
        self.queries.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl TryFrom<BTreeMap<InformationSchemaKey, String>> for InformationSchemaViews {
    type Error = SchemaGraphError;

    fn try_from(map: BTreeMap<InformationSchemaKey, String>) -> Result<Self, Self::Error> {
        let mut views = Self::new();
        for (key, sql) in map {
            views.insert(key, sql)?;
        }
        Ok(views)
    }
}

impl From<InformationSchemaViews> for BTreeMap<InformationSchemaKey, String> {
    fn from(views: InformationSchemaViews) -> Self {
        views
            .queries
            .into_iter()
            .map(|(key, query)| (key, query.template().to_string()))
            .collect()
    }
}
