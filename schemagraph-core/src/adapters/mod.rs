//! Metadata sources the crawler reads from.
//!
//! A [`MetadataSource`] answers two kinds of requests: per-schema
//! introspection calls for one [`MetadataCategory`], and execution of
//! configured SQL. Both return [`MetadataRow`]s with named fields, so the
//! retrievers convert rows the same way whichever strategy produced them.
//!
//! # Module Structure
//! - `memory`: replays preloaded rows, used for snapshots and tests
//! - `sqlite`: sqlx-backed source for SQLite databases (feature `sqlite`)

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use crate::config::MetadataCategory;
pub use memory::{InMemoryMetadataSource, MetadataSnapshot, SourceCall};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteMetadataSource;

use crate::Result;
use crate::models::Schema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One record returned by a metadata source.
///
/// Field names are case-insensitive; they are stored upper-cased. Values are
/// kept as optional strings, matching how drivers report introspection
/// results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<String, Option<String>>"
)]
pub struct MetadataRow {
    fields: BTreeMap<String, Option<String>>,
}

impl MetadataRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a field.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, Some(value.into()));
        self
    }

    /// Builder method to add a null field.
    pub fn with_null(mut self, name: &str) -> Self {
        self.insert(name, None);
        self
    }

    pub fn insert(&mut self, name: &str, value: Option<String>) {
        self.fields.insert(name.trim().to_uppercase(), value);
    }

    /// Raw field value; `None` for null or absent fields.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_uppercase())
            .and_then(|v| v.as_deref())
    }

    /// Trimmed field value; `None` when null, absent or blank.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.string(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Field value parsed as an integer.
    pub fn i64(&self, name: &str) -> Option<i64> {
        let value = self.non_blank(name)?;
        value
            .parse::<i64>()
            .ok()
            .or_else(|| value.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i64))
    }

    /// Non-null fields other than `consumed`, for a routine's attribute bag.
    pub fn attributes(&self, consumed: &[&str]) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(name, _)| !consumed.iter().any(|c| c.eq_ignore_ascii_case(name)))
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.clone(), v.clone())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The only value of a single-field row.
    pub fn single_value(&self) -> Option<&str> {
        match self.fields.values().collect::<Vec<_>>().as_slice() {
            [value] => value.as_deref(),
            _ => None,
        }
    }
}

impl From<BTreeMap<String, serde_json::Value>> for MetadataRow {
    fn from(map: BTreeMap<String, serde_json::Value>) -> Self {
        let mut row = Self::new();
        for (name, value) in map {
            let value = match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            };
            row.insert(&name, value);
        }
        row
    }
}

impl From<MetadataRow> for BTreeMap<String, Option<String>> {
    fn from(row: MetadataRow) -> Self {
        row.fields
    }
}

/// Result of a per-schema introspection call.
///
/// `Unsupported` is a capability gap of the source for one schema; the
/// retriever skips that schema and carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaRows {
    Rows(Vec<MetadataRow>),
    Unsupported { feature: String },
}

impl SchemaRows {
    pub fn unsupported(category: MetadataCategory) -> Self {
        Self::Unsupported {
            feature: category.to_string(),
        }
    }
}

/// Introspection and query execution against one database.
///
/// Row field names follow the JDBC `DatabaseMetaData` conventions for each
/// category, e.g. `TABLE_SCHEM`/`TABLE_NAME` for tables and
/// `FUNCTION_SCHEM`/`FUNCTION_NAME`/`SPECIFIC_NAME` for functions.
///
/// # Object Safety
/// This trait is object-safe, allowing for dynamic dispatch through
/// `&dyn MetadataSource` or `Box<dyn MetadataSource>`.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Database product name recorded in the catalog.
    fn product_name(&self) -> &str;

    /// Schemas visible to the source, as `TABLE_CATALOG`/`TABLE_SCHEM` rows.
    ///
    /// # Errors
    /// Returns error if the source cannot be read
    async fn schemas(&self) -> Result<Vec<MetadataRow>>;

    /// Objects of one category in one schema.
    ///
    /// # Errors
    /// Returns error on source failures. A category the source cannot
    /// introspect is reported as [`SchemaRows::Unsupported`] instead.
    async fn schema_metadata(
        &self,
        category: MetadataCategory,
        schema: &Schema,
    ) -> Result<SchemaRows>;

    /// Executes an expanded SQL statement.
    ///
    /// # Errors
    /// Returns error if the statement fails
    async fn execute_query(&self, sql: &str) -> Result<Vec<MetadataRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_case_insensitive() {
        let row = MetadataRow::new()
            .with("function_name", "area")
            .with("Function_Type", "1");
        assert_eq!(row.string("FUNCTION_NAME"), Some("area"));
        assert_eq!(row.string("function_type"), Some("1"));
        assert_eq!(row.i64("FUNCTION_TYPE"), Some(1));
    }

    #[test]
    fn test_blank_and_null_values() {
        let row = MetadataRow::new()
            .with("TABLE_NAME", "  ")
            .with_null("REMARKS");
        assert_eq!(row.string("TABLE_NAME"), Some("  "));
        assert_eq!(row.non_blank("TABLE_NAME"), None);
        assert_eq!(row.string("REMARKS"), None);
        assert_eq!(row.string("MISSING"), None);
        assert_eq!(row.i64("REMARKS"), None);
    }

    #[test]
    fn test_attributes_skip_consumed_and_null() {
        let row = MetadataRow::new()
            .with("FUNCTION_NAME", "area")
            .with("SPECIFIC_NAME", "area_1")
            .with("LANGUAGE", "SQL")
            .with_null("OWNER");
        let attributes = row.attributes(&["function_name", "SPECIFIC_NAME"]);
        assert_eq!(
            attributes,
            BTreeMap::from([("LANGUAGE".to_string(), "SQL".to_string())])
        );
    }

    #[test]
    fn test_row_deserializes_mixed_values() {
        let row: MetadataRow =
            serde_json::from_str(r#"{"table_name": "orders", "ordinal_position": 2, "remarks": null}"#)
                .expect("deserialize row");
        assert_eq!(row.string("TABLE_NAME"), Some("orders"));
        assert_eq!(row.i64("ORDINAL_POSITION"), Some(2));
        assert_eq!(row.string("REMARKS"), None);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_single_value() {
        let row = MetadataRow::new().with("COUNT(*)", "42");
        assert_eq!(row.single_value(), Some("42"));
        assert_eq!(row.i64("count(*)"), Some(42));

        let row = row.with("OTHER", "1");
        assert_eq!(row.single_value(), None);
    }
}
