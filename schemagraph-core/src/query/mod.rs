//! Parameterized metadata queries.
//!
//! A [`Query`] holds SQL with `${name}` placeholders. Expansion runs in two
//! passes: object variables first (table name, column lists, table type),
//! then the context-wide [`TemplateContext`] (the schema inclusion pattern
//! and user-defined variables). A query that references `${table}` is
//! executed once per table.

mod template;
mod views;

pub use template::{TemplateVariables, expand_template, extract_template_variables, finish_template};
pub use views::{InformationSchemaKey, InformationSchemaViews};

use crate::Result;
use crate::error::SchemaGraphError;
use crate::inclusion::InclusionRule;
use crate::models::{Catalog, Column, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Context-wide template variables, resolved in the final expansion pass.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: TemplateVariables,
}

impl TemplateContext {
    /// Builds the context from the schema inclusion rule and extra variables.
    ///
    /// `${schemas}` resolves to the schema include pattern when it is not
    /// blank. Extra variables never override it.
    pub fn new(schema_rule: Option<&InclusionRule>, extra: &BTreeMap<String, String>) -> Self {
        let mut variables: TemplateVariables = extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(rule) = schema_rule
            && !rule.include_pattern().is_empty()
        {
            variables.insert("schemas".to_string(), rule.include_pattern().to_string());
        }
        Self { variables }
    }

    pub fn variables(&self) -> &TemplateVariables {
        &self.variables
    }
}

/// Named SQL template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    name: String,
    sql: String,
}

impl Query {
    /// Creates a query. A blank `sql` with a non-blank `name` uses the name
    /// as the SQL text.
    ///
    /// # Errors
    /// Returns a configuration error when both are blank.
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let sql = sql.into();
        match (name.trim().is_empty(), sql.trim().is_empty()) {
            (false, false) => Ok(Self { name, sql }),
            (false, true) => Ok(Self {
                sql: name.clone(),
                name,
            }),
            (true, _) => Err(SchemaGraphError::configuration("No SQL found for query")),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unexpanded template.
    pub fn template(&self) -> &str {
        &self.sql
    }

    /// True if the query must run once for each table.
    pub fn is_per_table(&self) -> bool {
        extract_template_variables(&self.sql).contains("table")
    }

    /// SQL ready to execute once for the whole crawl.
    pub fn sql_for_schemas(&self, context: &TemplateContext) -> String {
        finish_template(&self.sql, context.variables())
    }

    /// SQL ready to execute for one table.
    ///
    /// Columns are listed in ordinal order, or by name when `alphabetical`
    /// is set. `${orderbycolumns}` leaves out large-object columns.
    pub fn sql_for_table(
        &self,
        table: &Table,
        catalog: &Catalog,
        alphabetical: bool,
        context: &TemplateContext,
    ) -> String {
        let mut columns: Vec<&Column> = table.columns().iter().collect();
        if alphabetical {
            columns.sort_by(|a, b| a.name.cmp(&b.name));
        } else {
            columns.sort_by_key(|c| c.ordinal_position);
        }

        let mut variables = TemplateVariables::new();
        let schema = &catalog.schema(table.schema).full_name;
        if !schema.is_empty() {
            variables.insert("schema".to_string(), schema.clone());
        }
        variables.insert("table".to_string(), table.full_name.clone());
        variables.insert("tablename".to_string(), table.name.clone());
        variables.insert("columns".to_string(), column_list(&columns, false));
        variables.insert("orderbycolumns".to_string(), column_list(&columns, true));
        variables.insert("tabletype".to_string(), table.table_type.clone());

        let sql = expand_template(&self.sql, &variables);
        finish_template(&sql, context.variables())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.sql)
    }
}

/// Comma separated column names, optionally without large objects.
pub fn column_list(columns: &[&Column], omit_large_objects: bool) -> String {
    columns
        .iter()
        .filter(|c| !(omit_large_objects && c.data_type.large_object))
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
