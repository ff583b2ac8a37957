//! Inclusion rule patterns per object category.

use crate::Result;
use crate::inclusion::{InclusionRule, RulePatterns};
use serde::{Deserialize, Serialize};

/// Include/exclude patterns limiting what a crawl retains.
///
/// Patterns are matched against fully qualified names. Schemas are matched
/// on `catalog.schema`, tables and routines on `schema.name`, and triggers on
/// `schema.table.trigger`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitOptions {
    pub schemas: RulePatterns,
    pub tables: RulePatterns,
    pub routines: RulePatterns,
    pub triggers: RulePatterns,
    /// Table types to retrieve, such as `TABLE` or `VIEW`; all when absent
    pub table_types: Option<Vec<String>>,
}

impl Default for LimitOptions {
    fn default() -> Self {
        Self {
            schemas: RulePatterns::include_all(),
            tables: RulePatterns::include_all(),
            routines: RulePatterns::include_all(),
            triggers: RulePatterns::include_all(),
            table_types: None,
        }
    }
}

/// Compiled form of [`LimitOptions`].
#[derive(Debug, Clone)]
pub struct LimitRules {
    pub schemas: InclusionRule,
    pub tables: InclusionRule,
    pub routines: InclusionRule,
    pub triggers: InclusionRule,
    pub table_types: Option<Vec<String>>,
}

impl LimitRules {
    /// Tests a table type against the configured list, ignoring case.
    pub fn accepts_table_type(&self, table_type: &str) -> bool {
        self.table_types.as_ref().is_none_or(|types| {
            types
                .iter()
                .any(|t| t.trim().eq_ignore_ascii_case(table_type.trim()))
        })
    }
}

impl LimitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every pattern.
    ///
    /// # Errors
    /// Returns the first invalid pattern found.
    pub fn compile(&self) -> Result<LimitRules> {
        Ok(LimitRules {
            schemas: self.schemas.compile()?,
            tables: self.tables.compile()?,
            routines: self.routines.compile()?,
            triggers: self.triggers.compile()?,
            table_types: self.table_types.clone(),
        })
    }

    /// Builder method to set the schema patterns.
    pub fn with_schemas(mut self, patterns: RulePatterns) -> Self {
        self.schemas = patterns;
        self
    }

    /// Builder method to set the table patterns.
    pub fn with_tables(mut self, patterns: RulePatterns) -> Self {
        self.tables = patterns;
        self
    }

    /// Builder method to set the routine patterns.
    pub fn with_routines(mut self, patterns: RulePatterns) -> Self {
        self.routines = patterns;
        self
    }

    /// Builder method to set the trigger patterns.
    pub fn with_triggers(mut self, patterns: RulePatterns) -> Self {
        self.triggers = patterns;
        self
    }

    /// Builder method to restrict the table types.
    pub fn with_table_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table_types = Some(types.into_iter().map(Into::into).collect());
        self
    }
}
