//! Top-level crawl options.

use super::{FilterOptions, GrepOptions, LimitOptions, RetrievalStrategies};
use crate::Result;
use crate::error::SchemaGraphError;
use crate::query::InformationSchemaViews;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Thresholds for selecting table-name prefixes during match key inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchKeyOptions {
    /// Prefixes always selected, in ascending order of pair count
    pub max_prefixes: usize,
    /// Further prefixes are selected when their pair count exceeds this share
    /// of the candidate count
    pub prefix_share_threshold: f64,
}

impl Default for MatchKeyOptions {
    fn default() -> Self {
        Self {
            max_prefixes: 5,
            prefix_share_threshold: 0.5,
        }
    }
}

impl MatchKeyOptions {
    /// # Errors
    /// Returns error if the threshold is not a finite value in `0.0..=1.0`
    pub fn validate(&self) -> Result<()> {
        if !self.prefix_share_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.prefix_share_threshold)
        {
            return Err(SchemaGraphError::configuration(
                "prefix_share_threshold must be between 0.0 and 1.0",
            ));
        }
        Ok(())
    }
}

/// Options controlling one crawl.
///
/// # Example
/// ```rust
/// use schemagraph_core::config::{CrawlOptions, FilterOptions};
///
/// let options = CrawlOptions::new()
///     .with_filter(FilterOptions::new().with_parent_depth(1))
///     .with_row_counts(false);
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlOptions {
    pub limit: LimitOptions,
    pub filter: FilterOptions,
    pub grep: GrepOptions,
    pub retrieval: RetrievalStrategies,
    /// SQL for categories retrieved with a bulk query
    pub information_schema_views: InformationSchemaViews,
    pub match_keys: MatchKeyOptions,
    /// Extra variables available to every query template
    pub template_variables: BTreeMap<String, String>,
    /// Expand column lists in name order instead of ordinal order
    pub alphabetical_column_sort: bool,
    /// Count rows of retained tables with the `table_row_counts` query
    pub load_row_counts: bool,
    /// Build match keys for weak-association inference
    pub infer_weak_associations: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            limit: LimitOptions::default(),
            filter: FilterOptions::default(),
            grep: GrepOptions::default(),
            retrieval: RetrievalStrategies::default(),
            information_schema_views: InformationSchemaViews::default(),
            match_keys: MatchKeyOptions::default(),
            template_variables: BTreeMap::new(),
            alphabetical_column_sort: false,
            load_row_counts: false,
            infer_weak_associations: true,
        }
    }
}

impl CrawlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a JSON file and validates them.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid JSON, or holds
    /// invalid options
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SchemaGraphError::Io {
            context: format!("Failed to read configuration {}", path.display()),
            source,
        })?;
        let options: Self =
            serde_json::from_str(&contents).map_err(|source| SchemaGraphError::Serialization {
                context: format!("Invalid configuration {}", path.display()),
                source,
            })?;
        options.validate()?;
        Ok(options)
    }

    /// Validates the options, compiling every pattern once.
    ///
    /// # Errors
    /// Returns error if a pattern is invalid or a threshold is out of range
    pub fn validate(&self) -> Result<()> {
        self.limit.compile()?;
        for pattern in [&self.grep.grep_columns, &self.grep.grep_definitions]
            .into_iter()
            .flatten()
        {
            Regex::new(pattern).map_err(|e| SchemaGraphError::invalid_pattern(pattern, e))?;
        }
        self.match_keys.validate()?;
        Ok(())
    }

    /// Builder method to set the inclusion rule patterns.
    pub fn with_limit(mut self, limit: LimitOptions) -> Self {
        self.limit = limit;
        self
    }

    /// Builder method to set the reduction depths.
    pub fn with_filter(mut self, filter: FilterOptions) -> Self {
        self.filter = filter;
        self
    }

    /// Builder method to set the grep options.
    pub fn with_grep(mut self, grep: GrepOptions) -> Self {
        self.grep = grep;
        self
    }

    /// Builder method to set the retrieval strategies.
    pub fn with_retrieval(mut self, retrieval: RetrievalStrategies) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Builder method to set the bulk-retrieval SQL.
    pub fn with_information_schema_views(mut self, views: InformationSchemaViews) -> Self {
        self.information_schema_views = views;
        self
    }

    pub fn with_match_keys(mut self, match_keys: MatchKeyOptions) -> Self {
        self.match_keys = match_keys;
        self
    }

    /// Builder method to add a template variable.
    pub fn with_template_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.template_variables.insert(name.into(), value.into());
        self
    }

    pub fn with_alphabetical_column_sort(mut self, alphabetical: bool) -> Self {
        self.alphabetical_column_sort = alphabetical;
        self
    }

    pub fn with_row_counts(mut self, enabled: bool) -> Self {
        self.load_row_counts = enabled;
        self
    }

    pub fn with_weak_associations(mut self, enabled: bool) -> Self {
        self.infer_weak_associations = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MetadataCategory, RetrievalStrategy};
    use crate::inclusion::RulePatterns;
    use crate::query::InformationSchemaKey;
    use std::io::Write;

    #[test]
    fn test_crawl_options_default() {
        let options = CrawlOptions::default();
        assert_eq!(options.filter, FilterOptions::default());
        assert!(!options.load_row_counts);
        assert!(options.infer_weak_associations);
        assert_eq!(options.match_keys.max_prefixes, 5);
        assert!(options.information_schema_views.is_empty());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_patterns() {
        let options = CrawlOptions::new().with_grep(GrepOptions::new().with_grep_columns("("));
        assert!(options.validate().is_err());

        let options = CrawlOptions::new()
            .with_limit(LimitOptions::new().with_schemas(RulePatterns::new("public", "(")));
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_threshold() {
        let options = CrawlOptions::new().with_match_keys(MatchKeyOptions {
            max_prefixes: 5,
            prefix_share_threshold: 1.5,
        });
        assert!(options.validate().is_err());

        let options = CrawlOptions::new().with_match_keys(MatchKeyOptions {
            max_prefixes: 5,
            prefix_share_threshold: f64::NAN,
        });
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{
                "limit": {{ "tables": {{ "include": "main\\.order.*" }} }},
                "filter": {{ "parent_table_filter_depth": 1 }},
                "retrieval": {{ "functions": "bulk_query" }},
                "information_schema_views": {{ "functions": "SELECT * FROM f" }},
                "template_variables": {{ "owner": "APP" }},
                "load_row_counts": true
            }}"#
        )
        .expect("write config");

        let options = CrawlOptions::from_json_file(file.path()).expect("load config");
        assert_eq!(options.limit.tables.include, "main\\.order.*");
        assert_eq!(options.limit.tables.exclude, "");
        assert_eq!(options.filter.parent_table_filter_depth, 1);
        assert_eq!(
            options.retrieval.strategy(MetadataCategory::Functions),
            RetrievalStrategy::BulkQuery
        );
        assert!(
            options
                .information_schema_views
                .has_query(InformationSchemaKey::Functions)
        );
        assert_eq!(options.template_variables["owner"], "APP");
        assert!(options.load_row_counts);
    }

    #[test]
    fn test_from_json_file_errors() {
        let missing = CrawlOptions::from_json_file("/nonexistent/schemagraph.json");
        assert!(matches!(missing, Err(SchemaGraphError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{ not json").expect("write config");
        let invalid = CrawlOptions::from_json_file(file.path());
        assert!(matches!(invalid, Err(SchemaGraphError::Serialization { .. })));
    }
}
