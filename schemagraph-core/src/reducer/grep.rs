//! Grep-style table selection.

use crate::Result;
use crate::config::GrepOptions;
use crate::error::SchemaGraphError;
use crate::models::Table;
use regex::Regex;

/// Selects tables having a column, or a definition, that matches a pattern.
///
/// Column patterns are matched against `<table full name>.<column>`.
/// Definition patterns are matched against table remarks, view definitions
/// and trigger statements. Both match the whole text. Without any pattern
/// every table matches.
#[derive(Debug, Clone, Default)]
pub struct TableGrepFilter {
    columns: Option<Regex>,
    definitions: Option<Regex>,
    invert_match: bool,
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>> {
    let Some(pattern) = pattern.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    // Definitions span lines
    Regex::new(&format!("(?s)^(?:{})$", pattern))
        .map(Some)
        .map_err(|e| SchemaGraphError::invalid_pattern(pattern, e))
}

impl TableGrepFilter {
    /// # Errors
    /// Returns [`SchemaGraphError::InvalidPattern`] for an invalid pattern
    pub fn new(options: &GrepOptions) -> Result<Self> {
        Ok(Self {
            columns: compile(options.grep_columns.as_deref())?,
            definitions: compile(options.grep_definitions.as_deref())?,
            invert_match: options.invert_match,
        })
    }

    pub fn is_grep(&self) -> bool {
        self.columns.is_some() || self.definitions.is_some()
    }

    pub fn test(&self, table: &Table) -> bool {
        if !self.is_grep() {
            return true;
        }

        let columns_match = self.columns.as_ref().is_some_and(|re| {
            table
                .columns()
                .iter()
                .any(|c| re.is_match(&format!("{}.{}", table.full_name, c.name)))
        });
        let definitions_match = self.definitions.as_ref().is_some_and(|re| {
            let trigger_statements = table
                .triggers()
                .iter()
                .filter_map(|t| t.action_statement.as_deref());
            table
                .remarks
                .as_deref()
                .into_iter()
                .chain(table.definition.as_deref())
                .chain(trigger_statements)
                .any(|text| re.is_match(text))
        });

        (columns_match || definitions_match) != self.invert_match
    }
}
