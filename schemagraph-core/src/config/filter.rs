//! Table reduction settings.

use serde::{Deserialize, Serialize};

/// Depths of foreign-key expansion around the tables selected by the
/// inclusion rule. Zero means no expansion in that direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Hops along tables referencing a selected table
    pub child_table_filter_depth: u32,
    /// Hops along tables referenced by a selected table
    pub parent_table_filter_depth: u32,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the child expansion depth.
    pub fn with_child_depth(mut self, depth: u32) -> Self {
        self.child_table_filter_depth = depth;
        self
    }

    /// Builder method to set the parent expansion depth.
    pub fn with_parent_depth(mut self, depth: u32) -> Self {
        self.parent_table_filter_depth = depth;
        self
    }
}

/// Grep-style selection of tables by column names or definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrepOptions {
    /// Pattern matched against `table.column` full names
    pub grep_columns: Option<String>,
    /// Pattern matched against table remarks and definitions
    pub grep_definitions: Option<String>,
    /// Select tables that do not match instead
    pub invert_match: bool,
    /// Tables left out by reduction are also flagged as not matching
    pub grep_only_matching: bool,
}

impl GrepOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when any grep pattern is configured.
    pub fn is_grep(&self) -> bool {
        self.grep_columns.as_deref().is_some_and(|p| !p.trim().is_empty())
            || self
                .grep_definitions
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty())
    }

    /// Builder method to set the column pattern.
    pub fn with_grep_columns(mut self, pattern: impl Into<String>) -> Self {
        self.grep_columns = Some(pattern.into());
        self
    }

    /// Builder method to set the definition pattern.
    pub fn with_grep_definitions(mut self, pattern: impl Into<String>) -> Self {
        self.grep_definitions = Some(pattern.into());
        self
    }

    pub fn with_invert_match(mut self, invert: bool) -> Self {
        self.invert_match = invert;
        self
    }

    pub fn with_grep_only_matching(mut self, only_matching: bool) -> Self {
        self.grep_only_matching = only_matching;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_options_default() {
        let options = FilterOptions::default();
        assert_eq!(options.child_table_filter_depth, 0);
        assert_eq!(options.parent_table_filter_depth, 0);

        let options = FilterOptions::new().with_child_depth(2).with_parent_depth(1);
        assert_eq!(options.child_table_filter_depth, 2);
        assert_eq!(options.parent_table_filter_depth, 1);
    }

    #[test]
    fn test_grep_options_is_grep() {
        assert!(!GrepOptions::default().is_grep());
        assert!(!GrepOptions::new().with_grep_columns(" ").is_grep());
        assert!(GrepOptions::new().with_grep_columns(".*\\.email").is_grep());
        assert!(GrepOptions::new().with_grep_definitions("audit").is_grep());
    }
}
