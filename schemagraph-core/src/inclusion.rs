//! Include/exclude rules over fully qualified object names.
//!
//! A rule is a pair of regular expressions. A name passes when it matches
//! the include pattern as a whole and does not match the exclude pattern.
//! Exclusion always wins. A blank include pattern matches nothing, which
//! callers use to skip retrieval for a category altogether.

use crate::Result;
use crate::error::SchemaGraphError;
use crate::models::{NewRoutine, Routine, Schema, Table, Trigger};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Anything that can be tested by an inclusion rule.
pub trait NamedObject {
    /// Fully qualified name, such as `catalog.schema.name`.
    fn full_name(&self) -> &str;
}

impl NamedObject for Table {
    fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl NamedObject for Routine {
    fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl NamedObject for NewRoutine {
    fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl NamedObject for Schema {
    fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl NamedObject for Trigger {
    fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl NamedObject for str {
    fn full_name(&self) -> &str {
        self
    }
}

impl NamedObject for String {
    fn full_name(&self) -> &str {
        self
    }
}

/// Include/exclude pattern strings, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulePatterns {
    pub include: String,
    pub exclude: String,
}

impl Default for RulePatterns {
    fn default() -> Self {
        Self::include_all()
    }
}

impl RulePatterns {
    pub fn new(include: impl Into<String>, exclude: impl Into<String>) -> Self {
        Self {
            include: include.into(),
            exclude: exclude.into(),
        }
    }

    pub fn include_all() -> Self {
        Self::new(".*", "")
    }

    pub fn exclude_all() -> Self {
        Self::new("", "")
    }

    /// Compiles the patterns into a rule.
    pub fn compile(&self) -> Result<InclusionRule> {
        InclusionRule::new(&self.include, &self.exclude)
    }
}

/// Compiled include/exclude rule.
#[derive(Debug, Clone)]
pub struct InclusionRule {
    include_pattern: String,
    include: Option<Regex>,
    exclude: Option<Regex>,
}

fn compile_whole_match(pattern: &str) -> Result<Option<Regex>> {
    if pattern.trim().is_empty() {
        return Ok(None);
    }
    Regex::new(&format!("^(?:{})$", pattern))
        .map(Some)
        .map_err(|e| SchemaGraphError::invalid_pattern(pattern, e))
}

impl InclusionRule {
    /// Compiles a rule from include and exclude patterns.
    ///
    /// # Errors
    /// Returns [`SchemaGraphError::InvalidPattern`] if either pattern is not a
    /// valid regular expression.
    pub fn new(include: &str, exclude: &str) -> Result<Self> {
        Ok(Self {
            include_pattern: include.trim().to_string(),
            include: compile_whole_match(include)?,
            exclude: compile_whole_match(exclude)?,
        })
    }

    /// Rule that accepts every name.
    pub fn include_all() -> Self {
        Self {
            include_pattern: ".*".to_string(),
            include: Regex::new("^(?:.*)$").ok(),
            exclude: None,
        }
    }

    /// Rule that accepts nothing.
    pub fn exclude_all() -> Self {
        Self {
            include_pattern: String::new(),
            include: None,
            exclude: None,
        }
    }

    /// Tests a fully qualified name.
    pub fn test(&self, name: &str) -> bool {
        let included = self.include.as_ref().is_some_and(|re| re.is_match(name));
        let excluded = self.exclude.as_ref().is_some_and(|re| re.is_match(name));
        included && !excluded
    }

    /// True when no name can ever pass.
    pub fn is_exclude_all(&self) -> bool {
        self.include.is_none()
    }

    /// The include pattern as written, blank for exclude-all rules.
    pub fn include_pattern(&self) -> &str {
        &self.include_pattern
    }
}

impl Default for InclusionRule {
    fn default() -> Self {
        Self::include_all()
    }
}

/// Typed predicate over named objects built from an optional rule.
///
/// A filter without a rule accepts everything.
#[derive(Debug, Clone)]
pub struct InclusionRuleFilter<T: ?Sized> {
    rule: Option<InclusionRule>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: NamedObject + ?Sized> InclusionRuleFilter<T> {
    pub fn new(rule: Option<InclusionRule>) -> Self {
        Self {
            rule,
            _marker: PhantomData,
        }
    }

    pub fn test(&self, object: &T) -> bool {
        self.rule
            .as_ref()
            .is_none_or(|rule| rule.test(object.full_name()))
    }

    pub fn is_exclude_all(&self) -> bool {
        self.rule.as_ref().is_some_and(InclusionRule::is_exclude_all)
    }
}
