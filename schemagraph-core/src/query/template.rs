//! `${name}` placeholder substitution.
//!
//! Templating is plain text substitution. Nothing here validates SQL.

use std::collections::{BTreeSet, HashMap};

const OPEN: &str = "${";
const CLOSE: char = '}';

/// Variables available to a template expansion.
pub type TemplateVariables = HashMap<String, String>;

fn substitute(template: &str, mut resolve: impl FnMut(&str) -> Option<String>) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        expanded.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            // Unterminated placeholder, keep the remainder as written
            expanded.push_str(&rest[start..]);
            return expanded;
        };

        let key = &after_open[..end];
        match resolve(key) {
            Some(value) => expanded.push_str(&value),
            None => expanded.push_str(&rest[start..start + OPEN.len() + end + 1]),
        }
        rest = &after_open[end + 1..];
    }

    expanded.push_str(rest);
    expanded
}

/// Replaces every `${name}` with its value from `variables`.
///
/// Placeholders without a value are left in place so that a later pass can
/// resolve them.
pub fn expand_template(template: &str, variables: &TemplateVariables) -> String {
    substitute(template, |key| variables.get(key.trim()).cloned())
}

/// Final expansion pass. Placeholders still unresolved after consulting
/// `variables` become empty strings.
pub fn finish_template(template: &str, variables: &TemplateVariables) -> String {
    substitute(template, |key| {
        Some(variables.get(key.trim()).cloned().unwrap_or_default())
    })
}

/// Names of all placeholders referenced by a template.
pub fn extract_template_variables(template: &str) -> BTreeSet<String> {
    let mut variables = BTreeSet::new();
    substitute(template, |key| {
        variables.insert(key.trim().to_string());
        None
    });
    variables
}
