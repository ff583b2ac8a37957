use super::inflection::singularize;
use crate::config::MatchKeyOptions;
use crate::models::{Table, TableId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Normalized names under which a table may be joined to others.
///
/// Module-style name prefixes shared by several tables (`app_`, `crm_sales_`)
/// are discovered from the table names themselves. Each table gets one key
/// per prefix its name starts with: the rest of the lower-cased name,
/// singularized. The empty prefix always applies, so every table with a
/// non-blank name has at least one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableMatchKeys {
    prefixes: Vec<String>,
    keys: BTreeMap<TableId, Vec<String>>,
}

impl TableMatchKeys {
    /// Builds keys for `tables`.
    ///
    /// A table holds each key once, at the position of the first prefix
    /// producing it, so its keys can be compared as a set or in order.
    pub fn build(tables: &[&Table], options: &MatchKeyOptions) -> Self {
        if tables.is_empty() {
            return Self::default();
        }

        let prefixes = find_prefixes(tables, options);
        let mut keys: BTreeMap<TableId, Vec<String>> = BTreeMap::new();
        for table in tables {
            let name = table.name.to_lowercase();
            for prefix in &prefixes {
                let Some(rest) = name.strip_prefix(prefix.as_str()) else {
                    continue;
                };
                let key = singularize(rest);
                if key.trim().is_empty() {
                    continue;
                }
                let table_keys = keys.entry(table.id).or_default();
                if !table_keys.contains(&key) {
                    table_keys.push(key);
                }
            }
        }

        tracing::debug!("Table prefixes: {:?}", prefixes);
        tracing::debug!("Built match keys for {} tables", keys.len());
        Self { prefixes, keys }
    }

    /// Keys of a table, in prefix selection order.
    pub fn get(&self, table: TableId) -> &[String] {
        self.keys.get(&table).map_or(&[], Vec::as_slice)
    }

    /// Selected prefixes; the empty prefix is always last.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableId, &[String])> {
        self.keys.iter().map(|(id, keys)| (*id, keys.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Longest common leading substring of two names.
fn common_prefix<'a>(first: &'a str, second: &str) -> &'a str {
    let end = first
        .char_indices()
        .zip(second.chars())
        .take_while(|((_, a), b)| a == b)
        .last()
        .map_or(0, |((at, c), _)| at + c.len_utf8());
    &first[..end]
}

/// The shared prefix itself plus every shorter prefix made of its leading
/// `_`-terminated segments.
fn candidate_prefixes(shared: &str) -> Vec<String> {
    let mut segments: Vec<&str> = shared.split('_').collect();
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    let mut candidates: Vec<String> = (0..segments.len())
        .map(|count| {
            segments[..count]
                .iter()
                .map(|segment| format!("{}_", segment))
                .collect::<String>()
        })
        .filter(|prefix| !prefix.is_empty())
        .collect();
    candidates.push(shared.to_string());
    candidates
}

#[allow(clippy::cast_precision_loss)]
fn find_prefixes(tables: &[&Table], options: &MatchKeyOptions) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for (i, first) in tables.iter().enumerate() {
        for second in &tables[i + 1..] {
            let shared = common_prefix(&first.name, &second.name);
            if shared.trim().is_empty() || !shared.ends_with('_') {
                continue;
            }
            for candidate in candidate_prefixes(shared) {
                *counts.entry(candidate).or_insert(0) += 1;
            }
        }
    }

    // Keep only the shortest prefix of each family
    let mut by_length: Vec<String> = counts.keys().cloned().collect();
    by_length.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| b.cmp(a)));
    for (i, longer) in by_length.iter().enumerate() {
        if by_length[i + 1..]
            .iter()
            .any(|shorter| longer.starts_with(shorter.as_str()))
        {
            counts.remove(longer);
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by_key(|(_, count)| *count);
    let share = ranked.len() as f64 * options.prefix_share_threshold;

    let mut prefixes: Vec<String> = ranked
        .into_iter()
        .enumerate()
        .filter(|(i, (_, count))| *i < options.max_prefixes || *count as f64 > share)
        .map(|(_, (prefix, _))| prefix)
        .collect();
    prefixes.push(String::new());
    prefixes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Catalog;

    fn catalog_of(names: &[&str]) -> Catalog {
        let mut catalog = Catalog::new("test");
        let schema = catalog.add_schema(None, Some("public"));
        for name in names {
            catalog.add_table(schema, name, "TABLE");
        }
        catalog
    }

    fn keys_by_name(catalog: &Catalog, names: &[&str]) -> BTreeMap<String, Vec<String>> {
        let tables: Vec<&Table> = names
            .iter()
            .filter_map(|name| catalog.tables().find(|t| t.name == *name))
            .collect();
        let match_keys = TableMatchKeys::build(&tables, &MatchKeyOptions::default());
        tables
            .iter()
            .map(|t| (t.name.clone(), match_keys.get(t.id).to_vec()))
            .collect()
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix("app_user", "app_role"), "app_");
        assert_eq!(common_prefix("app_role", "app_role_user"), "app_role");
        assert_eq!(common_prefix("orders", "users"), "");
    }

    #[test]
    fn test_candidate_prefixes() {
        assert_eq!(candidate_prefixes("app_"), ["app_"]);
        assert_eq!(
            candidate_prefixes("crm_sales_"),
            ["crm_", "crm_sales_"]
        );
    }

    #[test]
    fn test_module_prefix_is_stripped() {
        let names = ["app_user", "app_role", "app_role_user"];
        let catalog = catalog_of(&names);
        let keys = keys_by_name(&catalog, &names);

        assert_eq!(keys["app_user"], ["user", "app_user"]);
        assert_eq!(keys["app_role"], ["role", "app_role"]);
        assert_eq!(keys["app_role_user"], ["role_user", "app_role_user"]);
    }

    #[test]
    fn test_shortest_prefix_of_a_family_survives() {
        let names = ["crm_sales_order", "crm_sales_invoice", "crm_contact"];
        let catalog = catalog_of(&names);
        let tables: Vec<&Table> = catalog.tables().collect();

        let match_keys = TableMatchKeys::build(&tables, &MatchKeyOptions::default());

        assert_eq!(match_keys.prefixes(), ["crm_", ""]);
        let keys = keys_by_name(&catalog, &names);
        assert_eq!(keys["crm_sales_order"], ["sales_order", "crm_sales_order"]);
    }

    #[test]
    fn test_selection_keeps_least_used_and_dominant_prefixes() {
        let names = [
            "a_cat", "a_dog", "b_cat", "b_dog", "c_cat", "c_dog", "d_cat", "d_dog", "e_cat",
            "e_dog", "f_cat", "f_dog", "g_red", "g_green", "g_blue", "g_black", "g_white",
        ];
        let catalog = catalog_of(&names);
        let tables: Vec<&Table> = catalog.tables().collect();

        let match_keys = TableMatchKeys::build(&tables, &MatchKeyOptions::default());

        // Six prefixes used once are ranked ahead of g_ (nine pairs); only the
        // first five fit, and g_ is kept for exceeding half of seven.
        assert_eq!(
            match_keys.prefixes(),
            ["a_", "b_", "c_", "d_", "e_", "g_", ""]
        );
        let keys = keys_by_name(&catalog, &names);
        assert_eq!(keys["f_cat"], ["f_cat"]);
        assert_eq!(keys["g_red"], ["red", "g_red"]);
    }

    #[test]
    fn test_plural_names_are_singularized() {
        let names = ["shop_orders", "shop_categories", "people"];
        let catalog = catalog_of(&names);
        let keys = keys_by_name(&catalog, &names);

        assert_eq!(keys["shop_orders"], ["order", "shop_order"]);
        assert_eq!(keys["shop_categories"], ["category", "shop_category"]);
        assert_eq!(keys["people"], ["person"]);
    }

    #[test]
    fn test_keys_are_unique_per_table() {
        let names = [
            "crm_sales_orders",
            "crm_sales_people",
            "crm_accounts",
            "crm_contacts",
            "web_users",
            "web_sessions",
        ];
        let catalog = catalog_of(&names);
        let keys = keys_by_name(&catalog, &names);

        assert_eq!(keys["crm_sales_people"], ["sales_person", "crm_sales_person"]);
        assert_eq!(keys["web_users"], ["user", "web_user"]);
        for (name, table_keys) in &keys {
            let unique: std::collections::BTreeSet<&String> = table_keys.iter().collect();
            assert_eq!(unique.len(), table_keys.len(), "duplicate keys for {}", name);
        }
    }

    #[test]
    fn test_single_table_gets_unprefixed_key() {
        let catalog = catalog_of(&["app_user"]);
        let tables: Vec<&Table> = catalog.tables().collect();
        let match_keys = TableMatchKeys::build(&tables, &MatchKeyOptions::default());
        assert_eq!(match_keys.prefixes(), [""]);
        assert_eq!(match_keys.get(tables[0].id), ["app_user"]);
    }

    #[test]
    fn test_no_tables() {
        let match_keys = TableMatchKeys::build(&[], &MatchKeyOptions::default());
        assert!(match_keys.is_empty());
        assert!(match_keys.prefixes().is_empty());
    }

    #[test]
    fn test_keys_do_not_depend_on_table_order() {
        let names = ["app_user", "app_role", "app_role_user", "crm_contact", "crm_lead"];
        let catalog = catalog_of(&names);
        let forward: Vec<&Table> = catalog.tables().collect();
        let backward: Vec<&Table> = forward.iter().rev().copied().collect();

        let first = TableMatchKeys::build(&forward, &MatchKeyOptions::default());
        let second = TableMatchKeys::build(&backward, &MatchKeyOptions::default());

        assert_eq!(first, second);
    }
}
