//! Singularization of table names.
//!
//! The `inflector` crate handles regular English plurals; the irregular
//! plurals that show up in schemas are resolved from a table first.

use inflector::Inflector;

/// Irregular plurals the `inflector` crate gets wrong for table names.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("calf", "calves"),
    ("potato", "potatoes"),
    ("hero", "heroes"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("diagnosis", "diagnoses"),
    ("thesis", "theses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("appendix", "appendices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Singular form of `word`.
///
/// Irregular plurals are matched case-insensitively against the last
/// `_`-separated segment, so `app_people` becomes `app_person`.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let (head, last) = match word.rfind('_') {
        Some(at) => word.split_at(at.saturating_add(1)),
        None => ("", word),
    };
    let lower = last.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return format!("{}{}", head, singular);
        }
    }

    word.to_singular()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singularize_regular() {
        assert_eq!(singularize("customers"), "customer");
        assert_eq!(singularize("orders"), "order");
        assert_eq!(singularize("products"), "product");
        assert_eq!(singularize("user"), "user");
    }

    #[test]
    fn test_singularize_y_ending() {
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("companies"), "company");
    }

    #[test]
    fn test_singularize_irregular() {
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("children"), "child");
        assert_eq!(singularize("analyses"), "analysis");
        assert_eq!(singularize("person"), "person");
    }

    #[test]
    fn test_singularize_irregular_last_segment() {
        assert_eq!(singularize("app_people"), "app_person");
        assert_eq!(singularize("order_children"), "order_child");
    }

    #[test]
    fn test_singularize_empty() {
        assert_eq!(singularize(""), "");
    }
}
