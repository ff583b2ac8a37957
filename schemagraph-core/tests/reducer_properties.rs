//! Property tests for table reduction over random foreign key graphs.

use proptest::prelude::*;
use schemagraph_core::{
    Catalog, FilterOptions, GrepOptions, TableId,
    models::{ColumnRef, ColumnReference, ForeignKey, ForeignKeyRule},
    reducer::TablesReducer,
};
use std::collections::BTreeSet;

/// Table count, foreign key edges as (child, parent) and the seed mask.
#[derive(Debug, Clone)]
struct Graph {
    tables: usize,
    edges: Vec<(usize, usize)>,
    seeds: Vec<bool>,
}

/// Generates a graph of 1..8 tables with up to 12 foreign keys.
fn arb_graph() -> impl Strategy<Value = Graph> {
    (1usize..8).prop_flat_map(|tables| {
        (
            prop::collection::vec((0..tables, 0..tables), 0..=12),
            prop::collection::vec(any::<bool>(), tables),
        )
            .prop_map(move |(edges, seeds)| Graph {
                tables,
                edges,
                seeds,
            })
    })
}

fn build(graph: &Graph) -> (Catalog, Vec<TableId>) {
    let mut catalog = Catalog::new("prop");
    let schema = catalog.add_schema(None, Some("public"));
    let ids: Vec<TableId> = (0..graph.tables)
        .map(|i| catalog.add_table(schema, &format!("t{}", i), "TABLE"))
        .collect();
    for (n, (child, parent)) in graph.edges.iter().enumerate() {
        catalog.add_foreign_key(ForeignKey {
            name: format!("fk_{}", n),
            column_references: vec![ColumnReference {
                key_sequence: 1,
                foreign_key_column: ColumnRef {
                    table: ids[*child],
                    column: format!("c{}", n),
                },
                primary_key_column: ColumnRef {
                    table: ids[*parent],
                    column: "id".to_string(),
                },
            }],
            update_rule: ForeignKeyRule::NoAction,
            delete_rule: ForeignKeyRule::NoAction,
        });
    }
    (catalog, ids)
}

fn seed_names(graph: &Graph) -> BTreeSet<String> {
    graph
        .seeds
        .iter()
        .enumerate()
        .filter(|(_, seed)| **seed)
        .map(|(i, _)| format!("t{}", i))
        .collect()
}

fn retained(catalog: &Catalog) -> BTreeSet<TableId> {
    catalog.tables().map(|t| t.id).collect()
}

fn reducer(child: u32, parent: u32) -> TablesReducer {
    TablesReducer::new(
        &FilterOptions::new()
            .with_child_depth(child)
            .with_parent_depth(parent),
        &GrepOptions::default(),
    )
}

proptest! {
    #[test]
    fn depth_zero_keeps_exactly_the_seeds(graph in arb_graph()) {
        let (mut catalog, _) = build(&graph);
        let seeds = seed_names(&graph);

        reducer(0, 0).reduce(&mut catalog, |t| seeds.contains(&t.name));

        let names: BTreeSet<String> = catalog.tables().map(|t| t.name.clone()).collect();
        prop_assert_eq!(names, seeds);
    }

    #[test]
    fn reduction_is_idempotent(graph in arb_graph(), child in 0u32..4, parent in 0u32..4) {
        let (mut catalog, _) = build(&graph);
        let seeds = seed_names(&graph);
        let reducer = reducer(child, parent);

        reducer.reduce(&mut catalog, |t| seeds.contains(&t.name));
        let first = retained(&catalog);
        reducer.reduce(&mut catalog, |t| seeds.contains(&t.name));

        prop_assert_eq!(first, retained(&catalog));
    }

    #[test]
    fn dropped_tables_are_marked(graph in arb_graph(), child in 0u32..4, parent in 0u32..4) {
        let (mut catalog, ids) = build(&graph);
        let seeds = seed_names(&graph);

        reducer(child, parent).reduce(&mut catalog, |t| seeds.contains(&t.name));

        let kept = retained(&catalog);
        for id in ids {
            prop_assert_eq!(kept.contains(&id), !catalog.table(id).filtered_out);
        }
    }

    #[test]
    fn foreign_key_far_ends_are_consistent(graph in arb_graph(), child in 0u32..4, parent in 0u32..4) {
        let (mut catalog, _) = build(&graph);
        let seeds = seed_names(&graph);

        reducer(child, parent).reduce(&mut catalog, |t| seeds.contains(&t.name));

        let kept = retained(&catalog);
        for id in &kept {
            for foreign_key in catalog.exported_foreign_keys(*id) {
                for reference in &foreign_key.column_references {
                    let far_end = reference.foreign_key_column.table;
                    if !kept.contains(&far_end) {
                        prop_assert!(catalog.table(far_end).filtered_out);
                    }
                }
            }
        }
    }
}
