//! Reduction of a crawled catalog to the requested objects.
//!
//! Tables are reduced in two passes. The first selects the tables accepted
//! by the predicate, widens the selection along foreign keys to the
//! configured child and parent depths, marks every other table as filtered
//! out and physically drops it. The second pass marks the far end of every
//! foreign key exported by a retained table as filtered out when that table
//! was dropped or is partial, so both sides of a relationship agree.
//!
//! Partial tables can be stepped over during expansion but are never
//! retained. Reducing an already reduced catalog with the same settings
//! keeps the same tables.

mod grep;


pub use grep::TableGrepFilter;

use crate::config::{FilterOptions, GrepOptions};
use crate::models::{Catalog, Routine, RoutineId, Table, TableId, TableRelationship};
use std::collections::BTreeSet;

/// Reduces the tables of a catalog.
#[derive(Debug, Clone, Copy)]
pub struct TablesReducer {
    child_table_filter_depth: u32,
    parent_table_filter_depth: u32,
    grep_only_matching: bool,
}

impl TablesReducer {
    pub fn new(filter: &FilterOptions, grep: &GrepOptions) -> Self {
        Self {
            child_table_filter_depth: filter.child_table_filter_depth,
            parent_table_filter_depth: filter.parent_table_filter_depth,
            grep_only_matching: grep.grep_only_matching,
        }
    }

    /// Reduces the catalog's current tables to those accepted by `predicate`
    /// and their related tables. An empty catalog is left untouched.
    pub fn reduce<P>(&self, catalog: &mut Catalog, predicate: P)
    where
        P: Fn(&Table) -> bool,
    {
        let current = catalog.current_table_ids();
        if current.is_empty() {
            return;
        }

        let keep = self.keep_set(catalog, &current, predicate);
        tracing::debug!(
            "Keeping {} of {} tables",
            keep.len(),
            current.iter().filter(|id| !catalog.table(**id).is_partial()).count()
        );

        for id in &current {
            if catalog.table(*id).is_partial() || !keep.contains(id) {
                catalog.table_mut(*id).mark_filtered_out(self.grep_only_matching);
            }
        }
        catalog.reduce_tables(&keep);

        self.mark_foreign_key_far_ends(catalog);
    }

    /// Seed tables plus their expansions along both relationships.
    fn keep_set<P>(&self, catalog: &Catalog, current: &[TableId], predicate: P) -> BTreeSet<TableId>
    where
        P: Fn(&Table) -> bool,
    {
        let seeds: BTreeSet<TableId> = current
            .iter()
            .copied()
            .filter(|id| {
                let table = catalog.table(*id);
                !table.is_partial() && predicate(table)
            })
            .collect();

        let mut keep = seeds.clone();
        keep.extend(self.include_related(
            catalog,
            &seeds,
            TableRelationship::Child,
            self.child_table_filter_depth,
        ));
        keep.extend(self.include_related(
            catalog,
            &seeds,
            TableRelationship::Parent,
            self.parent_table_filter_depth,
        ));
        keep
    }

    /// Tables reachable from `seeds` in at most `depth` hops, skipping
    /// partial and already reduced tables.
    fn include_related(
        &self,
        catalog: &Catalog,
        seeds: &BTreeSet<TableId>,
        relationship: TableRelationship,
        depth: u32,
    ) -> BTreeSet<TableId> {
        let mut included = seeds.clone();
        let mut frontier = seeds.clone();
        for _ in 0..depth {
            let mut next = BTreeSet::new();
            for id in &frontier {
                for related in catalog.related_tables(*id, relationship) {
                    if catalog.table(related).is_partial() || catalog.is_table_reduced(related) {
                        continue;
                    }
                    if included.insert(related) {
                        next.insert(related);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        included
    }

    fn mark_foreign_key_far_ends(&self, catalog: &mut Catalog) {
        let mut far_ends = BTreeSet::new();
        for table in catalog.tables() {
            for foreign_key in catalog.exported_foreign_keys(table.id) {
                for reference in &foreign_key.column_references {
                    let far_end = reference.foreign_key_column.table;
                    if catalog.table(far_end).is_partial() || catalog.is_table_reduced(far_end) {
                        far_ends.insert(far_end);
                    }
                }
            }
        }

        for id in far_ends {
            catalog.table_mut(id).mark_filtered_out(self.grep_only_matching);
        }
    }
}

/// Reduces the routines of a catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutinesReducer;

impl RoutinesReducer {
    pub fn new() -> Self {
        Self
    }

    /// Drops every routine not accepted by `predicate`.
    pub fn reduce<P>(&self, catalog: &mut Catalog, predicate: P)
    where
        P: Fn(&Routine) -> bool,
    {
        let keep: BTreeSet<RoutineId> = catalog
            .routines()
            .filter(|routine| predicate(routine))
            .map(|routine| routine.id)
            .collect();
        tracing::debug!("Keeping {} of {} routines", keep.len(), catalog.routine_count());
        catalog.reduce_routines(&keep);
    }
}
