//! Catalog data model.
//!
//! The catalog is an arena: schemas, tables and routines live in vectors
//! owned by [`Catalog`] and refer to each other through the stable
//! [`SchemaId`], [`TableId`] and [`RoutineId`] keys. Name lookups go through
//! hash indexes kept next to the arenas. Nothing holds a reference into the
//! catalog across a mutation.

mod catalog;
mod routine;
mod table;


pub use catalog::{Catalog, CatalogInfo, Schema, normalize_name};
pub use routine::{FunctionReturnType, NewRoutine, ProcedureReturnType, Routine, RoutineKind};
pub use table::{
    ActionOrientation, ActionTiming, Column, ColumnDataType, ColumnRef, ColumnReference,
    ConstraintType, EventManipulation, ForeignKey, ForeignKeyRule, Table, TableConstraint,
    TableKind, TableRelationship, Trigger,
};
pub(crate) use table::qualify as qualify_name;

use serde::{Deserialize, Serialize};

/// Key of a schema in its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(pub(crate) usize);

/// Key of a table in its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub(crate) usize);

/// Key of a routine in its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutineId(pub(crate) usize);

impl TableId {
    /// Position of the table in the catalog arena.
    pub fn index(self) -> usize {
        self.0
    }
}
