//! Functions and stored procedures.

use super::{RoutineId, SchemaId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result kind of a function, as reported through `FUNCTION_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionReturnType {
    #[default]
    Unknown,
    NoTable,
    ReturnsTable,
}

/// Result kind of a procedure, as reported through `PROCEDURE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureReturnType {
    #[default]
    Unknown,
    NoResult,
    ReturnsResult,
}

impl FunctionReturnType {
    /// Maps the JDBC short id; anything unrecognized is `Unknown`.
    pub fn from_short_id(id: Option<i64>) -> Self {
        match id {
            Some(1) => Self::NoTable,
            Some(2) => Self::ReturnsTable,
            _ => Self::Unknown,
        }
    }
}

impl ProcedureReturnType {
    /// Maps the JDBC short id; anything unrecognized is `Unknown`.
    pub fn from_short_id(id: Option<i64>) -> Self {
        match id {
            Some(1) => Self::NoResult,
            Some(2) => Self::ReturnsResult,
            _ => Self::Unknown,
        }
    }
}

/// Function or procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "routine_type", rename_all = "snake_case")]
pub enum RoutineKind {
    Function { return_type: FunctionReturnType },
    Procedure { return_type: ProcedureReturnType },
}

/// Routine identified by `(schema, name, specific_name)`.
///
/// The specific name tells overloads apart; when the source has none the
/// routine name is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,
    pub schema: SchemaId,
    pub name: String,
    pub specific_name: String,
    pub full_name: String,
    pub kind: RoutineKind,
    pub remarks: Option<String>,
    /// Source columns not mapped to a typed field
    pub attributes: BTreeMap<String, String>,
}

/// A routine read from a source, before the catalog assigns its id.
#[derive(Debug, Clone)]
pub struct NewRoutine {
    pub schema: SchemaId,
    pub name: String,
    pub specific_name: String,
    pub full_name: String,
    pub kind: RoutineKind,
    pub remarks: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl NewRoutine {
    /// A blank `specific_name` falls back to the routine name.
    pub fn new(
        schema: SchemaId,
        schema_full_name: &str,
        name: &str,
        specific_name: Option<&str>,
        kind: RoutineKind,
    ) -> Self {
        let specific_name = specific_name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(name);
        Self {
            schema,
            name: name.to_string(),
            specific_name: specific_name.to_string(),
            full_name: super::table::qualify(schema_full_name, name),
            kind,
            remarks: None,
            attributes: BTreeMap::new(),
        }
    }
}

impl Routine {
    /// Registers `routine` under `id`.
    pub(crate) fn with_id(id: RoutineId, routine: NewRoutine) -> Self {
        Self {
            id,
            schema: routine.schema,
            name: routine.name,
            specific_name: routine.specific_name,
            full_name: routine.full_name,
            kind: routine.kind,
            remarks: routine.remarks,
            attributes: routine.attributes,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, RoutineKind::Function { .. })
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self.kind, RoutineKind::Procedure { .. })
    }
}
