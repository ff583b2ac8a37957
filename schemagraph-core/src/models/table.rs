//! Tables, columns and the relationships between them.

use super::{SchemaId, TableId};
use serde::{Deserialize, Serialize};

/// Column data type as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDataType {
    pub name: String,
    /// Large objects are left out of `${orderbycolumns}` expansions
    pub large_object: bool,
}

/// Type names treated as large objects regardless of the source.
const LARGE_OBJECT_TYPES: &[&str] = &[
    "BLOB",
    "CLOB",
    "NCLOB",
    "TINYBLOB",
    "MEDIUMBLOB",
    "LONGBLOB",
    "LONGTEXT",
    "MEDIUMTEXT",
    "BYTEA",
    "IMAGE",
    "NTEXT",
    "LONGVARBINARY",
    "LONGVARCHAR",
    "LONGNVARCHAR",
    "BINARY LARGE OBJECT",
    "CHARACTER LARGE OBJECT",
];

impl ColumnDataType {
    /// Classifies a source type name, e.g. `VARCHAR(20)` or `blob`.
    pub fn from_type_name(name: &str) -> Self {
        let base = name
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        Self {
            name: name.trim().to_string(),
            large_object: LARGE_OBJECT_TYPES.contains(&base.as_str()),
        }
    }
}

/// Table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ordinal_position: u32,
    pub data_type: ColumnDataType,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub remarks: Option<String>,
}

impl Column {
    /// Creates a nullable column of the given type.
    pub fn new(name: impl Into<String>, ordinal_position: u32, type_name: &str) -> Self {
        Self {
            name: name.into(),
            ordinal_position,
            data_type: ColumnDataType::from_type_name(type_name),
            nullable: true,
            default_value: None,
            remarks: None,
        }
    }
}

/// Table-level constraint other than foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConstraint {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub definition: Option<String>,
}

/// Kinds of table constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    PrimaryKey,
    Unique,
    Check,
    Unknown,
}

impl ConstraintType {
    /// Parses the `CONSTRAINT_TYPE` value of an information schema row.
    pub fn from_metadata(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "PRIMARY KEY" | "P" => Self::PrimaryKey,
            "UNIQUE" | "U" => Self::Unique,
            "CHECK" | "C" => Self::Check,
            _ => Self::Unknown,
        }
    }
}

/// Table trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    /// Full name of the owning table, followed by the trigger name
    pub full_name: String,
    pub event_manipulation: EventManipulation,
    pub action_timing: ActionTiming,
    pub action_orientation: ActionOrientation,
    pub action_order: i64,
    pub action_condition: Option<String>,
    pub action_statement: Option<String>,
}

/// Statement that fires a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventManipulation {
    Insert,
    Update,
    Delete,
    Unknown,
}

/// When a trigger fires relative to its statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTiming {
    Before,
    After,
    InsteadOf,
    Unknown,
}

/// Whether a trigger fires per row or per statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOrientation {
    Row,
    Statement,
    Unknown,
}

impl EventManipulation {
    /// Parses an `EVENT_MANIPULATION` value.
    pub fn from_metadata(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Unknown,
        }
    }
}

impl ActionTiming {
    /// Parses an `ACTION_TIMING` / `CONDITION_TIMING` value.
    pub fn from_metadata(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "BEFORE" => Self::Before,
            "AFTER" => Self::After,
            "INSTEAD OF" | "INSTEAD_OF" => Self::InsteadOf,
            _ => Self::Unknown,
        }
    }
}

impl ActionOrientation {
    /// Parses an `ACTION_ORIENTATION` value.
    pub fn from_metadata(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "ROW" => Self::Row,
            "STATEMENT" => Self::Statement,
            _ => Self::Unknown,
        }
    }
}

/// Retrieved data of a fully crawled table, or nothing for a table known only
/// as the far end of a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableKind {
    Full {
        columns: Vec<Column>,
        constraints: Vec<TableConstraint>,
        triggers: Vec<Trigger>,
    },
    Partial,
}

/// Database table or view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub schema: SchemaId,
    pub name: String,
    pub full_name: String,
    pub table_type: String,
    pub remarks: Option<String>,
    pub definition: Option<String>,
    pub kind: TableKind,
    /// Set by the reducer when the table is not part of the retained set
    pub filtered_out: bool,
    /// Set together with `filtered_out` when grep-only-matching is requested
    pub no_grep_match: bool,
    pub row_count: Option<i64>,
}

impl Table {
    pub(crate) fn full(
        id: TableId,
        schema: SchemaId,
        schema_full_name: &str,
        name: &str,
        table_type: &str,
    ) -> Self {
        Self {
            id,
            schema,
            name: name.to_string(),
            full_name: qualify(schema_full_name, name),
            table_type: table_type.to_string(),
            remarks: None,
            definition: None,
            kind: TableKind::Full {
                columns: Vec::new(),
                constraints: Vec::new(),
                triggers: Vec::new(),
            },
            filtered_out: false,
            no_grep_match: false,
            row_count: None,
        }
    }

    pub(crate) fn partial(
        id: TableId,
        schema: SchemaId,
        schema_full_name: &str,
        name: &str,
    ) -> Self {
        Self {
            id,
            schema,
            name: name.to_string(),
            full_name: qualify(schema_full_name, name),
            table_type: "UNKNOWN".to_string(),
            remarks: None,
            definition: None,
            kind: TableKind::Partial,
            filtered_out: false,
            no_grep_match: false,
            row_count: None,
        }
    }

    /// Returns true for tables known only through a foreign key.
    pub fn is_partial(&self) -> bool {
        matches!(self.kind, TableKind::Partial)
    }

    /// Columns in ordinal order; empty for partial tables.
    pub fn columns(&self) -> &[Column] {
        match &self.kind {
            TableKind::Full { columns, .. } => columns,
            TableKind::Partial => &[],
        }
    }

    pub fn constraints(&self) -> &[TableConstraint] {
        match &self.kind {
            TableKind::Full { constraints, .. } => constraints,
            TableKind::Partial => &[],
        }
    }

    pub fn triggers(&self) -> &[Trigger] {
        match &self.kind {
            TableKind::Full { triggers, .. } => triggers,
            TableKind::Partial => &[],
        }
    }

    /// Adds a column, keeping ordinal order. Ignored for partial tables.
    pub fn add_column(&mut self, column: Column) -> bool {
        match &mut self.kind {
            TableKind::Full { columns, .. } => {
                if columns.iter().any(|c| c.name == column.name) {
                    return false;
                }
                let position = columns
                    .iter()
                    .position(|c| c.ordinal_position > column.ordinal_position)
                    .unwrap_or(columns.len());
                columns.insert(position, column);
                true
            }
            TableKind::Partial => false,
        }
    }

    pub fn add_constraint(&mut self, constraint: TableConstraint) -> bool {
        match &mut self.kind {
            TableKind::Full { constraints, .. } => {
                constraints.push(constraint);
                true
            }
            TableKind::Partial => false,
        }
    }

    pub fn add_trigger(&mut self, trigger: Trigger) -> bool {
        match &mut self.kind {
            TableKind::Full { triggers, .. } => {
                triggers.push(trigger);
                true
            }
            TableKind::Partial => false,
        }
    }

    /// Marks the table as filtered out of the retained set.
    pub fn mark_filtered_out(&mut self, grep_only_matching: bool) {
        self.filtered_out = true;
        if grep_only_matching {
            self.no_grep_match = true;
        }
    }
}

/// Column identified by its owning table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: TableId,
    pub column: String,
}

/// One column pair of a foreign key, dependent column first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub key_sequence: u32,
    pub foreign_key_column: ColumnRef,
    pub primary_key_column: ColumnRef,
}

/// Foreign key from a child table to its parent table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub column_references: Vec<ColumnReference>,
    pub update_rule: ForeignKeyRule,
    pub delete_rule: ForeignKeyRule,
}

/// Referential action on update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyRule {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
    #[default]
    Unknown,
}

impl ForeignKeyRule {
    /// Parses either a JDBC short id (`0`..`4`) or an SQL action name.
    pub fn from_metadata(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "0" | "CASCADE" => Self::Cascade,
            "1" | "RESTRICT" => Self::Restrict,
            "2" | "SET NULL" => Self::SetNull,
            "3" | "NO ACTION" => Self::NoAction,
            "4" | "SET DEFAULT" => Self::SetDefault,
            _ => Self::Unknown,
        }
    }
}

impl ForeignKey {
    /// Dependent table, the table holding the foreign key columns.
    pub fn child_table(&self) -> Option<TableId> {
        self.column_references
            .first()
            .map(|r| r.foreign_key_column.table)
    }

    /// Referenced table.
    pub fn parent_table(&self) -> Option<TableId> {
        self.column_references
            .first()
            .map(|r| r.primary_key_column.table)
    }
}

/// Direction of a foreign key relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRelationship {
    /// Tables this table references
    Parent,
    /// Tables referencing this table
    Child,
}

pub(crate) fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}
