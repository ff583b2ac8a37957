//! The catalog arena and its indexes.

use super::table::qualify;
use super::{
    ForeignKey, NewRoutine, Routine, RoutineId, SchemaId, Table, TableId, TableRelationship,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Normalizes a catalog or schema name, treating blank values as absent.
pub fn normalize_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Schema identified by `(catalog_name, schema_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub id: SchemaId,
    pub catalog_name: Option<String>,
    pub schema_name: Option<String>,
    pub full_name: String,
    /// False for schemas known only as the home of a partial table
    pub crawled: bool,
}

/// Crawl metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub product_name: String,
    pub crawled_at: chrono::DateTime<chrono::Utc>,
    pub crawler_version: String,
    pub warnings: Vec<String>,
}

type SchemaKey = (Option<String>, Option<String>);

/// Root container for everything crawled from one database.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    info: CatalogInfo,
    schemas: Vec<Schema>,
    tables: Vec<Table>,
    routines: Vec<Routine>,
    foreign_keys: Vec<ForeignKey>,
    reduced_tables: BTreeSet<TableId>,
    reduced_routines: BTreeSet<RoutineId>,
    #[serde(skip)]
    schema_lookup: HashMap<SchemaKey, SchemaId>,
    #[serde(skip)]
    table_lookup: HashMap<(SchemaId, String), TableId>,
    #[serde(skip)]
    routine_lookup: HashMap<(SchemaId, String, String), RoutineId>,
    #[serde(skip)]
    foreign_key_lookup: HashMap<(TableId, String), usize>,
    #[serde(skip)]
    imported_keys: HashMap<TableId, Vec<usize>>,
    #[serde(skip)]
    exported_keys: HashMap<TableId, Vec<usize>>,
    #[serde(skip)]
    schema_tables: HashMap<SchemaId, Vec<TableId>>,
}

impl Catalog {
    /// Creates an empty catalog for the named database product.
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            info: CatalogInfo {
                product_name: product_name.into(),
                crawled_at: chrono::Utc::now(),
                crawler_version: env!("CARGO_PKG_VERSION").to_string(),
                warnings: Vec::new(),
            },
            schemas: Vec::new(),
            tables: Vec::new(),
            routines: Vec::new(),
            foreign_keys: Vec::new(),
            reduced_tables: BTreeSet::new(),
            reduced_routines: BTreeSet::new(),
            schema_lookup: HashMap::new(),
            table_lookup: HashMap::new(),
            routine_lookup: HashMap::new(),
            foreign_key_lookup: HashMap::new(),
            imported_keys: HashMap::new(),
            exported_keys: HashMap::new(),
            schema_tables: HashMap::new(),
        }
    }

    pub fn info(&self) -> &CatalogInfo {
        &self.info
    }

    /// Records a non-fatal problem encountered while crawling.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.info.warnings.push(warning.into());
    }

    // --- schemas ---

    /// Registers a crawled schema, or promotes a referenced-only one.
    pub fn add_schema(&mut self, catalog_name: Option<&str>, schema_name: Option<&str>) -> SchemaId {
        let id = self.schema_entry(catalog_name, schema_name);
        self.schemas[id.0].crawled = true;
        id
    }

    fn schema_entry(&mut self, catalog_name: Option<&str>, schema_name: Option<&str>) -> SchemaId {
        let key = (normalize_name(catalog_name), normalize_name(schema_name));
        if let Some(id) = self.schema_lookup.get(&key) {
            return *id;
        }

        let id = SchemaId(self.schemas.len());
        let full_name = [key.0.as_deref(), key.1.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(".");
        self.schemas.push(Schema {
            id,
            catalog_name: key.0.clone(),
            schema_name: key.1.clone(),
            full_name,
            crawled: false,
        });
        self.schema_lookup.insert(key, id);
        id
    }

    /// Finds a crawled schema. Referenced-only schemas are not "known".
    pub fn lookup_schema(
        &self,
        catalog_name: Option<&str>,
        schema_name: Option<&str>,
    ) -> Option<SchemaId> {
        let key = (normalize_name(catalog_name), normalize_name(schema_name));
        self.schema_lookup
            .get(&key)
            .copied()
            .filter(|id| self.schemas[id.0].crawled)
    }

    pub fn schema(&self, id: SchemaId) -> &Schema {
        &self.schemas[id.0]
    }

    /// Crawled schemas in discovery order.
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter().filter(|s| s.crawled)
    }

    // --- tables ---

    /// Adds a fully crawled table, returning the existing id on a repeat.
    pub fn add_table(&mut self, schema: SchemaId, name: &str, table_type: &str) -> TableId {
        if let Some(id) = self.lookup_table(schema, name) {
            return id;
        }
        let id = TableId(self.tables.len());
        let table = Table::full(id, schema, &self.schemas[schema.0].full_name, name, table_type);
        self.insert_table(table);
        id
    }

    /// Finds a table by name, or registers a partial one in the named schema.
    pub fn lookup_or_create_partial_table(
        &mut self,
        catalog_name: Option<&str>,
        schema_name: Option<&str>,
        name: &str,
    ) -> TableId {
        let schema = self.schema_entry(catalog_name, schema_name);
        if let Some(id) = self.lookup_table(schema, name) {
            return id;
        }
        let id = TableId(self.tables.len());
        let table = Table::partial(id, schema, &self.schemas[schema.0].full_name, name);
        self.insert_table(table);
        id
    }

    fn insert_table(&mut self, table: Table) {
        let id = table.id;
        self.table_lookup.insert((table.schema, table.name.clone()), id);
        if !table.is_partial() {
            self.schema_tables.entry(table.schema).or_default().push(id);
        }
        self.tables.push(table);
    }

    pub fn lookup_table(&self, schema: SchemaId, name: &str) -> Option<TableId> {
        self.table_lookup.get(&(schema, name.to_string())).copied()
    }

    /// Finds a table by qualified names.
    pub fn lookup_table_by_name(
        &self,
        catalog_name: Option<&str>,
        schema_name: Option<&str>,
        name: &str,
    ) -> Option<TableId> {
        let key = (normalize_name(catalog_name), normalize_name(schema_name));
        let schema = self.schema_lookup.get(&key)?;
        self.lookup_table(*schema, name)
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.0]
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        &mut self.tables[id.0]
    }

    /// Retained, fully crawled tables.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables
            .iter()
            .filter(|t| !t.is_partial() && !self.reduced_tables.contains(&t.id))
    }

    /// Every table ever added, partial and reduced ones included.
    pub fn all_tables(&self) -> &[Table] {
        &self.tables
    }

    /// Ids of tables not physically reduced, partial ones included.
    pub fn current_table_ids(&self) -> Vec<TableId> {
        self.tables
            .iter()
            .map(|t| t.id)
            .filter(|id| !self.reduced_tables.contains(id))
            .collect()
    }

    pub fn is_table_reduced(&self, id: TableId) -> bool {
        self.reduced_tables.contains(&id)
    }

    /// Physically filters the table collection down to `keep`.
    ///
    /// Tables already reduced stay reduced. The schema index is rebuilt.
    pub fn reduce_tables(&mut self, keep: &BTreeSet<TableId>) {
        for table in &self.tables {
            if !keep.contains(&table.id) {
                self.reduced_tables.insert(table.id);
            }
        }
        self.rebuild_schema_index();
    }

    /// Rebuilds the schema to table index from the retained tables.
    pub fn rebuild_schema_index(&mut self) {
        let mut index: HashMap<SchemaId, Vec<TableId>> = HashMap::new();
        for table in self.tables() {
            index.entry(table.schema).or_default().push(table.id);
        }
        self.schema_tables = index;
    }

    /// Retained tables of a schema.
    pub fn schema_tables(&self, schema: SchemaId) -> &[TableId] {
        self.schema_tables
            .get(&schema)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    // --- foreign keys ---

    /// Adds a foreign key. Keys are unique per child table and name; a repeat
    /// returns false and leaves the catalog unchanged.
    pub fn add_foreign_key(&mut self, foreign_key: ForeignKey) -> bool {
        let (Some(child), Some(parent)) = (foreign_key.child_table(), foreign_key.parent_table())
        else {
            return false;
        };
        let key = (child, foreign_key.name.clone());
        if self.foreign_key_lookup.contains_key(&key) {
            return false;
        }

        let index = self.foreign_keys.len();
        self.foreign_keys.push(foreign_key);
        self.foreign_key_lookup.insert(key, index);
        self.imported_keys.entry(child).or_default().push(index);
        self.exported_keys.entry(parent).or_default().push(index);
        true
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Foreign keys held by the table, pointing at its parents.
    pub fn imported_foreign_keys(&self, id: TableId) -> impl Iterator<Item = &ForeignKey> {
        self.keys_at(self.imported_keys.get(&id))
    }

    /// Foreign keys of child tables that reference this table.
    pub fn exported_foreign_keys(&self, id: TableId) -> impl Iterator<Item = &ForeignKey> {
        self.keys_at(self.exported_keys.get(&id))
    }

    fn keys_at<'a>(&'a self, indexes: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a ForeignKey> {
        indexes
            .into_iter()
            .flatten()
            .map(move |index| &self.foreign_keys[*index])
    }

    /// Tables directly related to `id` in the given direction.
    pub fn related_tables(&self, id: TableId, relationship: TableRelationship) -> BTreeSet<TableId> {
        match relationship {
            TableRelationship::Parent => self
                .imported_foreign_keys(id)
                .filter_map(ForeignKey::parent_table)
                .filter(|parent| *parent != id)
                .collect(),
            TableRelationship::Child => self
                .exported_foreign_keys(id)
                .filter_map(ForeignKey::child_table)
                .filter(|child| *child != id)
                .collect(),
        }
    }

    // --- routines ---

    /// Adds a routine, assigning its id. Returns `None` when a routine with
    /// the same `(schema, name, specific_name)` is already present.
    pub fn add_routine(&mut self, routine: NewRoutine) -> Option<RoutineId> {
        let key = (
            routine.schema,
            routine.name.clone(),
            routine.specific_name.clone(),
        );
        if self.routine_lookup.contains_key(&key) {
            return None;
        }
        let id = RoutineId(self.routines.len());
        self.routines.push(Routine::with_id(id, routine));
        self.routine_lookup.insert(key, id);
        Some(id)
    }

    pub fn lookup_routine(
        &self,
        schema: SchemaId,
        name: &str,
        specific_name: &str,
    ) -> Option<RoutineId> {
        self.routine_lookup
            .get(&(schema, name.to_string(), specific_name.to_string()))
            .copied()
    }

    pub fn routine(&self, id: RoutineId) -> &Routine {
        &self.routines[id.0]
    }

    /// Retained routines.
    pub fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.routines
            .iter()
            .filter(|r| !self.reduced_routines.contains(&r.id))
    }

    /// Physically filters the routine collection down to `keep`.
    pub fn reduce_routines(&mut self, keep: &BTreeSet<RoutineId>) {
        for routine in &self.routines {
            if !keep.contains(&routine.id) {
                self.reduced_routines.insert(routine.id);
            }
        }
    }

    pub fn routine_count(&self) -> usize {
        self.routines().count()
    }

    /// Qualified name for an object in a schema.
    pub fn qualified_name(&self, schema: SchemaId, name: &str) -> String {
        qualify(&self.schemas[schema.0].full_name, name)
    }
}
