//! Metadata lookups consumed by the editor
//!
//! Column types, tables and permission variables come from the connected
//! project. Lookups report their loading state through [`Fetch`] so editors
//! can render a provisional state while data is in flight.

pub mod cache;
pub mod variables;

pub use cache::*;
pub use variables::*;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loading state of a lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> Fetch<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Fetch::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Fetch::Loading)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetch<U> {
        match self {
            Fetch::Loading => Fetch::Loading,
            Fetch::Failed(message) => Fetch::Failed(message),
            Fetch::Ready(value) => Fetch::Ready(f(value)),
        }
    }
}

/// A table in the connected database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }

    /// `schema.table`
    pub fn path(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Column as reported by the column lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    /// Underlying type, e.g. `text`, `jsonb`, `uuid`
    pub udt_name: String,
}

impl ColumnMetadata {
    pub fn new(table: &TableRef, column_name: &str, udt_name: &str) -> Self {
        Self {
            table_schema: table.schema.clone(),
            table_name: table.table.clone(),
            column_name: column_name.to_string(),
            udt_name: udt_name.to_string(),
        }
    }

    /// `schema.table` owning this column
    pub fn table_path(&self) -> String {
        format!("{}.{}", self.table_schema, self.table_name)
    }
}

/// What a column picker reports on change or initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    /// Column reference as stored, possibly `relationship.column`
    pub value: String,
    pub metadata: Option<ColumnMetadata>,
}

impl ColumnSelection {
    pub fn new(value: &str, metadata: Option<ColumnMetadata>) -> Self {
        Self {
            value: value.to_string(),
            metadata,
        }
    }
}

/// Columns of `(schema, table)`
pub trait ColumnLookup {
    fn columns(&self, schema: &str, table: &str) -> Fetch<Vec<ColumnMetadata>>;
}

/// All tables of the connected database
pub trait TableLookup {
    fn tables(&self) -> Fetch<Vec<TableRef>>;
}

/// Custom claim keys configured for a project
pub trait PermissionVariableLookup {
    fn custom_claims(&self, project_id: &str) -> Fetch<Vec<String>>;
}

/// Fixed metadata, for hosts that already hold the schema and for tests
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    columns: AHashMap<TableRef, Vec<ColumnMetadata>>,
    claims: AHashMap<String, Vec<String>>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table and its `(column, udt_name)` pairs
    pub fn with_table(mut self, schema: &str, table: &str, columns: &[(&str, &str)]) -> Self {
        let table = TableRef::new(schema, table);
        let columns = columns
            .iter()
            .map(|(name, udt)| ColumnMetadata::new(&table, name, udt))
            .collect();
        self.columns.insert(table, columns);
        self
    }

    pub fn with_claims(mut self, project_id: &str, claims: &[&str]) -> Self {
        self.claims.insert(
            project_id.to_string(),
            claims.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Metadata of one column, if registered
    pub fn column(&self, schema: &str, table: &str, column: &str) -> Option<ColumnMetadata> {
        self.columns
            .get(&TableRef::new(schema, table))?
            .iter()
            .find(|c| c.column_name == column)
            .cloned()
    }
}

impl ColumnLookup for StaticMetadata {
    fn columns(&self, schema: &str, table: &str) -> Fetch<Vec<ColumnMetadata>> {
        match self.columns.get(&TableRef::new(schema, table)) {
            Some(columns) => Fetch::Ready(columns.clone()),
            None => Fetch::Failed(format!("unknown table {}.{}", schema, table)),
        }
    }
}

impl TableLookup for StaticMetadata {
    fn tables(&self) -> Fetch<Vec<TableRef>> {
        let mut tables: Vec<TableRef> = self.columns.keys().cloned().collect();
        tables.sort();
        Fetch::Ready(tables)
    }
}

impl PermissionVariableLookup for StaticMetadata {
    fn custom_claims(&self, project_id: &str) -> Fetch<Vec<String>> {
        Fetch::Ready(self.claims.get(project_id).cloned().unwrap_or_default())
    }
}
