//! Scope threaded down the recursive editors

/// Immutable per-level editing scope
///
/// Each level builds a fresh scope for its children instead of sharing
/// ambient state: nested groups add one to `depth`, exists clauses also
/// switch the table and turn exists off for their whole subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorScope {
    pub schema: String,
    pub table: String,
    pub disabled: bool,
    pub depth: usize,
    pub max_depth: Option<usize>,
    pub allow_exists_nodes: bool,
}

impl EditorScope {
    pub fn root(schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            disabled: false,
            depth: 0,
            max_depth: None,
            allow_exists_nodes: true,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// `schema.table` of the rows being filtered at this level
    pub fn table_path(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Scope of a group nested directly in this one
    pub fn nested_group(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    /// Scope of the `where` group of an exists clause on `schema.table`
    pub fn exists_where(&self, schema: &str, table: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            depth: self.depth + 1,
            allow_exists_nodes: false,
            ..self.clone()
        }
    }

    /// Nested groups stop at `max_depth - 1`
    pub fn can_add_group(&self) -> bool {
        match self.max_depth {
            Some(max_depth) => self.depth + 1 < max_depth,
            None => true,
        }
    }
}
