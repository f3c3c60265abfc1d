//! Exists clause editor: table picker over a nested where group

use serde_json::Value;
use tracing::{debug, trace};

use crate::editor::{
    invoke_remove, node_id, read_object, string_field, EditorContext, EditorScope, GroupEditor,
    GroupView, RemoveAction, RemoveControl,
};
use crate::error::{RuleEditorError, Result};
use crate::lookup::{Fetch, TableRef};
use crate::rule::{ExistsNode, NodeId};
use crate::store::{FieldPath, FormStore, SetValueOptions};

/// Editor for an `_exists` clause: a table picker over a nested `where` group
#[derive(Debug, Clone)]
pub struct ExistsEditor {
    path: FieldPath,
    scope: EditorScope,
    on_remove: Option<RemoveAction>,
    disable_remove: bool,
}

#[derive(Debug, Clone)]
pub struct ExistsView {
    pub id: NodeId,
    pub editor: ExistsEditor,
    pub schema: String,
    pub table: String,
    pub selected: Option<TableRef>,
    pub tables: Fetch<Vec<TableRef>>,
    pub table_label: String,
    pub where_group: GroupView,
    pub delete: Option<RemoveControl>,
}

impl ExistsView {
    pub fn to_node(&self) -> ExistsNode {
        ExistsNode {
            id: self.id.clone(),
            schema: self.schema.clone(),
            table: self.table.clone(),
            where_: self.where_group.to_node(),
        }
    }
}

impl ExistsEditor {
    pub fn new(path: FieldPath, scope: EditorScope) -> Self {
        Self {
            path,
            scope,
            on_remove: None,
            disable_remove: false,
        }
    }

    pub fn with_remove(mut self, on_remove: RemoveAction, disable_remove: bool) -> Self {
        self.on_remove = Some(on_remove);
        self.disable_remove = disable_remove;
        self
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.scope.disabled {
            return Err(RuleEditorError::Disabled(self.path.to_string()));
        }
        Ok(())
    }

    pub fn render<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<ExistsView> {
        let object = read_object(&mut ctx.store, &self.path, "exists")?;
        let id = node_id(&object, &self.path);
        let schema = string_field(&object, "schema");
        let table = string_field(&object, "table");
        trace!(path = %self.path, table = %table, "render exists");

        let selected = (!table.is_empty()).then(|| TableRef::new(&schema, &table));
        let table_label = selected
            .as_ref()
            .map(TableRef::path)
            .unwrap_or_else(|| "Select table...".to_string());

        // the where group filters rows of the target table, never another exists
        let where_group = GroupEditor::new(
            self.path.key("where"),
            self.scope.exists_where(&schema, &table),
        )
        .render(ctx)?;

        Ok(ExistsView {
            id,
            editor: self.clone(),
            schema,
            table,
            selected,
            tables: ctx.lookups.tables.tables(),
            table_label,
            where_group,
            delete: self.on_remove.as_ref().map(|_| RemoveControl {
                disabled: self.scope.disabled || self.disable_remove,
            }),
        })
    }

    /// Point the clause at another table; writes `schema` then `table`
    pub fn select_table<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        table: &TableRef,
    ) -> Result<()> {
        self.ensure_enabled()?;
        ctx.store.set_value(
            &self.path.key("schema"),
            Value::String(table.schema.clone()),
            SetValueOptions::DIRTY,
        )?;
        ctx.store.set_value(
            &self.path.key("table"),
            Value::String(table.table.clone()),
            SetValueOptions::DIRTY,
        )?;
        debug!(path = %self.path, table = %table, "selected exists table");
        Ok(())
    }

    pub fn delete<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<()> {
        self.ensure_enabled()?;
        invoke_remove(ctx, &self.path, self.on_remove.as_ref(), self.disable_remove)
    }
}
