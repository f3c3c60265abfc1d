//! Condition row: column picker, operator selector and value editor

use serde_json::Value;
use tracing::{debug, trace};

use crate::editor::{
    invoke_remove, node_id, read_object, string_field, ConditionUiState, EditorContext,
    EditorScope, OperatorSelector, RemoveAction, RemoveControl, ValueEditor, ValueView,
};
use crate::error::{RuleEditorError, Result};
use crate::lookup::{ColumnMetadata, ColumnSelection, Fetch};
use crate::rule::{ConditionNode, NodeId, Operator};
use crate::store::{FieldPath, FormStore, SetValueOptions};

/// Editor for one condition node
#[derive(Debug, Clone)]
pub struct ConditionEditor {
    path: FieldPath,
    scope: EditorScope,
    on_remove: Option<RemoveAction>,
    disable_remove: bool,
}

/// How a column change treats the operator and value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnChangeOptions {
    /// Reset operator to `_eq` and value to null, clearing errors
    pub reset: bool,
}

impl Default for ColumnChangeOptions {
    fn default() -> Self {
        Self { reset: true }
    }
}

#[derive(Debug, Clone)]
pub struct ConditionView {
    pub id: NodeId,
    pub editor: ConditionEditor,
    pub column: String,
    /// Columns of the scope table offered by the picker
    pub columns: Fetch<Vec<ColumnMetadata>>,
    pub operator: Option<Operator>,
    pub operator_selector: OperatorSelector,
    pub value: ValueView,
    pub column_error: Option<String>,
    pub remove: Option<RemoveControl>,
}

impl ConditionView {
    pub fn to_node(&self) -> ConditionNode {
        ConditionNode {
            id: self.id.clone(),
            column: self.column.clone(),
            operator: self.operator.unwrap_or_default(),
            value: self.value.raw.clone(),
        }
    }
}

impl ConditionEditor {
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

    fn id<S: FormStore>(&self, ctx: &EditorContext<S>) -> Result<NodeId> {
        match ctx.store.get_value(&self.path) {
            Some(Value::Object(object)) => Ok(node_id(&object, &self.path)),
            Some(_) => Err(RuleEditorError::UnexpectedNode {
                path: self.path.to_string(),
                expected: "condition",
            }),
            None => Err(RuleEditorError::NodeNotFound(self.path.to_string())),
        }
    }

    pub fn render<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<ConditionView> {
        let object = read_object(&mut ctx.store, &self.path, "condition")?;
        let id = node_id(&object, &self.path);
        let column = string_field(&object, "column");
        let operator = object
            .get("operator")
            .and_then(Value::as_str)
            .and_then(Operator::from_tag);
        let columns = ctx.lookups.columns.columns(&self.scope.schema, &self.scope.table);
        trace!(path = %self.path, column = %column, "render condition");

        // A stored column seen for the first time fills the UI cache
        // without touching operator or value.
        let mut ui = ctx.condition_ui(&id);
        if ui.table_path.is_none() && !column.is_empty() {
            if let Some(metadata) = columns
                .ready()
                .and_then(|columns| columns.iter().find(|c| c.column_name == column))
            {
                ui = ConditionUiState {
                    table_path: Some(metadata.table_path()),
                    column_type: Some(metadata.udt_name.clone()),
                };
                ctx.set_condition_ui(id.clone(), ui.clone());
            }
        }

        let operator_selector =
            OperatorSelector::new(self.path.clone(), ui.column_type, operator, self.scope.disabled);
        let value = ValueEditor::new(
            self.path.clone(),
            self.scope.clone(),
            ui.table_path,
            self.scope.disabled,
        )
        .render(ctx)?;

        Ok(ConditionView {
            column_error: ctx.store.error(&self.path.key("column")),
            id,
            editor: self.clone(),
            column,
            columns,
            operator,
            operator_selector,
            value,
            remove: self.on_remove.as_ref().map(|_| RemoveControl {
                disabled: self.scope.disabled || self.disable_remove,
            }),
        })
    }

    /// The user picked a column
    ///
    /// Writes the column, caches its table and type, then unless
    /// `options.reset` is off resets operator and value and clears errors.
    pub fn change_column<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        selection: ColumnSelection,
        options: ColumnChangeOptions,
    ) -> Result<()> {
        self.ensure_enabled()?;
        let id = self.id(ctx)?;

        ctx.store.set_value(
            &self.path.key("column"),
            Value::String(selection.value.clone()),
            SetValueOptions::DIRTY,
        )?;
        ctx.set_condition_ui(id, ui_state(&selection));

        if options.reset {
            ctx.store.set_value(
                &self.path.key("operator"),
                Value::String(Operator::default().tag().to_string()),
                SetValueOptions::DIRTY,
            )?;
            ctx.store
                .set_value(&self.path.key("value"), Value::Null, SetValueOptions::DIRTY)?;
            ctx.store.clear_errors(Some(&self.path));
        }

        debug!(
            path = %self.path,
            column = %selection.value,
            reset = options.reset,
            "changed column"
        );
        Ok(())
    }

    /// The column picker resolved the stored column; caches UI state only
    pub fn initialize<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        selection: ColumnSelection,
    ) -> Result<()> {
        let id = self.id(ctx)?;
        ctx.set_condition_ui(id, ui_state(&selection));
        Ok(())
    }

    pub fn remove<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<()> {
        self.ensure_enabled()?;
        invoke_remove(ctx, &self.path, self.on_remove.as_ref(), self.disable_remove)
    }
}

fn ui_state(selection: &ColumnSelection) -> ConditionUiState {
    match &selection.metadata {
        Some(metadata) => ConditionUiState {
            table_path: Some(metadata.table_path()),
            column_type: Some(metadata.udt_name.clone()),
        },
        None => ConditionUiState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_helpers::*;
    use crate::editor::ChildView;
    use serde_json::json;

    fn first_condition(view: &crate::editor::GroupView) -> &ConditionView {
        view.children[0].as_condition().unwrap()
    }

    #[test]
    fn test_change_column_resets_operator_and_value() {
        let mut ctx = context_with(group_json(
            "root",
            &[json!({
                "type": "condition",
                "id": "c1",
                "column": "name",
                "operator": "_ilike",
                "value": "%ann%"
            })],
        ));
        let value_path = FieldPath::parse("rule.children.0.value").unwrap();
        ctx.store_mut().set_error(&value_path, "bad pattern".into());

        let editor = mount(&ctx, None);
        let view = editor.render(&mut ctx).unwrap();
        let condition = first_condition(&view);
        assert_eq!(condition.operator_selector.column_type.as_deref(), Some("text"));
        assert_eq!(condition.value.error.as_deref(), Some("bad pattern"));

        let age = metadata().column("public", "users", "age");
        let selection = ColumnSelection::new("age", age);
        condition
            .editor
            .change_column(&mut ctx, selection, ColumnChangeOptions::default())
            .unwrap();

        let view = editor.render(&mut ctx).unwrap();
        let condition = first_condition(&view);
        assert_eq!(condition.column, "age");
        assert_eq!(condition.operator, Some(Operator::Eq));
        assert_eq!(condition.value.raw, Value::Null);
        assert_eq!(condition.value.error, None);
        assert_eq!(condition.operator_selector.column_type.as_deref(), Some("int4"));
        assert_eq!(ctx.store().error(&value_path), None);
    }

    #[test]
    fn test_change_column_without_reset_keeps_value() {
        let mut ctx = context_with(group_json(
            "root",
            &[json!({
                "type": "condition",
                "id": "c1",
                "column": "name",
                "operator": "_neq",
                "value": "bob"
            })],
        ));
        let editor = mount(&ctx, None);
        let view = editor.render(&mut ctx).unwrap();
        first_condition(&view)
            .editor
            .change_column(
                &mut ctx,
                ColumnSelection::new("author.name", None),
                ColumnChangeOptions { reset: false },
            )
            .unwrap();

        let tree = editor.read_tree(&ctx).unwrap();
        let stored = match &tree.children[0] {
            crate::rule::RuleNode::Condition(c) => c.clone(),
            other => panic!("Expected condition, got {:?}", other),
        };
        assert_eq!(stored.column, "author.name");
        assert_eq!(stored.operator, Operator::Neq);
        assert_eq!(stored.value, json!("bob"));
        assert_eq!(ctx.condition_ui(&NodeId::from("c1")), ConditionUiState::default());
    }

    #[test]
    fn test_initialize_caches_type_only() {
        let mut ctx = context_with(group_json("root", &[condition_json("c1", "")]));
        let editor = mount(&ctx, None);
        let view = editor.render(&mut ctx).unwrap();
        assert_eq!(first_condition(&view).operator_selector.column_type, None);

        let profile = metadata().column("public", "users", "profile");
        first_condition(&view)
            .editor
            .initialize(&mut ctx, ColumnSelection::new("profile", profile))
            .unwrap();

        let view = editor.render(&mut ctx).unwrap();
        let condition = first_condition(&view);
        assert_eq!(condition.column, "");
        assert_eq!(condition.operator_selector.options().len(), 20);
        assert!(!ctx.store().is_dirty(&FieldPath::parse("rule").unwrap()));
    }

    #[test]
    fn test_columns_come_from_scope_table() {
        let mut ctx = context_with(group_json("root", &[condition_json("c1", "name")]));
        let editor = mount(&ctx, None);
        let view = editor.render(&mut ctx).unwrap();
        let names: Vec<_> = first_condition(&view)
            .columns
            .ready()
            .unwrap()
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "name", "age", "profile"]);
        assert!(matches!(view.children[0], ChildView::Condition(_)));
    }

    #[test]
    fn test_column_error_is_reported() {
        let mut ctx = context_with(group_json("root", &[condition_json("c1", "")]));
        ctx.store_mut().set_error(
            &FieldPath::parse("rule.children.0.column").unwrap(),
            "required".into(),
        );
        let editor = mount(&ctx, None);
        let view = editor.render(&mut ctx).unwrap();
        assert_eq!(first_condition(&view).column_error.as_deref(), Some("required"));
    }
}
