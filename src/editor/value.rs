//! Operator-dependent value input of a condition

use serde_json::Value;
use tracing::debug;

use crate::editor::{EditorContext, EditorScope};
use crate::error::{RuleEditorError, Result};
use crate::lookup::{is_permission_variable, permission_variable_tokens, Fetch, TableRef};
use crate::rule::Operator;
use crate::store::{FieldPath, FormStore, SetValueOptions};

/// Editor for `{condition}.value`
#[derive(Debug, Clone)]
pub struct ValueEditor {
    condition_path: FieldPath,
    scope: EditorScope,
    /// `schema.table` owning the condition's column, once known
    selected_table_path: Option<String>,
    disabled: bool,
}

/// Input shown for the current operator
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInput {
    /// `_is_null`: true/false toggle stored as `"true"` / `"false"`
    NullToggle { selected: Option<bool> },
    /// `_in` / `_nin`: permission variables plus free entries
    MultiSelect {
        options: Fetch<Vec<String>>,
        selected: Vec<String>,
        /// Selected tokens that are literals rather than session variables
        free_entries: Vec<String>,
    },
    /// `_c*`: another column of the scope table
    ColumnPicker {
        table: TableRef,
        columns: Fetch<Vec<String>>,
        selected: Option<String>,
        /// Stored as `["$", column]` instead of `[column]`
        cross_table: bool,
    },
    Text { value: String },
}

#[derive(Debug, Clone)]
pub struct ValueView {
    pub editor: ValueEditor,
    pub operator: Option<Operator>,
    /// Stored value, untouched
    pub raw: Value,
    pub input: ValueInput,
    pub error: Option<String>,
    pub disabled: bool,
}

impl ValueEditor {
    pub fn new(
        condition_path: FieldPath,
        scope: EditorScope,
        selected_table_path: Option<String>,
        disabled: bool,
    ) -> Self {
        Self {
            condition_path,
            scope,
            selected_table_path,
            disabled,
        }
    }

    fn value_path(&self) -> FieldPath {
        self.condition_path.key("value")
    }

    fn cross_table(&self) -> bool {
        self.selected_table_path
            .as_deref()
            .is_some_and(|table| table != self.scope.table_path())
    }

    pub fn render<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<ValueView> {
        let operator = ctx
            .store
            .watch(&self.condition_path.key("operator"))
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Operator::from_tag);
        let raw = ctx.store.watch(&self.value_path()).unwrap_or(Value::Null);

        let input = match operator {
            Some(op) if op.is_null_check() => ValueInput::NullToggle {
                selected: null_check_flag(&raw),
            },
            Some(op) if op.is_set_membership() => {
                let selected = selected_tokens(&raw);
                ValueInput::MultiSelect {
                    options: variable_options(ctx),
                    free_entries: selected
                        .iter()
                        .filter(|token| !is_permission_variable(token))
                        .cloned()
                        .collect(),
                    selected,
                }
            }
            Some(op) if op.is_column_comparison() => {
                let table = TableRef::new(&self.scope.schema, &self.scope.table);
                let columns = ctx
                    .lookups
                    .columns
                    .columns(&table.schema, &table.table)
                    .map(|columns| columns.into_iter().map(|c| c.column_name).collect());
                ValueInput::ColumnPicker {
                    table,
                    columns,
                    selected: compared_column(&raw),
                    cross_table: self.cross_table(),
                }
            }
            _ => ValueInput::Text {
                value: match &raw {
                    Value::Null => String::new(),
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                },
            },
        };

        Ok(ValueView {
            editor: self.clone(),
            operator,
            error: ctx.store.error(&self.value_path()),
            raw,
            input,
            disabled: self.disabled,
        })
    }

    fn write<S: FormStore>(&self, ctx: &mut EditorContext<S>, value: Value) -> Result<()> {
        if self.disabled {
            return Err(RuleEditorError::Disabled(self.condition_path.to_string()));
        }
        debug!(path = %self.value_path(), value = %value, "set condition value");
        ctx.store
            .set_value(&self.value_path(), value, SetValueOptions::DIRTY)
    }

    pub fn set_null_check<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        is_null: bool,
    ) -> Result<()> {
        self.write(ctx, Value::String(is_null.to_string()))
    }

    /// Replace the selection
    ///
    /// A selection of exactly the user-id variable is stored as that bare
    /// string; anything else is stored as a list in selection order.
    pub fn select_tokens<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        tokens: Vec<String>,
    ) -> Result<()> {
        let value = match tokens.as_slice() {
            [only] if *only == ctx.config.user_id_variable => Value::String(only.clone()),
            _ => Value::Array(tokens.into_iter().map(Value::String).collect()),
        };
        self.write(ctx, value)
    }

    /// Free entry: append a token unless already selected
    pub fn add_token<S: FormStore>(&self, ctx: &mut EditorContext<S>, token: &str) -> Result<()> {
        let token = token.trim();
        let mut tokens = self.current_tokens(ctx);
        if token.is_empty() || tokens.iter().any(|t| t == token) {
            return Ok(());
        }
        tokens.push(token.to_string());
        self.select_tokens(ctx, tokens)
    }

    pub fn remove_token<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        token: &str,
    ) -> Result<()> {
        let mut tokens = self.current_tokens(ctx);
        tokens.retain(|t| t != token);
        self.select_tokens(ctx, tokens)
    }

    fn current_tokens<S: FormStore>(&self, ctx: &EditorContext<S>) -> Vec<String> {
        ctx.store
            .get_value(&self.value_path())
            .map(|raw| selected_tokens(&raw))
            .unwrap_or_default()
    }

    pub fn select_comparison_column<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        column: &str,
    ) -> Result<()> {
        let value = if self.cross_table() {
            serde_json::json!(["$", column])
        } else {
            serde_json::json!([column])
        };
        self.write(ctx, value)
    }

    /// Stored verbatim, including the empty string
    pub fn set_text<S: FormStore>(&self, ctx: &mut EditorContext<S>, text: &str) -> Result<()> {
        self.write(ctx, Value::String(text.to_string()))
    }
}

fn null_check_flag(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn selected_tokens(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(text) if !text.is_empty() => vec![text.clone()],
        _ => Vec::new(),
    }
}

fn compared_column(raw: &Value) -> Option<String> {
    match raw {
        Value::Array(items) => items.last().and_then(Value::as_str).map(str::to_string),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn variable_options<S: FormStore>(ctx: &EditorContext<S>) -> Fetch<Vec<String>> {
    let claims = match &ctx.config.project_id {
        Some(project_id) => ctx.lookups.variables.custom_claims(project_id),
        None => Fetch::Ready(Vec::new()),
    };
    claims.map(|claims| permission_variable_tokens(&ctx.config, &claims))
}
