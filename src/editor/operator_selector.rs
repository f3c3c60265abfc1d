//! Searchable picker over the operator catalog

use serde_json::Value;
use tracing::debug;

use crate::editor::EditorContext;
use crate::error::{RuleEditorError, Result};
use crate::rule::{available_operators, Operator, OperatorOption};
use crate::store::{FieldPath, FormStore, SetValueOptions};

/// Operator picker of one condition
///
/// Rebuilt closed on every render. Popover state survives only in the value
/// the host keeps from that render. The catalog it offers follows the column
/// type cached for the condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSelector {
    condition_path: FieldPath,
    disabled: bool,
    pub column_type: Option<String>,
    pub selected: Option<Operator>,
    pub search: String,
    pub open: bool,
}

impl OperatorSelector {
    pub fn new(
        condition_path: FieldPath,
        column_type: Option<String>,
        selected: Option<Operator>,
        disabled: bool,
    ) -> Self {
        Self {
            condition_path,
            disabled,
            column_type,
            selected,
            search: String::new(),
            open: false,
        }
    }

    /// Catalog entries matching the current search
    pub fn options(&self) -> Vec<OperatorOption> {
        available_operators(self.column_type.as_deref())
            .iter()
            .filter(|option| option.matches(&self.search))
            .copied()
            .collect()
    }

    /// Button label: the selected tag, or a prompt
    pub fn label(&self) -> &'static str {
        self.selected.map(Operator::tag).unwrap_or("Select operator...")
    }

    pub fn open(&mut self) {
        if !self.disabled {
            self.open = true;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.search.clear();
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    /// Pick an operator
    ///
    /// The value is reset to `[]` for `_in`/`_nin` and to null otherwise.
    /// Picking the operator already in effect leaves the value alone.
    pub fn select<S: FormStore>(
        &mut self,
        ctx: &mut EditorContext<S>,
        operator: Operator,
    ) -> Result<()> {
        if self.disabled {
            return Err(RuleEditorError::Disabled(self.condition_path.to_string()));
        }
        self.close();

        let operator_path = self.condition_path.key("operator");
        let current = ctx
            .store
            .get_value(&operator_path)
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Operator::from_tag);
        if current == Some(operator) {
            self.selected = Some(operator);
            return Ok(());
        }

        ctx.store.set_value(
            &operator_path,
            Value::String(operator.tag().to_string()),
            SetValueOptions::DIRTY,
        )?;
        let value = if operator.is_set_membership() {
            Value::Array(Vec::new())
        } else {
            Value::Null
        };
        ctx.store
            .set_value(&self.condition_path.key("value"), value, SetValueOptions::DIRTY)?;
        ctx.store.clear_errors(Some(&self.condition_path));

        debug!(
            path = %self.condition_path,
            operator = operator.tag(),
            "changed condition operator"
        );
        self.selected = Some(operator);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_helpers::*;
    use serde_json::json;

    fn condition_path() -> FieldPath {
        FieldPath::parse("rule.children.0").unwrap()
    }

    fn context() -> EditorContext<crate::store::MemoryFormStore> {
        context_with(group_json(
            "root",
            &[json!({
                "type": "condition",
                "id": "c1",
                "column": "name",
                "operator": "_eq",
                "value": "alice"
            })],
        ))
    }

    #[test]
    fn test_search_filters_catalog() {
        let mut selector =
            OperatorSelector::new(condition_path(), Some("text".into()), None, false);
        assert_eq!(selector.options().len(), 25);

        selector.set_search("LIKE");
        let tags: Vec<_> = selector.options().iter().map(|o| o.tag()).collect();
        assert_eq!(tags, vec!["_like", "_nlike", "_ilike", "_nilike"]);
        assert_eq!(selector.label(), "Select operator...");
    }

    #[test]
    fn test_select_membership_resets_value_to_list() {
        let mut ctx = context();
        ctx.store_mut()
            .set_error(&condition_path().key("value"), "required".into());
        let mut selector = OperatorSelector::new(condition_path(), None, Some(Operator::Eq), false);
        selector.open();
        selector.set_search("in");

        selector.select(&mut ctx, Operator::Nin).unwrap();

        assert!(!selector.open);
        assert!(selector.search.is_empty());
        assert_eq!(selector.label(), "_nin");
        assert_eq!(ctx.store().get_value(&condition_path().key("value")), Some(json!([])));
        assert_eq!(ctx.store().error(&condition_path().key("value")), None);
    }

    #[test]
    fn test_select_other_resets_value_to_null() {
        let mut ctx = context();
        let mut selector = OperatorSelector::new(condition_path(), None, Some(Operator::Eq), false);
        selector.select(&mut ctx, Operator::Gt).unwrap();
        assert_eq!(
            ctx.store().get_value(&condition_path().key("operator")),
            Some(json!("_gt"))
        );
        assert_eq!(ctx.store().get_value(&condition_path().key("value")), Some(Value::Null));
    }

    #[test]
    fn test_reselecting_same_operator_keeps_value() {
        let mut ctx = context();
        let mut selector = OperatorSelector::new(condition_path(), None, Some(Operator::Eq), false);
        selector.select(&mut ctx, Operator::Eq).unwrap();
        assert_eq!(
            ctx.store().get_value(&condition_path().key("value")),
            Some(json!("alice"))
        );
    }

    #[test]
    fn test_disabled_selector_stays_closed() {
        let mut ctx = context();
        let mut selector = OperatorSelector::new(condition_path(), None, None, true);
        selector.open();
        assert!(!selector.open);
        assert!(selector.select(&mut ctx, Operator::In).is_err());
    }
}
