//! Logical operator badge of a group

use serde_json::Value;
use tracing::debug;

use crate::editor::EditorContext;
use crate::error::{RuleEditorError, Result};
use crate::rule::LogicalOperator;
use crate::store::{FieldPath, FormStore, SetValueOptions};

/// Colour bands cycled by nesting depth
pub const BADGE_COLORS: [&str; 4] = ["blue", "violet", "teal", "amber"];

/// AND/OR/NOT switch of one group
#[derive(Debug, Clone)]
pub struct OperatorBadge {
    group_path: FieldPath,
    depth: usize,
    disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeView {
    pub label: &'static str,
    pub operator: LogicalOperator,
    pub color_band: usize,
    pub color: &'static str,
    pub options: [LogicalOperator; 3],
    pub disabled: bool,
}

impl OperatorBadge {
    pub fn new(group_path: FieldPath, depth: usize, disabled: bool) -> Self {
        Self {
            group_path,
            depth,
            disabled,
        }
    }

    fn operator_path(&self) -> FieldPath {
        self.group_path.key("operator")
    }

    pub fn render<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> BadgeView {
        // unknown or missing tags read as AND
        let operator = ctx
            .store
            .watch(&self.operator_path())
            .as_ref()
            .and_then(Value::as_str)
            .and_then(LogicalOperator::from_tag)
            .unwrap_or_default();
        let color_band = self.depth % BADGE_COLORS.len();

        BadgeView {
            label: operator.label(),
            operator,
            color_band,
            color: BADGE_COLORS[color_band],
            options: LogicalOperator::ALL,
            disabled: self.disabled,
        }
    }

    pub fn select<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        operator: LogicalOperator,
    ) -> Result<()> {
        if self.disabled {
            return Err(RuleEditorError::Disabled(self.group_path.to_string()));
        }
        ctx.store.set_value(
            &self.operator_path(),
            Value::String(operator.tag().to_string()),
            SetValueOptions::DIRTY,
        )?;
        debug!(path = %self.group_path, operator = operator.tag(), "changed group operator");
        Ok(())
    }
}
