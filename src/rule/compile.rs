//! Compile a rule tree into a permission boolean expression

use serde_json::{json, Map, Value};

use crate::error::{RuleEditorError, Result};
use crate::rule::ast::{ConditionNode, ExistsNode, GroupNode, LogicalOperator, RuleNode};
use crate::rule::operator::Operator;

/// Compile a group into its boolean expression
///
/// `_and`/`_or` compile to lists, `_not` to a single nested expression
/// (several children are AND-ed first). Dotted columns are relationship
/// paths and nest one object per segment.
pub fn compile(group: &GroupNode) -> Result<Value> {
    let children = group
        .children
        .iter()
        .map(compile_node)
        .collect::<Result<Vec<_>>>()?;

    Ok(match group.operator {
        LogicalOperator::And => json!({ "_and": children }),
        LogicalOperator::Or => json!({ "_or": children }),
        LogicalOperator::Not => {
            let inner = match <[Value; 1]>::try_from(children) {
                Ok([single]) => single,
                Err(children) => json!({ "_and": children }),
            };
            json!({ "_not": inner })
        }
    })
}

fn compile_node(node: &RuleNode) -> Result<Value> {
    match node {
        RuleNode::Condition(condition) => compile_condition(condition),
        RuleNode::Group(group) => compile(group),
        RuleNode::Exists(exists) => compile_exists(exists),
    }
}

fn compile_condition(condition: &ConditionNode) -> Result<Value> {
    let column = condition.column.trim();
    if column.is_empty() {
        return Err(RuleEditorError::IncompleteRule(format!(
            "condition {} has no column",
            condition.id
        )));
    }

    let mut expression = Value::Object(Map::from_iter([(
        condition.operator.tag().to_string(),
        compile_value(condition.operator, &condition.value),
    )]));

    for segment in column.rsplit('.') {
        if segment.is_empty() {
            return Err(RuleEditorError::IncompleteRule(format!(
                "condition {} has an empty segment in column {}",
                condition.id, column
            )));
        }
        expression = Value::Object(Map::from_iter([(segment.to_string(), expression)]));
    }

    Ok(expression)
}

fn compile_value(operator: Operator, value: &Value) -> Value {
    match (operator, value) {
        (Operator::IsNull, Value::String(flag)) => Value::Bool(flag != "false"),
        (Operator::IsNull, Value::Null) => Value::Bool(true),
        (op, Value::Null) if op.is_set_membership() => Value::Array(Vec::new()),
        _ => value.clone(),
    }
}

fn compile_exists(exists: &ExistsNode) -> Result<Value> {
    if exists.table.is_empty() {
        return Err(RuleEditorError::IncompleteRule(format!(
            "exists clause {} has no table",
            exists.id
        )));
    }

    Ok(json!({
        "_exists": {
            "_table": { "schema": exists.schema, "name": exists.table },
            "_where": compile(&exists.where_)?,
        }
    }))
}
