//! Boolean expression parser: load an existing permission into a rule tree

use serde_json::{Map, Value};

use crate::error::{RuleEditorError, Result};
use crate::rule::ast::{ConditionNode, ExistsNode, GroupNode, LogicalOperator, NodeId, RuleNode};
use crate::rule::operator::Operator;

/// Parse a boolean expression into an editable group with fresh ids
///
/// The result is always a group; `{}` yields the default group and a
/// top-level object with several keys is an implicit AND. Groups are never
/// empty, so `{"_and": []}` and friends hold one blank condition that has
/// to be filled in before the tree compiles again. `_exists` inside the
/// `_where` of another `_exists` is rejected.
pub fn parse(expression: &Value) -> Result<GroupNode> {
    parse_group(expression, false)
}

fn parse_group(expression: &Value, inside_exists: bool) -> Result<GroupNode> {
    let object = as_object(expression, "expression")?;
    if object.is_empty() {
        return Ok(GroupNode::new());
    }

    match parse_object(object, inside_exists)? {
        RuleNode::Group(group) => Ok(group),
        other => Ok(group_of(LogicalOperator::And, vec![other])),
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        RuleEditorError::InvalidBoolExp(format!("{} must be an object, got {}", what, value))
    })
}

fn group_of(operator: LogicalOperator, mut children: Vec<RuleNode>) -> GroupNode {
    if children.is_empty() {
        children.push(RuleNode::Condition(ConditionNode::new()));
    }
    GroupNode {
        id: NodeId::fresh(),
        operator,
        children,
    }
}

fn parse_object(object: &Map<String, Value>, inside_exists: bool) -> Result<RuleNode> {
    if object.len() == 1 {
        if let Some((key, value)) = object.iter().next() {
            return parse_entry(key, value, inside_exists);
        }
    }

    let children = object
        .iter()
        .map(|(key, value)| parse_entry(key, value, inside_exists))
        .collect::<Result<Vec<_>>>()?;
    Ok(RuleNode::Group(group_of(LogicalOperator::And, children)))
}

fn parse_entry(key: &str, value: &Value, inside_exists: bool) -> Result<RuleNode> {
    match key {
        "_and" | "_or" => {
            let operator = LogicalOperator::from_tag(key).unwrap_or_default();
            let items = value.as_array().ok_or_else(|| {
                RuleEditorError::InvalidBoolExp(format!("{} expects a list", key))
            })?;
            let children = items
                .iter()
                .map(|item| parse_object(as_object(item, key)?, inside_exists))
                .collect::<Result<Vec<_>>>()?;
            Ok(RuleNode::Group(group_of(operator, children)))
        }
        "_not" => {
            let children = match parse_object(as_object(value, key)?, inside_exists)? {
                RuleNode::Group(inner)
                    if inner.operator == LogicalOperator::And && inner.children.len() > 1 =>
                {
                    inner.children
                }
                other => vec![other],
            };
            Ok(RuleNode::Group(group_of(LogicalOperator::Not, children)))
        }
        "_exists" if inside_exists => Err(RuleEditorError::InvalidBoolExp(
            "_exists is not allowed inside _exists".to_string(),
        )),
        "_exists" => parse_exists(as_object(value, key)?),
        column if column.starts_with('_') => Err(RuleEditorError::InvalidBoolExp(format!(
            "unexpected operator {} outside of a column",
            column
        ))),
        column => parse_column(column, as_object(value, column)?),
    }
}

fn parse_exists(object: &Map<String, Value>) -> Result<RuleNode> {
    let table = object
        .get("_table")
        .ok_or_else(|| RuleEditorError::InvalidBoolExp("_exists requires _table".to_string()))?;
    let table = as_object(table, "_table")?;
    let field = |name: &str| {
        table
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let where_ = match object.get("_where") {
        Some(expression) => parse_group(expression, true)?,
        None => GroupNode::new(),
    };

    Ok(RuleNode::Exists(ExistsNode {
        id: NodeId::fresh(),
        schema: field("schema"),
        table: field("name"),
        where_,
    }))
}

fn parse_column(column: &str, object: &Map<String, Value>) -> Result<RuleNode> {
    let mut children = Vec::with_capacity(object.len());

    for (key, value) in object {
        if key.starts_with('_') {
            let operator = Operator::from_tag(key).ok_or_else(|| {
                RuleEditorError::InvalidBoolExp(format!("unknown operator {} on {}", key, column))
            })?;
            children.push(RuleNode::Condition(ConditionNode {
                id: NodeId::fresh(),
                column: column.to_string(),
                operator,
                value: parse_value(operator, value),
            }));
        } else {
            let nested = format!("{}.{}", column, key);
            children.push(parse_column(&nested, as_object(value, &nested)?)?);
        }
    }

    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return Ok(only);
        }
    }
    Ok(RuleNode::Group(group_of(LogicalOperator::And, children)))
}

fn parse_value(operator: Operator, value: &Value) -> Value {
    match (operator, value) {
        (Operator::IsNull, Value::Bool(flag)) => Value::String(flag.to_string()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::compile::compile;
    use serde_json::json;

    fn only_condition(group: &GroupNode) -> &ConditionNode {
        match group.children.as_slice() {
            [RuleNode::Condition(cond)] => cond,
            other => panic!("Expected one condition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_expression() {
        let group = parse(&json!({})).unwrap();
        assert_eq!(group.operator, LogicalOperator::And);
        assert!(only_condition(&group).column.is_empty());
    }

    #[test]
    fn test_parse_bare_condition_wraps_in_and() {
        let group = parse(&json!({ "user_id": { "_eq": "X-Hasura-User-Id" } })).unwrap();
        assert_eq!(group.operator, LogicalOperator::And);
        let cond = only_condition(&group);
        assert_eq!(cond.column, "user_id");
        assert_eq!(cond.operator, Operator::Eq);
        assert_eq!(cond.value, json!("X-Hasura-User-Id"));
    }

    #[test]
    fn test_parse_relationship_path() {
        let group = parse(&json!({ "author": { "name": { "_ilike": "%a%" } } })).unwrap();
        assert_eq!(only_condition(&group).column, "author.name");
    }

    #[test]
    fn test_parse_is_null_flag_becomes_string() {
        let group = parse(&json!({ "deleted_at": { "_is_null": true } })).unwrap();
        assert_eq!(only_condition(&group).value, json!("true"));
    }

    #[test]
    fn test_parse_multiple_operators_on_one_column() {
        let group = parse(&json!({ "age": { "_gt": 18, "_lt": 65 } })).unwrap();
        assert_eq!(group.children.len(), 2);
    }

    #[test]
    fn test_parse_not_unwraps_inner_and() {
        let group = parse(&json!({ "_not": { "_and": [
            { "a": { "_eq": "1" } },
            { "b": { "_eq": "2" } }
        ] } }))
        .unwrap();
        assert_eq!(group.operator, LogicalOperator::Not);
        assert_eq!(group.children.len(), 2);
    }

    #[test]
    fn test_parse_exists() {
        let group = parse(&json!({ "_exists": {
            "_table": { "schema": "public", "name": "members" },
            "_where": { "user_id": { "_eq": "X-Hasura-User-Id" } }
        } }))
        .unwrap();
        match group.children.as_slice() {
            [RuleNode::Exists(exists)] => {
                assert_eq!(exists.schema, "public");
                assert_eq!(exists.table, "members");
                assert_eq!(only_condition(&exists.where_).column, "user_id");
            }
            other => panic!("Expected exists, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_exists_inside_exists() {
        let result = parse(&json!({ "_exists": {
            "_table": { "schema": "public", "name": "members" },
            "_where": { "_or": [
                { "user_id": { "_eq": "X-Hasura-User-Id" } },
                { "_exists": {
                    "_table": { "schema": "public", "name": "orgs" },
                    "_where": { "id": { "_eq": 1 } }
                } }
            ] }
        } }));
        assert!(matches!(
            result,
            Err(RuleEditorError::InvalidBoolExp(msg)) if msg.contains("_exists")
        ));
    }

    #[test]
    fn test_sibling_exists_clauses_are_allowed() {
        let exists = |table: &str| json!({ "_exists": {
            "_table": { "schema": "public", "name": table },
            "_where": { "id": { "_eq": 1 } }
        } });
        let group = parse(&json!({ "_and": [exists("a"), exists("b")] })).unwrap();
        assert_eq!(group.census().exists, 2);
    }

    #[test]
    fn test_empty_list_holds_blank_condition() {
        let group = parse(&json!({ "_and": [] })).unwrap();
        assert!(only_condition(&group).column.is_empty());
        assert!(matches!(compile(&group), Err(RuleEditorError::IncompleteRule(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        let result = parse(&json!({ "age": { "_between": [1, 2] } }));
        assert!(matches!(result, Err(RuleEditorError::InvalidBoolExp(_))));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse(&json!([1, 2])).is_err());
        assert!(parse(&json!({ "_and": { "a": 1 } })).is_err());
    }

    #[test]
    fn test_compiled_expression_parses_back() {
        let expression = json!({ "_or": [
            { "user_id": { "_eq": "X-Hasura-User-Id" } },
            { "_not": { "status": { "_in": ["archived", "deleted"] } } },
            { "_exists": {
                "_table": { "schema": "public", "name": "members" },
                "_where": { "_and": [{ "user_id": { "_ceq": ["$", "owner_id"] } }] }
            } }
        ] });

        let group = parse(&expression).unwrap();
        assert_eq!(compile(&group).unwrap(), expression);
    }
}
