//! Rule tree nodes as they are stored in the form store

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::rule::operator::Operator;

/// Stable identity of a node, used as the render key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh, never-reused id
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical operator of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    #[serde(rename = "_and", alias = "AND")]
    And,
    #[serde(rename = "_or", alias = "OR")]
    Or,
    #[serde(rename = "_not", alias = "NOT")]
    Not,
}

impl LogicalOperator {
    pub const ALL: [LogicalOperator; 3] = [Self::And, Self::Or, Self::Not];

    /// Tag used in stored data and compiled expressions
    pub fn tag(self) -> &'static str {
        match self {
            Self::And => "_and",
            Self::Or => "_or",
            Self::Not => "_not",
        }
    }

    /// Human label shown on the operator badge
    pub fn label(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }

    /// Recognize either the stored tag or the display label
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "_and" | "AND" => Some(Self::And),
            "_or" | "OR" => Some(Self::Or),
            "_not" | "NOT" => Some(Self::Not),
            _ => None,
        }
    }
}

/// A node of the rule tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleNode {
    Condition(ConditionNode),
    Group(GroupNode),
    Exists(ExistsNode),
}

impl RuleNode {
    pub fn id(&self) -> &NodeId {
        match self {
            RuleNode::Condition(node) => &node.id,
            RuleNode::Group(node) => &node.id,
            RuleNode::Exists(node) => &node.id,
        }
    }

    /// Type tag as stored under `type`
    pub fn kind(&self) -> &'static str {
        match self {
            RuleNode::Condition(_) => "condition",
            RuleNode::Group(_) => "group",
            RuleNode::Exists(_) => "exists",
        }
    }
}

/// Leaf comparing one column against a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionNode {
    pub id: NodeId,
    #[serde(default)]
    pub column: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl ConditionNode {
    /// Empty column, equality operator, null value
    pub fn new() -> Self {
        Self {
            id: NodeId::fresh(),
            column: String::new(),
            operator: Operator::default(),
            value: Value::Null,
        }
    }
}

impl Default for ConditionNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered group of children joined by a logical operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    pub id: NodeId,
    #[serde(default)]
    pub operator: LogicalOperator,
    #[serde(default)]
    pub children: Vec<RuleNode>,
}

impl GroupNode {
    /// An AND group holding exactly one default condition
    pub fn new() -> Self {
        Self::with_operator(LogicalOperator::And)
    }

    pub fn with_operator(operator: LogicalOperator) -> Self {
        Self {
            id: NodeId::fresh(),
            operator,
            children: vec![RuleNode::Condition(ConditionNode::new())],
        }
    }

    /// Count conditions, groups and exists nodes below this group
    pub fn census(&self) -> NodeCensus {
        let mut census = NodeCensus::default();
        self.collect_census(&mut census);
        census
    }

    fn collect_census(&self, census: &mut NodeCensus) {
        for child in &self.children {
            match child {
                RuleNode::Condition(_) => census.conditions += 1,
                RuleNode::Group(group) => {
                    census.groups += 1;
                    group.collect_census(census);
                }
                RuleNode::Exists(exists) => {
                    census.exists += 1;
                    exists.where_.collect_census(census);
                }
            }
        }
    }
}

impl Default for GroupNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Correlated subquery: some row of `schema.table` satisfies `where`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistsNode {
    pub id: NodeId,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    #[serde(rename = "where")]
    pub where_: GroupNode,
}

impl ExistsNode {
    /// Empty table selection with a default `where` group
    pub fn new() -> Self {
        Self {
            id: NodeId::fresh(),
            schema: String::new(),
            table: String::new(),
            where_: GroupNode::new(),
        }
    }
}

impl Default for ExistsNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Node counts of a subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCensus {
    pub conditions: usize,
    pub groups: usize,
    pub exists: usize,
}
