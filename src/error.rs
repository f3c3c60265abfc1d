//! Error types for the rule tree editor

use thiserror::Error;

/// Main error type for the rule tree editor
#[derive(Error, Debug)]
pub enum RuleEditorError {
    #[error("Rule editor mounted outside of a form context")]
    OutsideFormContext,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("No value at path: {0}")]
    NodeNotFound(String),

    #[error("Expected {expected} at path: {path}")]
    UnexpectedNode { path: String, expected: &'static str },

    #[error("Path conflict at {0}: cannot descend into a non-container value")]
    PathConflict(String),

    #[error("Index {index} out of bounds for {path} (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("Cannot remove the last remaining child of group: {0}")]
    LastChild(String),

    #[error("Nested groups are limited to depth {max_depth} (group at depth {depth})")]
    DepthLimit { depth: usize, max_depth: usize },

    #[error("Exists clauses are not allowed inside {0}")]
    ExistsNotAllowed(String),

    #[error("Editor is disabled: {0}")]
    Disabled(String),

    #[error("Incomplete rule: {0}")]
    IncompleteRule(String),

    #[error("Invalid boolean expression: {0}")]
    InvalidBoolExp(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] serde_json::Error),
}

/// Result type alias for the rule tree editor
pub type Result<T> = std::result::Result<T, RuleEditorError>;
