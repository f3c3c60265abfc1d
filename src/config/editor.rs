//! Editor settings

use serde::{Deserialize, Serialize};

use crate::error::{RuleEditorError, Result};

/// Sentinel variable for the current user
pub const USER_ID_VARIABLE: &str = "X-Hasura-User-Id";

/// Prefix under which custom claims are exposed as permission variables
pub const PERMISSION_VARIABLE_PREFIX: &str = "X-Hasura-";

/// Editor-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Cap on group nesting; `None` leaves it unbounded
    pub max_depth: Option<usize>,
    /// Token that collapses an `_in` selection to a bare string
    pub user_id_variable: String,
    pub permission_variable_prefix: String,
    /// Variables offered before the project's custom claims
    pub default_variables: Vec<String>,
    /// Project whose custom claims seed the variable list
    pub project_id: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            user_id_variable: USER_ID_VARIABLE.to_string(),
            permission_variable_prefix: PERMISSION_VARIABLE_PREFIX.to_string(),
            default_variables: vec![USER_ID_VARIABLE.to_string()],
            project_id: None,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(RuleEditorError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.user_id_variable.trim().is_empty() {
            return Err(RuleEditorError::InvalidConfig(
                "user_id_variable must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
