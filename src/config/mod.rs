//! Configuration module for the rule editor
//!
//! Editor settings are plain serde data so hosts can load them from the
//! project configuration they already hold.

mod editor;

pub use editor::*;

use crate::error::Result;

/// Deserialize editor settings from a JSON document
///
/// Missing fields take their defaults; the result is validated.
pub fn load_editor_config(json: &str) -> Result<EditorConfig> {
    let config: EditorConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}
