//! Rule Tree Editor - headless editor for row-level permission rules
//!
//! A permission rule is a tree of AND/OR/NOT groups over column conditions
//! and `_exists` clauses. The tree lives in a host form store addressed by
//! dotted paths (`rule.children.0.value`); the editors in this crate render
//! it into view trees and write every edit back through the store.
//!
//! ```ignore
//! let mut ctx = EditorContext::new(store, Lookups::from_metadata(metadata), config);
//! let props = RuleGroupEditorProps::new("rule", "public", "users");
//! let editor = RuleGroupEditor::mount(Some(&ctx), props)?;
//! let view = editor.render(&mut ctx)?;
//! view.editor.add_rule(&mut ctx)?;
//! let filter = compile(&editor.read_tree(&ctx)?)?;
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod lookup;
pub mod rule;
pub mod store;

pub use config::{load_editor_config, EditorConfig};
pub use editor::{
    read_group, write_group, ChildView, EditorContext, GroupView, Lookups, RuleGroupEditor,
    RuleGroupEditorProps,
};
pub use error::{RuleEditorError, Result};
pub use lookup::{ColumnLookup, Fetch, PermissionVariableLookup, StaticMetadata, TableLookup};
pub use rule::{
    available_operators, compile, parse, ConditionNode, ExistsNode, GroupNode, LogicalOperator,
    NodeId, Operator, RuleNode,
};
pub use store::{FieldPath, FormStore, MemoryFormStore, SetValueOptions};
