//! Recursive rule tree editor
//!
//! Editors are cheap handles (a path plus a scope) rebuilt on every render.
//! Rendering reads the form store fresh and returns a view tree whose nodes
//! carry the editor for that node; every mutation goes back through the
//! store's path-keyed operations.

mod badge;
mod condition;
mod exists;
mod group;
mod operator_selector;
mod scope;
mod value;

#[cfg(test)]
pub(crate) mod test_helpers;


pub use badge::*;
pub use condition::*;
pub use exists::*;
pub use group::*;
pub use operator_selector::*;
pub use scope::*;
pub use value::*;

use ahash::AHashMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::EditorConfig;
use crate::error::{RuleEditorError, Result};
use crate::lookup::{ColumnLookup, PermissionVariableLookup, TableLookup};
use crate::rule::{GroupNode, NodeId};
use crate::store::{FieldPath, FormStore, SetValueOptions};

/// Lookups the editor consumes
#[derive(Clone)]
pub struct Lookups {
    pub columns: Arc<dyn ColumnLookup>,
    pub tables: Arc<dyn TableLookup>,
    pub variables: Arc<dyn PermissionVariableLookup>,
}

impl Lookups {
    /// Serve all three lookups from one metadata source
    pub fn from_metadata<M>(metadata: M) -> Self
    where
        M: ColumnLookup + TableLookup + PermissionVariableLookup + 'static,
    {
        let metadata = Arc::new(metadata);
        Self {
            columns: metadata.clone(),
            tables: metadata.clone(),
            variables: metadata,
        }
    }
}

impl fmt::Debug for Lookups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookups").finish_non_exhaustive()
    }
}

/// Transient per-condition UI state, keyed by node id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionUiState {
    /// `schema.table` owning the selected column
    pub table_path: Option<String>,
    /// Underlying type of the selected column
    pub column_type: Option<String>,
}

/// Host form context the editor is mounted in
#[derive(Debug)]
pub struct EditorContext<S> {
    pub(crate) store: S,
    pub(crate) lookups: Lookups,
    pub(crate) config: EditorConfig,
    ui: AHashMap<NodeId, ConditionUiState>,
}

impl<S: FormStore> EditorContext<S> {
    pub fn new(store: S, lookups: Lookups, config: EditorConfig) -> Self {
        Self {
            store,
            lookups,
            config,
            ui: AHashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn condition_ui(&self, id: &NodeId) -> ConditionUiState {
        self.ui.get(id).cloned().unwrap_or_default()
    }

    pub(crate) fn set_condition_ui(&mut self, id: NodeId, state: ConditionUiState) {
        self.ui.insert(id, state);
    }

    /// Remove one child, refusing to empty the group
    pub(crate) fn splice_child(&mut self, children: &FieldPath, index: usize) -> Result<()> {
        let len = self
            .store
            .get_value(children)
            .and_then(|value| value.as_array().map(Vec::len))
            .unwrap_or(0);
        if len <= 1 {
            return Err(RuleEditorError::LastChild(children.to_string()));
        }

        let removed = self.store.remove(children, index)?;
        self.evict_condition_ui(children, &removed);
        debug!(children = %children, index, remaining = len - 1, "removed child");
        Ok(())
    }

    /// Forget UI state of the removed subtree and of path-keyed siblings
    /// whose paths now point at other nodes
    fn evict_condition_ui(&mut self, children: &FieldPath, removed: &Value) {
        let mut ids = Vec::new();
        collect_ids(removed, &mut ids);
        for id in &ids {
            self.ui.remove(&NodeId::from(id.as_str()));
        }

        let shifted = format!("{}.", children);
        self.ui.retain(|id, _| !id.as_str().starts_with(&shifted));
    }
}

fn collect_ids(value: &Value, ids: &mut Vec<String>) {
    match value {
        Value::Object(object) => {
            if let Some(id) = object.get("id").and_then(Value::as_str) {
                ids.push(id.to_string());
            }
            object.values().for_each(|child| collect_ids(child, ids));
        }
        Value::Array(items) => items.iter().for_each(|item| collect_ids(item, ids)),
        _ => {}
    }
}

/// Host-supplied removal of the whole rule
pub type HostRemove = Arc<dyn Fn(&mut dyn FormStore) -> Result<()> + Send + Sync>;

/// What "remove" does for an editor, supplied by its parent
#[derive(Clone)]
pub enum RemoveAction {
    /// Splice this node out of its parent's children
    Splice { children: FieldPath, index: usize },
    Host(HostRemove),
}

impl RemoveAction {
    pub(crate) fn invoke<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<()> {
        match self {
            RemoveAction::Splice { children, index } => ctx.splice_child(children, *index),
            RemoveAction::Host(remove) => {
                remove(&mut ctx.store as &mut dyn FormStore)?;
                ctx.ui.clear();
                Ok(())
            }
        }
    }
}

impl fmt::Debug for RemoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveAction::Splice { children, index } => f
                .debug_struct("Splice")
                .field("children", &children.to_string())
                .field("index", index)
                .finish(),
            RemoveAction::Host(_) => f.write_str("Host"),
        }
    }
}

/// A rendered remove/delete control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveControl {
    pub disabled: bool,
}

/// Run the remove action an editor was given
///
/// Splices always refuse to empty a group; host actions honour
/// `disable_remove`.
pub(crate) fn invoke_remove<S: FormStore>(
    ctx: &mut EditorContext<S>,
    path: &FieldPath,
    on_remove: Option<&RemoveAction>,
    disable_remove: bool,
) -> Result<()> {
    match on_remove {
        None => Err(RuleEditorError::Disabled(format!("{} has no remove action", path))),
        Some(RemoveAction::Host(_)) if disable_remove => {
            Err(RuleEditorError::Disabled(path.to_string()))
        }
        Some(action) => action.invoke(ctx),
    }
}

/// Read the object stored at `path`
pub(crate) fn read_object(
    store: &mut impl FormStore,
    path: &FieldPath,
    expected: &'static str,
) -> Result<Map<String, Value>> {
    match store.watch(path) {
        Some(Value::Object(object)) => Ok(object),
        Some(_) => Err(RuleEditorError::UnexpectedNode {
            path: path.to_string(),
            expected,
        }),
        None => Err(RuleEditorError::NodeNotFound(path.to_string())),
    }
}

pub(crate) fn string_field(object: &Map<String, Value>, field: &str) -> String {
    object
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Id of a stored node, falling back to its path for nodes without one
pub(crate) fn node_id(object: &Map<String, Value>, path: &FieldPath) -> NodeId {
    match object.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => NodeId::from(id),
        _ => NodeId::from(path.to_string().as_str()),
    }
}

/// Read a stored group back as typed data
pub fn read_group<S: FormStore>(store: &S, path: &FieldPath) -> Result<GroupNode> {
    let value = store
        .get_value(path)
        .ok_or_else(|| RuleEditorError::NodeNotFound(path.to_string()))?;
    Ok(serde_json::from_value(value)?)
}

/// Store a whole group at `path`
pub fn write_group<S: FormStore>(
    store: &mut S,
    path: &FieldPath,
    group: &GroupNode,
    options: SetValueOptions,
) -> Result<()> {
    store.set_value(path, serde_json::to_value(group)?, options)
}

/// Props of the root editor
#[derive(Clone, Default)]
pub struct RuleGroupEditorProps {
    /// Dotted path of the root group in the form
    pub name: String,
    pub schema: String,
    pub table: String,
    pub disabled: bool,
    /// Overrides [`EditorConfig::max_depth`]
    pub max_depth: Option<usize>,
    pub on_remove: Option<HostRemove>,
    pub disable_remove: bool,
}

impl RuleGroupEditorProps {
    pub fn new(name: &str, schema: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for RuleGroupEditorProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleGroupEditorProps")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("disabled", &self.disabled)
            .field("max_depth", &self.max_depth)
            .field("on_remove", &self.on_remove.is_some())
            .field("disable_remove", &self.disable_remove)
            .finish()
    }
}

/// Root entry point mounted inside a host form
#[derive(Debug, Clone)]
pub struct RuleGroupEditor {
    root: GroupEditor,
}

impl RuleGroupEditor {
    /// Mount under `props.name`
    ///
    /// Fails fast without a form context or when the path does not hold a
    /// group.
    pub fn mount<S: FormStore>(
        ctx: Option<&EditorContext<S>>,
        props: RuleGroupEditorProps,
    ) -> Result<Self> {
        let ctx = ctx.ok_or(RuleEditorError::OutsideFormContext)?;
        let path = FieldPath::parse(&props.name)?;

        match ctx.store.get_value(&path) {
            Some(Value::Object(object)) if object.get("children").is_some_and(Value::is_array) => {}
            Some(_) => {
                return Err(RuleEditorError::UnexpectedNode {
                    path: path.to_string(),
                    expected: "group",
                })
            }
            None => return Err(RuleEditorError::NodeNotFound(path.to_string())),
        }

        let scope = EditorScope::root(&props.schema, &props.table)
            .with_disabled(props.disabled)
            .with_max_depth(props.max_depth.or(ctx.config.max_depth));
        debug!(path = %path, table = %scope.table_path(), "mounted rule editor");

        let mut root = GroupEditor::new(path, scope);
        if let Some(on_remove) = props.on_remove {
            root = root.with_remove(RemoveAction::Host(on_remove), props.disable_remove);
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &GroupEditor {
        &self.root
    }

    pub fn render<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<GroupView> {
        self.root.render(ctx)
    }

    /// The tree as the host reads it back at submit time
    pub fn read_tree<S: FormStore>(&self, ctx: &EditorContext<S>) -> Result<GroupNode> {
        read_group(&ctx.store, self.root.path())
    }
}
