//! Group editor: the recursive core of the rule tree editor

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::editor::{
    invoke_remove, read_object, BadgeView, ConditionEditor, ConditionView, EditorContext,
    EditorScope, ExistsEditor, ExistsView, OperatorBadge, RemoveAction, RemoveControl,
};
use crate::error::{RuleEditorError, Result};
use crate::rule::{ConditionNode, ExistsNode, GroupNode, NodeId, RuleNode};
use crate::store::{FieldPath, FormStore};

/// Editor for one group node
#[derive(Debug, Clone)]
pub struct GroupEditor {
    path: FieldPath,
    scope: EditorScope,
    on_remove: Option<RemoveAction>,
    disable_remove: bool,
}

/// One rendered child slot
#[derive(Debug, Clone)]
pub enum ChildView {
    Condition(ConditionView),
    Group(GroupView),
    Exists(ExistsView),
    /// Index with no renderable node, e.g. mid-removal
    Vacant { index: usize },
}

/// Rendered group
#[derive(Debug, Clone)]
pub struct GroupView {
    pub id: Option<NodeId>,
    pub editor: GroupEditor,
    pub depth: usize,
    pub badge: BadgeView,
    pub children: Vec<ChildView>,
    pub can_add_group: bool,
    /// Whether the "+ Exists" control is offered at all
    pub can_add_exists: bool,
    /// "Delete group" control; absent when the parent gave no remove action
    pub delete: Option<RemoveControl>,
    pub disabled: bool,
}

impl GroupView {
    /// Rebuild the node this view was rendered from; vacant slots are skipped
    pub fn to_node(&self) -> GroupNode {
        GroupNode {
            id: self.id.clone().unwrap_or_else(NodeId::fresh),
            operator: self.badge.operator,
            children: self
                .children
                .iter()
                .filter_map(|child| match child {
                    ChildView::Condition(view) => Some(RuleNode::Condition(view.to_node())),
                    ChildView::Group(view) => Some(RuleNode::Group(view.to_node())),
                    ChildView::Exists(view) => Some(RuleNode::Exists(view.to_node())),
                    ChildView::Vacant { .. } => None,
                })
                .collect(),
        }
    }

    pub fn child(&self, index: usize) -> Option<&ChildView> {
        self.children.get(index)
    }
}

impl ChildView {
    pub fn as_condition(&self) -> Option<&ConditionView> {
        match self {
            ChildView::Condition(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupView> {
        match self {
            ChildView::Group(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_exists(&self) -> Option<&ExistsView> {
        match self {
            ChildView::Exists(view) => Some(view),
            _ => None,
        }
    }
}

impl GroupEditor {
    pub fn new(path: FieldPath, scope: EditorScope) -> Self {
        Self {
            path,
            scope,
            on_remove: None,
            disable_remove: false,
        }
    }

    pub fn with_remove(mut self, on_remove: RemoveAction, disable_remove: bool) -> Self {
        self.on_remove = Some(on_remove);
        self.disable_remove = disable_remove;
        self
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn scope(&self) -> &EditorScope {
        &self.scope
    }

    fn children_path(&self) -> FieldPath {
        self.path.key("children")
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.scope.disabled {
            return Err(RuleEditorError::Disabled(self.path.to_string()));
        }
        Ok(())
    }

    /// Render this group and, recursively, every child
    pub fn render<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<GroupView> {
        let object = read_object(&mut ctx.store, &self.path, "group")?;
        let id = object
            .get("id")
            .and_then(Value::as_str)
            .map(NodeId::from);
        trace!(path = %self.path, depth = self.scope.depth, "render group");

        let badge = self.badge().render(ctx);

        let children_path = self.children_path();
        let children = match ctx.store.watch(&children_path) {
            Some(Value::Array(children)) => children,
            _ => Vec::new(),
        };
        let last_child = children.len() <= 1;

        let mut views = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let remove = RemoveAction::Splice {
                children: children_path.clone(),
                index,
            };
            let disable_remove = self.scope.disabled || last_child;
            views.push(self.render_child(ctx, index, child, remove, disable_remove));
        }

        Ok(GroupView {
            id,
            editor: self.clone(),
            depth: self.scope.depth,
            badge,
            children: views,
            can_add_group: !self.scope.disabled && self.scope.can_add_group(),
            can_add_exists: self.scope.allow_exists_nodes,
            delete: self.on_remove.as_ref().map(|_| RemoveControl {
                disabled: self.scope.disabled || self.disable_remove,
            }),
            disabled: self.scope.disabled,
        })
    }

    fn render_child<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        index: usize,
        child: &Value,
        remove: RemoveAction,
        disable_remove: bool,
    ) -> ChildView {
        let path = self.children_path().index(index);
        let kind = child.get("type").and_then(Value::as_str);

        let rendered = match kind {
            Some("condition") => ConditionEditor::new(path.clone(), self.scope.clone())
                .with_remove(remove, disable_remove)
                .render(ctx)
                .map(ChildView::Condition),
            Some("group") => GroupEditor::new(path.clone(), self.scope.nested_group())
                .with_remove(remove, disable_remove)
                .render(ctx)
                .map(ChildView::Group),
            Some("exists") => {
                if !self.scope.allow_exists_nodes {
                    warn!(path = %path, "exists clause nested inside another exists clause");
                }
                ExistsEditor::new(path.clone(), self.scope.clone())
                    .with_remove(remove, disable_remove)
                    .render(ctx)
                    .map(ChildView::Exists)
            }
            _ => {
                warn!(path = %path, "no renderable node at child index");
                return ChildView::Vacant { index };
            }
        };

        rendered.unwrap_or_else(|err| {
            warn!(path = %path, error = %err, "skipping child that failed to render");
            ChildView::Vacant { index }
        })
    }

    fn append_child<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        node: RuleNode,
    ) -> Result<usize> {
        let kind = node.kind();
        let id = node.id().clone();
        let index = ctx
            .store
            .append(&self.children_path(), serde_json::to_value(&node)?)?;
        debug!(path = %self.path, kind, id = %id, index, "added child");
        Ok(index)
    }

    /// Append a default condition; returns its index
    pub fn add_rule<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<usize> {
        self.ensure_enabled()?;
        self.append_child(ctx, RuleNode::Condition(ConditionNode::new()))
    }

    /// Append an AND group holding one default condition
    pub fn add_group<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<usize> {
        self.ensure_enabled()?;
        if !self.scope.can_add_group() {
            return Err(RuleEditorError::DepthLimit {
                depth: self.scope.depth,
                max_depth: self.scope.max_depth.unwrap_or_default(),
            });
        }
        self.append_child(ctx, RuleNode::Group(GroupNode::new()))
    }

    /// Append an exists clause with no table and a default `where`
    pub fn add_exists<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<usize> {
        self.ensure_enabled()?;
        if !self.scope.allow_exists_nodes {
            return Err(RuleEditorError::ExistsNotAllowed(self.path.to_string()));
        }
        self.append_child(ctx, RuleNode::Exists(ExistsNode::new()))
    }

    /// Splice out the child at `index`; refused for the last child
    pub fn remove_child<S: FormStore>(
        &self,
        ctx: &mut EditorContext<S>,
        index: usize,
    ) -> Result<()> {
        self.ensure_enabled()?;
        ctx.splice_child(&self.children_path(), index)
    }

    /// Delete this group through the action its parent supplied
    pub fn delete<S: FormStore>(&self, ctx: &mut EditorContext<S>) -> Result<()> {
        self.ensure_enabled()?;
        invoke_remove(ctx, &self.path, self.on_remove.as_ref(), self.disable_remove)
    }

    /// The operator badge of this group
    pub fn badge(&self) -> OperatorBadge {
        OperatorBadge::new(self.path.clone(), self.scope.depth, self.scope.disabled)
    }
}
