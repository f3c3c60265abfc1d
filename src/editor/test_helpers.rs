//! Shared fixtures for the editor tests

use serde_json::{json, Value};

use crate::config::EditorConfig;
use crate::editor::{EditorContext, Lookups, RuleGroupEditor, RuleGroupEditorProps};
use crate::lookup::StaticMetadata;
use crate::store::{FormStore, MemoryFormStore};

pub(crate) fn metadata() -> StaticMetadata {
    StaticMetadata::new()
        .with_table(
            "public",
            "users",
            &[("id", "uuid"), ("name", "text"), ("age", "int4"), ("profile", "jsonb")],
        )
        .with_table(
            "public",
            "posts",
            &[("id", "uuid"), ("author_id", "uuid"), ("title", "text")],
        )
        .with_table("public", "members", &[("user_id", "uuid"), ("org_id", "uuid")])
        .with_claims("p1", &["Org-Id"])
}

/// Context whose store holds `{"rule": rule}`
pub(crate) fn context_with(rule: Value) -> EditorContext<MemoryFormStore> {
    let config = EditorConfig {
        project_id: Some("p1".to_string()),
        ..EditorConfig::default()
    };
    EditorContext::new(
        MemoryFormStore::with_values(json!({ "rule": rule })),
        Lookups::from_metadata(metadata()),
        config,
    )
}

pub(crate) fn group_json(id: &str, children: &[Value]) -> Value {
    json!({
        "type": "group",
        "id": id,
        "operator": "_and",
        "children": children,
    })
}

pub(crate) fn condition_json(id: &str, column: &str) -> Value {
    json!({
        "type": "condition",
        "id": id,
        "column": column,
        "operator": "_eq",
        "value": null,
    })
}

/// Root editor on `rule` filtering `public.users`
pub(crate) fn mount<S: FormStore>(
    ctx: &EditorContext<S>,
    max_depth: Option<usize>,
) -> RuleGroupEditor {
    let mut props = RuleGroupEditorProps::new("rule", "public", "users");
    props.max_depth = max_depth;
    RuleGroupEditor::mount(Some(ctx), props).unwrap()
}
