//! In-memory form store

use ahash::{AHashMap, AHashSet};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{RuleEditorError, Result};
use crate::store::{FieldPath, FormStore, PathSegment, SetValueOptions};

/// Form store over a single JSON document
///
/// Tracks dirty paths, per-field validation errors and watched paths.
/// Every write invalidates the watched paths it overlaps; hosts drain them
/// with [`MemoryFormStore::take_invalidated`] to decide what to re-render.
#[derive(Debug, Clone)]
pub struct MemoryFormStore {
    values: Value,
    dirty: AHashSet<FieldPath>,
    errors: AHashMap<FieldPath, String>,
    watched: AHashSet<FieldPath>,
    invalidated: Vec<FieldPath>,
}

impl Default for MemoryFormStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::with_values(Value::Object(Map::new()))
    }

    /// Start from existing form values, all pristine
    pub fn with_values(values: Value) -> Self {
        Self {
            values,
            dirty: AHashSet::new(),
            errors: AHashMap::new(),
            watched: AHashSet::new(),
            invalidated: Vec::new(),
        }
    }

    /// The whole document, as the host reads it at submit time
    pub fn values(&self) -> &Value {
        &self.values
    }

    /// Watched paths written since the last call, in path order
    pub fn take_invalidated(&mut self) -> Vec<FieldPath> {
        let mut invalidated = std::mem::take(&mut self.invalidated);
        invalidated.sort();
        invalidated
    }

    fn resolve(&self, path: &FieldPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(&self.values, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object()?.get(key),
                PathSegment::Index(index) => current.as_array()?.get(*index),
            })
    }

    fn resolve_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        path.segments()
            .iter()
            .try_fold(&mut self.values, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object_mut()?.get_mut(key),
                PathSegment::Index(index) => current.as_array_mut()?.get_mut(*index),
            })
    }

    /// Walk to `path`, creating missing objects, arrays and trailing slots
    fn resolve_or_create(&mut self, path: &FieldPath) -> Result<&mut Value> {
        let mut current = &mut self.values;

        for (depth, segment) in path.segments().iter().enumerate() {
            current = match segment {
                PathSegment::Key(key) => {
                    if current.is_null() {
                        *current = Value::Object(Map::new());
                    }
                    match current {
                        Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                        _ => return Err(RuleEditorError::PathConflict(prefix(path, depth))),
                    }
                }
                PathSegment::Index(index) => {
                    if current.is_null() {
                        *current = Value::Array(Vec::new());
                    }
                    match current {
                        Value::Array(items) => {
                            let len = items.len();
                            if *index == len {
                                items.push(Value::Null);
                            } else if *index > len {
                                return Err(RuleEditorError::IndexOutOfBounds {
                                    path: prefix(path, depth),
                                    index: *index,
                                    len,
                                });
                            }
                            &mut items[*index]
                        }
                        _ => return Err(RuleEditorError::PathConflict(prefix(path, depth))),
                    }
                }
            };
        }

        Ok(current)
    }

    fn invalidate(&mut self, written: &FieldPath) {
        for watched in &self.watched {
            if watched.overlaps(written) && !self.invalidated.contains(watched) {
                self.invalidated.push(watched.clone());
            }
        }
    }

    /// Watchers on the removed element and every later sibling now see
    /// different data; they are invalidated and dropped until re-watched
    fn invalidate_shifted(&mut self, array_path: &FieldPath, removed: usize) {
        let shifted: Vec<FieldPath> = self
            .watched
            .iter()
            .filter(|watched| element_index(watched, array_path).is_some_and(|i| i >= removed))
            .cloned()
            .collect();

        for watched in shifted {
            self.watched.remove(&watched);
            if !self.invalidated.contains(&watched) {
                self.invalidated.push(watched);
            }
        }
    }

    /// Drop state recorded for the removed element and shift later siblings down
    fn reindex_after_removal(&mut self, array_path: &FieldPath, removed: usize) {
        self.errors = std::mem::take(&mut self.errors)
            .into_iter()
            .filter_map(|(path, message)| {
                shift_down(&path, array_path, removed).map(|path| (path, message))
            })
            .collect();
        self.dirty = std::mem::take(&mut self.dirty)
            .into_iter()
            .filter_map(|path| shift_down(&path, array_path, removed))
            .collect();
    }
}

fn prefix(path: &FieldPath, depth: usize) -> String {
    path.segments()[..depth]
        .iter()
        .cloned()
        .collect::<FieldPath>()
        .to_string()
}

/// Index of the element of `array_path` that `path` points into
fn element_index(path: &FieldPath, array_path: &FieldPath) -> Option<usize> {
    if !path.starts_with(array_path) {
        return None;
    }
    match path.segments().get(array_path.len())? {
        PathSegment::Index(index) => Some(*index),
        PathSegment::Key(_) => None,
    }
}

fn shift_down(path: &FieldPath, array_path: &FieldPath, removed: usize) -> Option<FieldPath> {
    if !path.starts_with(array_path) || path.len() == array_path.len() {
        return Some(path.clone());
    }

    let position = array_path.len();
    match path.segments()[position] {
        PathSegment::Index(index) if index == removed => None,
        PathSegment::Index(index) if index > removed => Some(
            path.segments()
                .iter()
                .enumerate()
                .map(|(i, segment)| {
                    if i == position {
                        PathSegment::Index(index - 1)
                    } else {
                        segment.clone()
                    }
                })
                .collect(),
        ),
        _ => Some(path.clone()),
    }
}

impl FormStore for MemoryFormStore {
    fn get_value(&self, path: &FieldPath) -> Option<Value> {
        self.resolve(path).cloned()
    }

    fn set_value(
        &mut self,
        path: &FieldPath,
        value: Value,
        options: SetValueOptions,
    ) -> Result<()> {
        trace!(path = %path, "set value");
        *self.resolve_or_create(path)? = value;
        if options.should_dirty {
            self.dirty.insert(path.clone());
        }
        self.invalidate(path);
        Ok(())
    }

    fn watch(&mut self, path: &FieldPath) -> Option<Value> {
        self.watched.insert(path.clone());
        self.get_value(path)
    }

    fn clear_errors(&mut self, path: Option<&FieldPath>) {
        match path {
            Some(path) => self.errors.retain(|field, _| !field.starts_with(path)),
            None => self.errors.clear(),
        }
    }

    fn set_error(&mut self, path: &FieldPath, message: String) {
        self.errors.insert(path.clone(), message);
    }

    fn error(&self, path: &FieldPath) -> Option<String> {
        self.errors.get(path).cloned()
    }

    fn is_dirty(&self, path: &FieldPath) -> bool {
        self.dirty.iter().any(|dirty| dirty.starts_with(path))
    }

    fn append(&mut self, array_path: &FieldPath, item: Value) -> Result<usize> {
        let slot = self.resolve_or_create(array_path)?;
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        let index = match slot {
            Value::Array(items) => {
                items.push(item);
                items.len() - 1
            }
            _ => return Err(RuleEditorError::PathConflict(array_path.to_string())),
        };

        trace!(path = %array_path, index, "append");
        self.dirty.insert(array_path.clone());
        self.invalidate(&array_path.index(index));
        Ok(index)
    }

    fn remove(&mut self, array_path: &FieldPath, index: usize) -> Result<Value> {
        let items = self
            .resolve_mut(array_path)
            .ok_or_else(|| RuleEditorError::NodeNotFound(array_path.to_string()))?
            .as_array_mut()
            .ok_or_else(|| RuleEditorError::UnexpectedNode {
                path: array_path.to_string(),
                expected: "array",
            })?;
        if index >= items.len() {
            return Err(RuleEditorError::IndexOutOfBounds {
                path: array_path.to_string(),
                index,
                len: items.len(),
            });
        }
        let removed = items.remove(index);

        trace!(path = %array_path, index, "remove");
        self.reindex_after_removal(array_path, index);
        self.dirty.insert(array_path.clone());
        self.invalidate(&array_path.index(index));
        self.invalidate_shifted(array_path, index);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut store = MemoryFormStore::new();
        store
            .set_value(&path("rule.operator"), json!("_or"), SetValueOptions::DIRTY)
            .unwrap();
        assert_eq!(store.values(), &json!({ "rule": { "operator": "_or" } }));
        assert!(store.is_dirty(&path("rule")));
        assert!(store.is_dirty(&path("rule.operator")));
    }

    #[test]
    fn test_pristine_write_is_not_dirty() {
        let mut store = MemoryFormStore::new();
        store
            .set_value(&path("rule.column"), json!("name"), SetValueOptions::PRISTINE)
            .unwrap();
        assert!(!store.is_dirty(&path("rule.column")));
    }

    #[test]
    fn test_set_through_scalar_conflicts() {
        let mut store = MemoryFormStore::with_values(json!({ "rule": 5 }));
        let result = store.set_value(&path("rule.children"), json!([]), SetValueOptions::DIRTY);
        assert!(matches!(result, Err(RuleEditorError::PathConflict(p)) if p == "rule"));
    }

    #[test]
    fn test_set_past_end_of_array_fails() {
        let mut store = MemoryFormStore::with_values(json!({ "items": [1] }));
        let result = store.set_value(&path("items.3"), json!(4), SetValueOptions::DIRTY);
        assert!(matches!(
            result,
            Err(RuleEditorError::IndexOutOfBounds { index: 3, len: 1, .. })
        ));
    }

    #[test]
    fn test_append_and_remove() {
        let mut store = MemoryFormStore::with_values(json!({ "items": ["a", "b"] }));
        assert_eq!(store.append(&path("items"), json!("c")).unwrap(), 2);
        assert_eq!(store.remove(&path("items"), 0).unwrap(), json!("a"));
        assert_eq!(store.get_value(&path("items")), Some(json!(["b", "c"])));
        assert!(store.remove(&path("items"), 5).is_err());
    }

    #[test]
    fn test_remove_reindexes_errors() {
        let mut store = MemoryFormStore::with_values(json!({ "items": [{}, {}, {}] }));
        store.set_error(&path("items.0.value"), "first".to_string());
        store.set_error(&path("items.1.value"), "second".to_string());
        store.set_error(&path("items.2.value"), "third".to_string());

        store.remove(&path("items"), 1).unwrap();

        assert_eq!(store.error(&path("items.0.value")), Some("first".to_string()));
        assert_eq!(store.error(&path("items.1.value")), Some("third".to_string()));
        assert_eq!(store.error(&path("items.2.value")), None);
    }

    #[test]
    fn test_clear_errors_under_path() {
        let mut store = MemoryFormStore::new();
        store.set_error(&path("rule.children.0.value"), "required".to_string());
        store.set_error(&path("rule.children.1.value"), "required".to_string());

        store.clear_errors(Some(&path("rule.children.0")));
        assert_eq!(store.error(&path("rule.children.0.value")), None);
        assert!(store.error(&path("rule.children.1.value")).is_some());

        store.clear_errors(None);
        assert_eq!(store.error(&path("rule.children.1.value")), None);
    }

    #[test]
    fn test_watch_invalidation() {
        let mut store = MemoryFormStore::with_values(json!({ "rule": { "children": [] } }));
        store.watch(&path("rule.children"));
        store.watch(&path("rule.operator"));

        store.append(&path("rule.children"), json!({})).unwrap();
        store
            .set_value(&path("rule.children.0.value"), json!("x"), SetValueOptions::DIRTY)
            .unwrap();

        assert_eq!(store.take_invalidated(), vec![path("rule.children")]);
        assert!(store.take_invalidated().is_empty());

        store
            .set_value(&path("rule"), json!({ "operator": "_or" }), SetValueOptions::DIRTY)
            .unwrap();
        assert_eq!(
            store.take_invalidated(),
            vec![path("rule.children"), path("rule.operator")]
        );
    }

    #[test]
    fn test_remove_invalidates_shifted_siblings() {
        let mut store = MemoryFormStore::with_values(json!({
            "rule": { "children": [{}, {}, { "value": 3 }] }
        }));
        store.watch(&path("rule.operator"));
        store.watch(&path("rule.children.0.value"));
        store.watch(&path("rule.children.2.value"));

        store.remove(&path("rule.children"), 0).unwrap();

        assert_eq!(
            store.take_invalidated(),
            vec![path("rule.children.0.value"), path("rule.children.2.value")]
        );
        assert_eq!(store.get_value(&path("rule.children.2.value")), None);

        // dropped watchers stay quiet until a render watches them again
        store
            .set_value(&path("rule.children.1.value"), json!(4), SetValueOptions::DIRTY)
            .unwrap();
        assert!(store.take_invalidated().is_empty());
        assert_eq!(store.watch(&path("rule.children.1.value")), Some(json!(4)));
    }
}
