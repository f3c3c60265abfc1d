//! Property tests for the form store
//!
//! Property 1: array helpers behave like a plain vector
//! Property 2: dotted paths survive display and parse

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::store::{FieldPath, FormStore, MemoryFormStore, PathSegment};

#[derive(Debug, Clone)]
enum ArrayOp {
    Append(u8),
    Remove(usize),
}

fn array_op_strategy() -> impl Strategy<Value = ArrayOp> {
    prop_oneof![
        any::<u8>().prop_map(ArrayOp::Append),
        (0..8usize).prop_map(ArrayOp::Remove),
    ]
}

fn segment_strategy() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
        "[a-z_][a-z0-9_]{0,6}".prop_map(PathSegment::Key),
        (0..50usize).prop_map(PathSegment::Index),
    ]
}

proptest! {
    /// Property 1.1: append/remove mirror Vec::push/Vec::remove
    #[test]
    fn prop_array_helpers_match_vec(ops in prop::collection::vec(array_op_strategy(), 1..40)) {
        let path = FieldPath::parse("rule.children").unwrap();
        let mut store = MemoryFormStore::with_values(json!({ "rule": { "children": [] } }));
        let mut model: Vec<Value> = Vec::new();

        for op in ops {
            match op {
                ArrayOp::Append(n) => {
                    let index = store.append(&path, json!(n)).unwrap();
                    model.push(json!(n));
                    prop_assert_eq!(index, model.len() - 1);
                }
                ArrayOp::Remove(index) => {
                    let result = store.remove(&path, index);
                    if index < model.len() {
                        prop_assert_eq!(result.unwrap(), model.remove(index));
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
            }
            prop_assert_eq!(store.get_value(&path), Some(Value::Array(model.clone())));
        }
    }

    /// Property 2.1: display then parse yields the same path
    #[test]
    fn prop_path_display_parse(segments in prop::collection::vec(segment_strategy(), 0..10)) {
        let path: FieldPath = segments.into_iter().collect();
        let parsed = FieldPath::parse(&path.to_string()).unwrap();
        prop_assert_eq!(parsed, path);
    }
}
