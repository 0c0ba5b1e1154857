//! Whole-record transformation.
//!
//! Rebuilds a `serde_json::Value` tree with every object key renamed for
//! the target convention. Primitives pass through untouched, array order is
//! preserved, and the input is never mutated. The traversal keeps its own
//! stack of partially built containers, so nesting depth is bounded by heap
//! rather than by the call stack.

use serde_json::{Map, Value};

use crate::fields::{field_name_to_external, field_name_to_internal};

/// Target convention for a transformation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// External (Rally) names → internal kebab names.
    ToInternal,
    /// Internal kebab names → external (Rally) names.
    ToExternal,
}

impl Direction {
    fn rename(self, key: &str) -> String {
        match self {
            Direction::ToInternal => field_name_to_internal(key),
            Direction::ToExternal => field_name_to_external(key),
        }
    }
}

/// Convert an external record to the internal convention.
pub fn to_internal(record: &Value) -> Value {
    transform(record, Direction::ToInternal)
}

/// Convert an internal record back to the external convention.
pub fn to_external(record: &Value) -> Value {
    transform(record, Direction::ToExternal)
}

enum Frame<'a> {
    Seq {
        rest: std::slice::Iter<'a, Value>,
        done: Vec<Value>,
    },
    Map {
        rest: serde_json::map::Iter<'a>,
        done: Map<String, Value>,
        pending_key: String,
    },
}

/// Rebuild `record` with every object key renamed for `direction`.
pub fn transform(record: &Value, direction: Direction) -> Value {
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut current: &Value = record;

    loop {
        // Descend until `current` resolves to a finished value: a cloned
        // primitive, an empty container, or a container whose first child
        // has been pushed for processing.
        let mut finished: Value = loop {
            match current {
                Value::Array(items) => {
                    let mut rest = items.iter();
                    match rest.next() {
                        Some(first) => {
                            stack.push(Frame::Seq {
                                rest,
                                done: Vec::with_capacity(items.len()),
                            });
                            current = first;
                        }
                        None => break Value::Array(Vec::new()),
                    }
                }
                Value::Object(entries) => {
                    let mut rest = entries.iter();
                    match rest.next() {
                        Some((key, value)) => {
                            stack.push(Frame::Map {
                                rest,
                                done: Map::new(),
                                pending_key: direction.rename(key),
                            });
                            current = value;
                        }
                        None => break Value::Object(Map::new()),
                    }
                }
                leaf => break leaf.clone(),
            }
        };

        // Feed the finished value upward. Containers close one by one until
        // a sibling remains to descend into, or the stack empties.
        loop {
            match stack.pop() {
                None => return finished,
                Some(Frame::Seq { mut rest, mut done }) => {
                    done.push(finished);
                    match rest.next() {
                        Some(next) => {
                            stack.push(Frame::Seq { rest, done });
                            current = next;
                            break;
                        }
                        None => finished = Value::Array(done),
                    }
                }
                Some(Frame::Map {
                    mut rest,
                    mut done,
                    pending_key,
                }) => {
                    done.insert(pending_key, finished);
                    match rest.next() {
                        Some((key, value)) => {
                            stack.push(Frame::Map {
                                rest,
                                done,
                                pending_key: direction.rename(key),
                            });
                            current = value;
                            break;
                        }
                        None => finished = Value::Object(done),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_pass_through() {
        assert_eq!(to_internal(&json!(null)), json!(null));
        assert_eq!(to_internal(&json!(5)), json!(5));
        assert_eq!(to_internal(&json!("x")), json!("x"));
        assert_eq!(to_internal(&json!(true)), json!(true));
        assert_eq!(to_external(&json!(2.5)), json!(2.5));
    }

    #[test]
    fn empty_containers_keep_their_kind() {
        assert_eq!(to_internal(&json!({})), json!({}));
        assert_eq!(to_internal(&json!([])), json!([]));
    }

    #[test]
    fn story_record_converts_and_round_trips() {
        let external = json!({
            "FormattedID": "US1234",
            "PlanEstimate": 5,
            "_ref": "https://x/123",
            "c_CustomPriority": "High"
        });
        let internal = to_internal(&external);
        assert_eq!(
            internal,
            json!({
                "formatted-id": "US1234",
                "plan-estimate": 5,
                "metadata-ref": "https://x/123",
                "custom-custom-priority": "High"
            })
        );
        assert_eq!(to_external(&internal), external);
    }

    #[test]
    fn arrays_transform_elementwise_in_order() {
        let external = json!([
            {"FormattedID": "US1"},
            7,
            "plain",
            {"Tasks": [{"ToDo": 3.0}]}
        ]);
        let internal = to_internal(&external);
        assert_eq!(
            internal,
            json!([
                {"formatted-id": "US1"},
                7,
                "plain",
                {"tasks": [{"to-do": 3.0}]}
            ])
        );
        assert_eq!(to_external(&internal), external);
    }

    #[test]
    fn structure_is_preserved() {
        let external = json!({
            "Name": "story",
            "Tags": [1, 2, 3],
            "Owner": {"_refObjectName": "someone", "DisplayName": "Someone"}
        });
        let internal = to_internal(&external);
        let obj = internal.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["tags"].as_array().unwrap().len(), 3);
        assert_eq!(obj["owner"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn deep_nesting_does_not_overflow() {
        let mut value = json!("leaf");
        for _ in 0..500 {
            let mut map = Map::new();
            map.insert("PlanEstimate".to_string(), value);
            value = Value::Object(map);
        }

        let mut cursor = to_internal(&value);
        let mut depth = 0;
        while let Value::Object(map) = cursor {
            assert_eq!(map.len(), 1);
            cursor = map
                .into_iter()
                .map(|(key, inner)| {
                    assert_eq!(key, "plan-estimate");
                    inner
                })
                .next()
                .unwrap();
            depth += 1;
        }
        assert_eq!(depth, 500);
        assert_eq!(cursor, json!("leaf"));
    }

    #[test]
    fn deep_arrays_do_not_overflow() {
        let mut value = json!(0);
        for _ in 0..500 {
            value = Value::Array(vec![value]);
        }
        let transformed = to_external(&value);
        assert_eq!(transformed, value);
    }

    #[test]
    fn input_is_not_mutated() {
        let external = json!({"FormattedID": "DE17", "_type": "Defect"});
        let copy = external.clone();
        let _ = to_internal(&external);
        assert_eq!(external, copy);
    }
}
