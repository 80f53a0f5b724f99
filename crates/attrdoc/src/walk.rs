//! Path walking and pure path-directed transformation of value trees.
//!
//! [`walk`] descends read-only. [`transform`] rebuilds the nodes on the path
//! to a target, applying a caller-supplied function at the target and at every
//! ancestor on the way back up. Both are pure: the input tree is never
//! modified, and a failing transform yields no tree at all.

use crate::value::{Payload, ValueState};
use crate::{AttrError, AttrResult, Path, Step, Value, WireType};
use std::collections::BTreeMap;

/// Get the node at `path`.
///
/// On failure the returned [`AttrError::StepFailed`] names the consumed
/// prefix, the failing step and how many steps were left unconsumed.
///
/// # Examples
///
/// ```
/// use attrdoc::{path, walk, Value};
///
/// let doc = Value::object([("name", Value::string("foo"))]);
/// assert_eq!(walk(&doc, &path!("name")).unwrap().as_str(), Some("foo"));
/// assert_eq!(walk(&doc, &path!("missing", "x")).unwrap_err().remaining(), Some(2));
/// ```
pub fn walk<'a>(value: &'a Value, path: &Path) -> AttrResult<&'a Value> {
    let mut current = value;
    for (i, step) in path.steps().iter().enumerate() {
        current = apply_step(current, step).map_err(|reason| {
            AttrError::step_failed(path.slice(0, i), step.clone(), path.len() - i, reason)
        })?;
    }
    Ok(current)
}

fn apply_step<'a>(node: &'a Value, step: &Step) -> Result<&'a Value, String> {
    let payload = match node.state() {
        ValueState::Null => return Err("value is null".to_string()),
        ValueState::Unknown => return Err("value is unknown".to_string()),
        ValueState::Known(p) => p,
    };
    match (step, payload) {
        (Step::AttributeName(name), Payload::Object(attrs)) => attrs
            .get(name)
            .ok_or_else(|| format!("object has no attribute {:?}", name)),
        (Step::ElementKeyString(key), Payload::Map(entries)) => entries
            .get(key)
            .ok_or_else(|| format!("map has no key {:?}", key)),
        (Step::ElementKeyInt(idx), Payload::List(elems)) => elems
            .get(*idx)
            .ok_or_else(|| format!("index out of range (len: {})", elems.len())),
        (Step::ElementKeyValue(elem), Payload::Set(elems)) => elems
            .iter()
            .find(|e| *e == elem)
            .ok_or_else(|| "set has no such element".to_string()),
        _ => Err(format!("step does not apply to a {} value", node.ty())),
    }
}

/// Rebuild `root` with `f` applied along `path`.
///
/// `f` is called with the target node first and then with each ancestor,
/// deepest first, each already holding its rewritten child. Nodes off the
/// path are carried over unchanged. Every value returned by `f` must keep
/// the type of the node it replaces.
///
/// Descending into a null object materializes it as an object of null
/// attributes, and a missing map key is materialized as a null entry, so a
/// transform can place a value below a parent that does not exist yet.
///
/// # Examples
///
/// ```
/// use attrdoc::{path, transform, Value};
///
/// let doc = Value::object([("a", Value::string("x")), ("b", Value::bool(true))]);
/// let out = transform(&doc, &path!("a"), |p, v| {
///     if p == &path!("a") { Ok(Value::string("y")) } else { Ok(v) }
/// })
/// .unwrap();
/// assert_eq!(out.as_object().unwrap()["a"].as_str(), Some("y"));
/// assert_eq!(doc.as_object().unwrap()["a"].as_str(), Some("x"));
/// ```
pub fn transform<F>(root: &Value, path: &Path, mut f: F) -> AttrResult<Value>
where
    F: FnMut(&Path, Value) -> AttrResult<Value>,
{
    transform_at(root.clone(), &Path::root(), path.steps(), &mut f)
}

fn transform_at<F>(node: Value, current: &Path, rest: &[Step], f: &mut F) -> AttrResult<Value>
where
    F: FnMut(&Path, Value) -> AttrResult<Value>,
{
    let rebuilt = match rest {
        [] => node,
        [step, tail @ ..] => {
            let fail = |reason: String| {
                AttrError::step_failed(current.clone(), step.clone(), rest.len(), reason)
            };
            let node = materialize(node, step);
            let (ty, state) = node.into_parts();
            let payload = match state {
                ValueState::Known(p) => p,
                ValueState::Null => return Err(fail("value is null".to_string())),
                ValueState::Unknown => return Err(fail("value is unknown".to_string())),
            };
            let child_path = current.with_step(step.clone());
            let payload = match (step, payload) {
                (Step::AttributeName(name), Payload::Object(mut attrs)) => {
                    let child = attrs
                        .remove(name)
                        .ok_or_else(|| fail(format!("object has no attribute {:?}", name)))?;
                    let child = descend(child, &child_path, tail, f)?;
                    attrs.insert(name.clone(), child);
                    Payload::Object(attrs)
                }
                (Step::ElementKeyString(key), Payload::Map(mut entries)) => {
                    let child = match entries.remove(key) {
                        Some(child) => child,
                        None => match ty.element_type() {
                            Some(elem) => Value::null(elem.clone()),
                            None => return Err(fail("map has no element type".to_string())),
                        },
                    };
                    let child = descend(child, &child_path, tail, f)?;
                    entries.insert(key.clone(), child);
                    Payload::Map(entries)
                }
                (Step::ElementKeyInt(idx), Payload::List(mut elems)) => {
                    if *idx >= elems.len() {
                        return Err(fail(format!("index out of range (len: {})", elems.len())));
                    }
                    let child = elems[*idx].clone();
                    elems[*idx] = descend(child, &child_path, tail, f)?;
                    Payload::List(elems)
                }
                (Step::ElementKeyValue(elem), Payload::Set(mut elems)) => {
                    let pos = elems
                        .iter()
                        .position(|e| e == elem)
                        .ok_or_else(|| fail("set has no such element".to_string()))?;
                    let child = elems.remove(pos);
                    let child = descend(child, &child_path, tail, f)?;
                    elems.insert(pos, child);
                    Payload::Set(elems)
                }
                _ => return Err(fail(format!("step does not apply to a {} value", ty))),
            };
            Value::new(ty, payload).map_err(|e| e.with_prefix(current))?
        }
    };
    let expected = rebuilt.ty().clone();
    let out = f(current, rebuilt)?;
    out.expect_type(&expected, current)?;
    Ok(out)
}

fn descend<F>(child: Value, child_path: &Path, tail: &[Step], f: &mut F) -> AttrResult<Value>
where
    F: FnMut(&Path, Value) -> AttrResult<Value>,
{
    let expected = child.ty().clone();
    let out = transform_at(child, child_path, tail, f)?;
    out.expect_type(&expected, child_path)?;
    Ok(out)
}

fn materialize(node: Value, step: &Step) -> Value {
    if !node.is_null() {
        return node;
    }
    match step {
        Step::AttributeName(_) => match Value::object_of_nulls(node.ty()) {
            Some(obj) => obj,
            None => node,
        },
        Step::ElementKeyString(_) => match node.ty() {
            WireType::Map(elem) => Value::map((**elem).clone(), BTreeMap::new()).unwrap_or(node),
            _ => node,
        },
        _ => node,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    fn doc() -> Value {
        let tags: BTreeMap<String, Value> = [("env".to_string(), Value::string("prod"))].into();
        Value::object([
            ("name", Value::string("foo")),
            (
                "ports",
                Value::list(WireType::Number, vec![Value::number(80), Value::number(443)]).unwrap(),
            ),
            ("tags", Value::map(WireType::String, tags).unwrap()),
            (
                "zones",
                Value::set(WireType::String, vec![Value::string("a"), Value::string("b")])
                    .unwrap(),
            ),
        ])
    }

    #[test]
    fn test_walk_each_step_kind() {
        let d = doc();
        assert_eq!(walk(&d, &path!("name")).unwrap().as_str(), Some("foo"));
        assert_eq!(
            walk(&d, &path!("ports", 1)).unwrap().as_number(),
            Some(443.into())
        );
        assert_eq!(
            walk(&d, &path!("tags").key("env")).unwrap().as_str(),
            Some("prod")
        );
        assert_eq!(
            walk(&d, &path!("zones").element(Value::string("b")))
                .unwrap()
                .as_str(),
            Some("b")
        );
        assert_eq!(walk(&d, &Path::root()).unwrap(), &d);
    }

    #[test]
    fn test_walk_reports_remaining_steps() {
        let d = doc();
        let err = walk(&d, &path!("ports", 5, "x")).unwrap_err();
        match err {
            AttrError::StepFailed {
                path, remaining, ..
            } => {
                assert_eq!(path, path!("ports"));
                assert_eq!(remaining, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_walk_wrong_shape() {
        let d = doc();
        let err = walk(&d, &path!("name", "inner")).unwrap_err();
        assert_eq!(err.remaining(), Some(1));
        assert!(err.to_string().contains("String"));
    }

    #[test]
    fn test_identity_transform_is_noop() {
        let d = doc();
        for p in [
            Path::root(),
            path!("name"),
            path!("ports", 0),
            path!("tags").key("env"),
            path!("zones").element(Value::string("a")),
        ] {
            walk(&d, &p).unwrap();
            let out = transform(&d, &p, |_, v| Ok(v)).unwrap();
            assert_eq!(out, d, "identity transform changed tree at {p}");
        }
    }

    #[test]
    fn test_transform_replaces_only_target() {
        let d = doc();
        let out = transform(&d, &path!("ports", 0), |p, v| {
            if p == &path!("ports", 0) {
                Ok(Value::number(8080))
            } else {
                Ok(v)
            }
        })
        .unwrap();
        assert_eq!(walk(&out, &path!("ports", 0)).unwrap().as_number(), Some(8080.into()));
        assert_eq!(
            walk(&out, &path!("ports", 1)).unwrap(),
            walk(&d, &path!("ports", 1)).unwrap()
        );
        assert_eq!(walk(&out, &path!("name")).unwrap(), walk(&d, &path!("name")).unwrap());
        assert_eq!(walk(&d, &path!("ports", 0)).unwrap().as_number(), Some(80.into()));
    }

    #[test]
    fn test_transform_visits_ancestors_deepest_first() {
        let d = doc();
        let mut seen = Vec::new();
        transform(&d, &path!("ports", 1), |p, v| {
            seen.push(p.clone());
            Ok(v)
        })
        .unwrap();
        assert_eq!(seen, vec![path!("ports", 1), path!("ports"), Path::root()]);
    }

    #[test]
    fn test_transform_error_discards_result() {
        let d = doc();
        let err = transform(&d, &path!("name"), |p, _v| {
            if p.is_empty() {
                Err(AttrError::conversion("rejected at root"))
            } else {
                Ok(Value::string("changed"))
            }
        });
        assert!(err.is_err());
        assert_eq!(walk(&d, &path!("name")).unwrap().as_str(), Some("foo"));
    }

    #[test]
    fn test_transform_rejects_type_change() {
        let d = doc();
        let err = transform(&d, &path!("name"), |p, v| {
            if p == &path!("name") {
                Ok(Value::bool(true))
            } else {
                Ok(v)
            }
        })
        .unwrap_err();
        match err {
            AttrError::TypeMismatch { path, .. } => assert_eq!(path, path!("name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_transform_materializes_null_object() {
        let ty = WireType::object([
            ("name", WireType::String),
            ("nested", WireType::object([("x", WireType::Bool)])),
        ]);
        let root = Value::null(ty.clone());
        let out = transform(&root, &path!("nested", "x"), |p, v| {
            if p == &path!("nested", "x") {
                Ok(Value::bool(true))
            } else {
                Ok(v)
            }
        })
        .unwrap();
        assert_eq!(out.ty(), &ty);
        assert!(walk(&out, &path!("name")).unwrap().is_null());
        assert_eq!(walk(&out, &path!("nested", "x")).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_transform_inserts_missing_map_key() {
        let d = doc();
        let p = path!("tags").key("team");
        let out = transform(&d, &p, |q, v| {
            if q == &p {
                Ok(Value::string("core"))
            } else {
                Ok(v)
            }
        })
        .unwrap();
        assert_eq!(walk(&out, &p).unwrap().as_str(), Some("core"));
        assert_eq!(out.as_object().unwrap()["tags"].as_map().unwrap().len(), 2);
    }

    #[test]
    fn test_transform_list_index_out_of_range() {
        let d = doc();
        let err = transform(&d, &path!("ports", 9), |_, v| Ok(v)).unwrap_err();
        assert_eq!(err.remaining(), Some(1));
    }

    #[test]
    fn test_transform_set_rejects_duplicate_element() {
        let d = doc();
        let p = path!("zones").element(Value::string("a"));
        let err = transform(&d, &p, |q, v| {
            if q == &p {
                Ok(Value::string("b"))
            } else {
                Ok(v)
            }
        })
        .unwrap_err();
        assert!(matches!(err, AttrError::InvalidValue { .. }));
    }
}
