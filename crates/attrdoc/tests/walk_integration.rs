//! Integration tests for walking and transforming value trees.

use attrdoc::{path, transform, walk, AttrError, Path, Value, WireType};
use serde_json::json;

fn tree_type() -> WireType {
    WireType::object([
        ("name", WireType::String),
        ("ports", WireType::list(WireType::Number)),
        ("zones", WireType::set(WireType::String)),
        (
            "routes",
            WireType::map(WireType::object([("via", WireType::String)])),
        ),
    ])
}

fn tree() -> Value {
    Value::from_json(
        &tree_type(),
        &json!({
            "name": "edge",
            "ports": [80, 443],
            "zones": ["a", "b"],
            "routes": {"default": {"via": "10.0.0.1"}}
        }),
    )
    .unwrap()
}

fn every_path() -> Vec<Path> {
    vec![
        Path::root(),
        path!("name"),
        path!("ports"),
        path!("ports", 1),
        path!("zones").element(Value::string("b")),
        path!("routes").key("default"),
        path!("routes").key("default").attr("via"),
    ]
}

#[test]
fn test_identity_transform_is_a_no_op() {
    let t = tree();
    for p in every_path() {
        let out = transform(&t, &p, |_, v| Ok(v)).unwrap();
        assert_eq!(out, t, "identity transform changed the tree at {p}");
    }
}

#[test]
fn test_transform_then_walk_reads_back() {
    let t = tree();
    let p = path!("routes").key("default").attr("via");
    let out = transform(&t, &p, |q, v| {
        if q == &p {
            Ok(Value::string("10.0.0.254"))
        } else {
            Ok(v)
        }
    })
    .unwrap();
    assert_eq!(walk(&out, &p).unwrap().as_str(), Some("10.0.0.254"));
    assert_eq!(walk(&t, &p).unwrap().as_str(), Some("10.0.0.1"));
    assert_eq!(
        walk(&out, &path!("ports")).unwrap(),
        walk(&t, &path!("ports")).unwrap()
    );
}

#[test]
fn test_transform_visits_target_then_ancestors() {
    let t = tree();
    let mut visited = Vec::new();
    transform(&t, &path!("ports", 0), |q, v| {
        visited.push(q.clone());
        Ok(v)
    })
    .unwrap();
    assert_eq!(visited, vec![path!("ports", 0), path!("ports"), Path::root()]);
}

#[test]
fn test_failing_callback_yields_no_tree() {
    let t = tree();
    let err = transform(&t, &path!("ports", 1), |q, v| {
        if q.is_empty() {
            Err(AttrError::conversion("root rejected"))
        } else {
            Ok(v)
        }
    })
    .unwrap_err();
    assert!(matches!(err, AttrError::Conversion { .. }));
}

#[test]
fn test_transform_changing_type_is_rejected() {
    let t = tree();
    let result = transform(&t, &path!("ports", 0), |q, v| {
        if q.len() == 2 {
            Ok(Value::string("eighty"))
        } else {
            Ok(v)
        }
    });
    assert!(result.is_err());
}

#[test]
fn test_walk_errors_name_the_consumed_prefix() {
    let t = tree();
    let err = walk(&t, &path!("routes").key("missing").attr("via")).unwrap_err();
    match err {
        AttrError::StepFailed {
            path, remaining, ..
        } => {
            assert_eq!(path, path!("routes"));
            assert_eq!(remaining, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = walk(&t, &path!("name", "deeper")).unwrap_err();
    assert_eq!(err.remaining(), Some(1));
}

#[test]
fn test_walk_stops_at_null_and_unknown() {
    let v = Value::from_json(
        &tree_type(),
        &json!({"ports": null, "zones": attrdoc::UNKNOWN_SENTINEL}),
    )
    .unwrap();
    assert!(walk(&v, &path!("ports")).unwrap().is_null());
    assert!(walk(&v, &path!("ports", 0)).is_err());
    assert!(walk(&v, &path!("zones")).unwrap().is_unknown());
    assert!(walk(&v, &path!("zones").element(Value::string("a"))).is_err());
}
