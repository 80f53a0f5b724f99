//! Performance benchmarks for attrdoc operations.
//!
//! Run with: cargo bench --package attrdoc

use attrdoc::types::{NumberType, StringType};
use attrdoc::{
    path, transform, walk, Attribute, Context, Path, ReadDocument, Schema, State, Value, WireType,
    WriteDocument,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use std::sync::Arc;

// ============================================================================
// Helper functions to generate test data
// ============================================================================

/// Generate a flat schema with N number attributes
fn generate_flat_schema(num_fields: usize) -> Schema {
    let mut schema = Schema::new().attribute("name", Attribute::new(StringType).required());
    for i in 0..num_fields {
        schema = schema.attribute(format!("field_{}", i), Attribute::new(NumberType).optional());
    }
    schema
}

/// Generate a flat document matching `generate_flat_schema`
fn generate_flat_doc(num_fields: usize) -> Value {
    let mut attrs = vec![("name".to_string(), Value::string("bench"))];
    for i in 0..num_fields {
        attrs.push((format!("field_{}", i), Value::number(i as i64)));
    }
    Value::object(attrs)
}

/// Generate a deeply nested object document
fn generate_nested_doc(depth: usize) -> (Value, Path) {
    let mut current = Value::object([("value", Value::number(42))]);
    let mut steps = vec!["value".to_string()];
    for i in (0..depth).rev() {
        let name = format!("level_{}", i);
        current = Value::object([(name.clone(), current)]);
        steps.insert(0, name);
    }
    let mut p = Path::root();
    for s in steps {
        p = p.attr(s);
    }
    (current, p)
}

/// Generate a map of N entries
fn generate_map(num_entries: usize) -> Value {
    let entries: BTreeMap<String, Value> = (0..num_entries)
        .map(|i| (format!("key_{}", i), Value::number(i as i64)))
        .collect();
    Value::object([(
        "entries",
        Value::map(WireType::Number, entries).unwrap_or_else(|_| Value::null(WireType::map(WireType::Number))),
    )])
}

// ============================================================================
// Benchmark: walk
// ============================================================================

fn bench_walk_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk_nested_doc");

    for depth in [1, 10, 50, 100] {
        let (doc, p) = generate_nested_doc(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| black_box(walk(black_box(&doc), black_box(&p)).is_ok()));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: transform
// ============================================================================

fn bench_transform_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_nested_doc");

    for depth in [1, 10, 50] {
        let (doc, p) = generate_nested_doc(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let result = transform(black_box(&doc), black_box(&p), |q, v| {
                    if q == &p {
                        Ok(Value::number(7))
                    } else {
                        Ok(v)
                    }
                });
                black_box(result)
            });
        });
    }

    group.finish();
}

fn bench_transform_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_map_entry");

    for num_entries in [10, 100, 1000] {
        group.throughput(Throughput::Elements(num_entries as u64));
        let doc = generate_map(num_entries);
        let p = path!("entries").key("key_0");
        group.bench_with_input(
            BenchmarkId::from_parameter(num_entries),
            &num_entries,
            |b, _| {
                b.iter(|| black_box(transform(black_box(&doc), &p, |_, v| Ok(v))));
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: document facades
// ============================================================================

fn bench_get_attribute(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_get_attribute");
    let ctx = Context::background();

    for num_fields in [10, 100, 1000] {
        let state = State::new(
            Arc::new(generate_flat_schema(num_fields)),
            generate_flat_doc(num_fields),
        );
        let p = path!(format!("field_{}", num_fields / 2));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_fields),
            &num_fields,
            |b, _| {
                b.iter(|| {
                    let mut out = 0i64;
                    let diags = state.get_attribute(&ctx, black_box(&p), &mut out);
                    black_box((out, diags))
                });
            },
        );
    }

    group.finish();
}

fn bench_set_attribute(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_set_attribute");
    let ctx = Context::background();

    for num_fields in [10, 100, 1000] {
        let state = State::new(
            Arc::new(generate_flat_schema(num_fields)),
            generate_flat_doc(num_fields),
        );
        let p = path!("name");
        group.bench_with_input(
            BenchmarkId::from_parameter(num_fields),
            &num_fields,
            |b, _| {
                b.iter(|| {
                    let mut s = state.clone();
                    let diags = s.set_attribute(&ctx, black_box(&p), "renamed");
                    black_box((s, diags))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_walk_nested,
    bench_transform_nested,
    bench_transform_map,
    bench_get_attribute,
    bench_set_attribute,
);
criterion_main!(benches);
