//! Benchmarks for spark-observables
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spark_observables::{
    batch, computed, effect, get_signal, object, signal, try_observable, SignalAccess, Target,
    Value,
};

// =============================================================================
// SIGNAL BENCHMARKS
// =============================================================================

fn bench_signal_get(c: &mut Criterion) {
    let s = signal(42i32);
    c.bench_function("signal_get", |b| b.iter(|| black_box(s.get())));
}

fn bench_signal_set(c: &mut Criterion) {
    let s = signal(0i32);
    let mut n = 0;
    c.bench_function("signal_set", |b| {
        b.iter(|| {
            n += 1;
            s.set(black_box(n))
        })
    });
}

fn bench_computed_get_dirty(c: &mut Criterion) {
    let s = signal(0i32);
    let doubled = computed({
        let s = s.clone();
        move || s.get() * 2
    });
    let mut n = 0;

    c.bench_function("computed_get_dirty", |b| {
        b.iter(|| {
            n += 1;
            s.set(n);
            black_box(doubled.get())
        })
    });
}

// =============================================================================
// OBSERVABLE BENCHMARKS
// =============================================================================

fn bench_observable_wrap(c: &mut Criterion) {
    c.bench_function("observable_wrap", |b| {
        b.iter(|| black_box(try_observable(object! { "value" => 1 })))
    });
}

fn bench_observable_get(c: &mut Criterion) {
    let o = try_observable(object! { "value" => 1 }).unwrap();
    c.bench_function("observable_get", |b| b.iter(|| black_box(o.get("value"))));
}

fn bench_observable_set_with_effect(c: &mut Criterion) {
    let o = try_observable(object! { "value" => 0 }).unwrap();
    let _e = effect({
        let o = o.clone();
        move || {
            black_box(o.get("value"));
        }
    });
    let mut n = 0;

    c.bench_function("observable_set_with_effect", |b| {
        b.iter(|| {
            n += 1;
            o.set("value", n)
        })
    });
}

fn bench_getter_get_cached(c: &mut Criterion) {
    let o = try_observable(Target::object().with("value", 1).with_getter("double", |this| {
        Value::from(this.get("value").as_f64().unwrap_or(0.0) * 2.0)
    }))
    .unwrap();
    let _ = o.get("double");

    c.bench_function("getter_get_cached", |b| b.iter(|| black_box(o.get("double"))));
}

// =============================================================================
// HANDLE BENCHMARKS
// =============================================================================

fn bench_get_signal_cache_hit(c: &mut Criterion) {
    let o = try_observable(object! { "value" => 1 }).unwrap();
    let _held = get_signal(&o, "value");

    c.bench_function("get_signal_cache_hit", |b| {
        b.iter(|| black_box(get_signal(&o, "value")))
    });
}

fn bench_sigil_access(c: &mut Criterion) {
    let o = try_observable(object! { "value" => 1 }).unwrap();
    let _held = get_signal(&o, "value");

    c.bench_function("sigil_access", |b| b.iter(|| black_box(o.access("$value"))));
}

fn bench_handle_subscription(c: &mut Criterion) {
    let o = try_observable(object! { "value" => 0 }).unwrap();
    let _binding = get_signal(&o, "value").subscribe(|v| {
        black_box(v);
    });
    let mut n = 0;

    c.bench_function("handle_subscription_trigger", |b| {
        b.iter(|| {
            n += 1;
            o.set("value", n)
        })
    });
}

// =============================================================================
// BATCH BENCHMARKS
// =============================================================================

fn bench_batched_fields(c: &mut Criterion) {
    let mut group = c.benchmark_group("batched_fields");

    for fields in [1usize, 10, 100] {
        group.bench_with_input(BenchmarkId::new("fields", fields), &fields, |b, &fields| {
            let raw = Target::object();
            for i in 0..fields {
                raw.set(format!("f{i}"), 0).unwrap();
            }
            let o = try_observable(raw).unwrap();
            let _e = effect({
                let o = o.clone();
                move || {
                    for value in o.values() {
                        black_box(value);
                    }
                }
            });
            let mut n = 0;

            b.iter(|| {
                n += 1;
                batch(|| {
                    for i in 0..fields {
                        let _ = o.set(format!("f{i}"), n);
                    }
                })
            });
        });
    }

    group.finish();
}

criterion_group!(signal_benches, bench_signal_get, bench_signal_set, bench_computed_get_dirty,);

criterion_group!(
    observable_benches,
    bench_observable_wrap,
    bench_observable_get,
    bench_observable_set_with_effect,
    bench_getter_get_cached,
);

criterion_group!(
    handle_benches,
    bench_get_signal_cache_hit,
    bench_sigil_access,
    bench_handle_subscription,
);

criterion_group!(batch_benches, bench_batched_fields);

criterion_main!(signal_benches, observable_benches, handle_benches, batch_benches);
