use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polylog::{args, BackendKind, LogOption, Logger, RedactionPipeline, RedactionRule, Severity};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

fn logger(kind: BackendKind, dir: &tempfile::TempDir, extra: &[LogOption]) -> Logger {
    let mut options = vec![
        LogOption::FileOutput(dir.path().join("bench.log")),
        LogOption::ErrorOutput(dir.path().join("bench_error.log")),
    ];
    options.extend_from_slice(extra);
    Logger::with_kind(kind, options).unwrap()
}

fn emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    group.throughput(Throughput::Elements(1));

    for kind in BackendKind::ALL {
        let dir = tempfile::tempdir().unwrap();
        let text = logger(kind, &dir, &[]);
        group.bench_with_input(BenchmarkId::new("text", kind), &text, |b, logger| {
            b.iter(|| logger.info("request served", args!["status", 200, "path", "/health"]));
        });

        let redacted = logger(kind, &dir, &[LogOption::Redaction(vec![])]);
        group.bench_with_input(BenchmarkId::new("redacted", kind), &redacted, |b, logger| {
            b.iter(|| logger.info("login", args!["user", "bob", "password", "hunter2"]));
        });

        let mirrored = logger(kind, &dir, &[]);
        group.bench_with_input(BenchmarkId::new("mirrored", kind), &mirrored, |b, logger| {
            b.iter(|| logger.error("upstream failed", args!["attempt", 3]));
        });
    }
    group.finish();
}

fn filtered(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let logger = logger(BackendKind::Tracing, &dir, &[LogOption::Level(Severity::Error)]);
    c.bench_function("filtered_debug", |b| {
        b.iter(|| logger.debug("dropped", args!["n", 1]));
    });
}

fn redaction(c: &mut Criterion) {
    let rules: Vec<Arc<dyn RedactionRule>> = polylog::services::builtin_rules();
    let pipeline = RedactionPipeline::new(rules);
    let args = vec![
        json!("user"),
        json!("bob"),
        json!("password"),
        json!("hunter2"),
        json!("phone"),
        json!("13812345678"),
    ];
    c.bench_function("redaction_pipeline", |b| {
        b.iter(|| pipeline.process(black_box(args.clone())));
    });
}

criterion_group!(benches, emit, filtered, redaction);
criterion_main!(benches);
