//! Evaluation performance benchmarks.
//!
//! Measures CV loading, snapshot extraction and rule evaluation over the
//! fixture tables and a compliant daily header.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use cc6::metadata::NodeScope;
use cc6::rules::{AllowedSource, Check, Normalization, PathTemplate, Rule, Scope, Subject};
use cc6::{
    Cc6Checker, CheckerConfig, CvTable, EvaluationContext, Evaluator, MetadataAdapter,
    MetadataNode, MetadataSnapshot, RuleSet,
};

#[path = "../tests/common/mod.rs"]
mod common;

/// Benchmark loading and merging the table files.
fn bench_cv_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("cv_loading");
    let (dir, _) = common::tables_dir();

    group.bench_function("load_uncached", |b| {
        b.iter(|| {
            let config = CheckerConfig::default().with_tables_path(dir.path());
            black_box(config.repository().load("CORDEX-CMIP6", "latest").unwrap())
        })
    });

    group.bench_function("from_value", |b| {
        let root = serde_json::Value::Object(
            common::cv_tables()
                .into_iter()
                .map(|(name, doc)| (name.to_string(), doc))
                .collect(),
        );
        b.iter(|| black_box(CvTable::from_value("CORDEX-CMIP6", "latest", &root).unwrap()))
    });

    group.finish();
}

/// Benchmark the full check over the compliant header.
fn bench_check_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_all");
    let (_dir, config) = common::tables_dir();
    let checker = Cc6Checker::new(config).unwrap();
    let header = common::header(&common::compliant_header_json());
    let table = checker.table().unwrap();

    group.bench_function("snapshot", |b| {
        b.iter(|| black_box(MetadataAdapter::new(&header).snapshot()))
    });

    let snapshot = MetadataAdapter::new(&header).snapshot();
    group.bench_function("evaluate_snapshot", |b| {
        b.iter(|| black_box(checker.evaluate_snapshot(&table, &snapshot)))
    });

    group.bench_function("check_all", |b| {
        b.iter(|| black_box(checker.check_all(&header).unwrap()))
    });

    group.finish();
}

/// Benchmark membership checks against growing CV lists.
fn bench_membership_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("membership_scaling");
    let rules = RuleSet::new(vec![Rule::new(
        "source_id_valid",
        "Global Attributes",
        Scope::Global,
        Check::Membership {
            subject: Subject::Attribute("source_id".to_string()),
            allowed: vec![AllowedSource::Cv {
                path: PathTemplate::parse("CV.CV.source_id").unwrap(),
            }],
            normalization: Normalization::default(),
        },
    )])
    .unwrap();

    for size in [10usize, 100, 1000] {
        let sources: Vec<String> = (0..size).map(|i| format!("RCM{}", i)).collect();
        let table = CvTable::from_value(
            "CORDEX-CMIP6",
            "bench",
            &json!({"CV": {"CV": {"source_id": sources}}}),
        )
        .unwrap();
        let snapshot = MetadataSnapshot::new(
            MetadataNode::new(NodeScope::Global).with_text("source_id", format!("RCM{}", size - 1)),
        );

        group.bench_with_input(BenchmarkId::new("evaluate", size), &size, |b, _| {
            b.iter(|| {
                black_box(Evaluator::new(&table, &rules, EvaluationContext::new(&snapshot)).evaluate_all())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cv_loading,
    bench_check_all,
    bench_membership_scaling,
);
criterion_main!(benches);
