use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lineprobe::config::SearchConfig;
use lineprobe::corpus::Corpus;
use lineprobe::search::{Query, Snapshot, StrategyRegistry};
use std::hint::black_box;

const LINES: usize = 50_000;

fn corpus() -> Corpus {
    // zero-padded so the corpus is also valid input for `binary`
    let lines = (0..LINES).map(|i| format!("{i:08};0;23;11;0;16;3;0;"));
    Corpus::from_lines("bench.txt", lines, true)
}

fn lookups(c: &mut Criterion) {
    let registry = StrategyRegistry::default();
    let corpus = corpus();
    let present = Query::new(format!("{:08};0;23;11;0;16;3;0;", LINES - 1), true).unwrap();
    let absent = Query::new("99999999;0;23;11;0;16;3;0;", true).unwrap();

    let mut group = c.benchmark_group("lookup");
    for name in registry.names() {
        // one process per query would dominate the numbers
        if name == "grep" {
            continue;
        }
        let config = SearchConfig {
            algorithm: name.to_string(),
            case_sensitive: true,
            ..SearchConfig::default()
        };
        let strategy = registry.resolve(&config).unwrap();
        let snapshot = Snapshot::build(corpus.clone(), strategy.as_ref()).unwrap();

        group.bench_with_input(BenchmarkId::new("present", name), &present, |b, q| {
            b.iter(|| snapshot.contains(black_box(q)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("absent", name), &absent, |b, q| {
            b.iter(|| snapshot.contains(black_box(q)).unwrap())
        });
    }
    group.finish();
}

fn snapshot_builds(c: &mut Criterion) {
    let registry = StrategyRegistry::default();
    let corpus = corpus();

    let mut group = c.benchmark_group("prepare");
    group.sample_size(20);
    for name in ["inmemory", "binary", "hash", "bloom"] {
        let config = SearchConfig {
            algorithm: name.to_string(),
            case_sensitive: true,
            ..SearchConfig::default()
        };
        let strategy = registry.resolve(&config).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| Snapshot::build(corpus.clone(), strategy.as_ref()).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, lookups, snapshot_builds);
criterion_main!(benches);
