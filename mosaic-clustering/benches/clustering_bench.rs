use criterion::{criterion_group, criterion_main, Criterion};

use mosaic_clustering::{ClusterEngine, ClusterParams};
use mosaic_core::models::EmbeddingRecord;

/// 1K synthetic 64-dim records in 8 loose regions.
fn make_records() -> Vec<EmbeddingRecord> {
    let mut records = Vec::with_capacity(1000);
    for i in 0..1000 {
        let region = i % 8;
        let mut vector = vec![0.05f32; 64];
        vector[region * 8] = 1.0;
        vector[region * 8 + 1] = 0.5 + (i % 13) as f32 * 0.01;
        records.push(EmbeddingRecord::new(format!("img/{i}"), vector));
    }
    records
}

fn bench_cold_pass(c: &mut Criterion) {
    let records = make_records();
    let params = ClusterParams {
        k: 8,
        threshold: 0.15,
        iteration_cap: 20,
        representatives_per_cluster: 16,
    };

    c.bench_function("cold_pass_1k_records_64d", |b| {
        b.iter(|| {
            let mut engine = ClusterEngine::with_seed(42);
            engine.update_clusters(&records, &params, None)
        });
    });
}

fn bench_warm_pass(c: &mut Criterion) {
    let records = make_records();
    let params = ClusterParams {
        k: 8,
        threshold: 0.15,
        iteration_cap: 20,
        representatives_per_cluster: 16,
    };
    let mut engine = ClusterEngine::with_seed(42);
    let first = engine.update_clusters(&records, &params, None);

    c.bench_function("warm_pass_1k_records_64d", |b| {
        b.iter(|| {
            let mut engine = ClusterEngine::with_seed(42);
            engine.update_clusters(&records, &params, Some(&first.centroids))
        });
    });
}

criterion_group!(benches, bench_cold_pass, bench_warm_pass);
criterion_main!(benches);
