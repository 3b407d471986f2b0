// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Benchmarks the CPU-bound half of the resolver: partition enumeration and hit scoring.
//!
//! These paths run once per query regardless of backend latency, so regressions here tax every
//! query. Enumeration cost doubles per added token; scoring cost is linear in hits per group.

use std::collections::HashMap;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use por_engine::{
    config::ResolverConfig,
    index::{RawHit, TextMatch},
    query::{holder::ResultHolder, partition::StringPartition, result::GroupResult},
};
use std::hint::black_box;

fn tokens(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("word{i}")).collect()
}

fn enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition_enumeration");
    for n in [4usize, 8, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let partition = StringPartition::new(tokens(n));
            b.iter(|| {
                let mut sets = 0u64;
                for set in partition.iter() {
                    sets += black_box(set.groups().len()) as u64;
                }
                sets
            });
        });
    }
    group.finish();
}

fn scoring(c: &mut Criterion) {
    let config = ResolverConfig::default();
    let weights: HashMap<String, f64> = HashMap::new();

    let mut group = c.benchmark_group("holder_scoring");
    for hits in [1usize, 10, 30] {
        group.bench_with_input(BenchmarkId::from_parameter(hits), &hits, |b, &hits| {
            b.iter(|| {
                let mut result = GroupResult::new("rio de janeiro");
                result.record_match(
                    TextMatch {
                        matched: "rio de janeiro".to_string(),
                        hits: (0..hits as u64)
                            .map(|doc_id| RawHit {
                                doc_id,
                                data: format!("RIO SBGL {doc_id} 0.6 Rio de Janeiro (RIO) BR"),
                                relevance_pct: 100.0,
                                edit_distance: 0,
                            })
                            .collect(),
                    },
                    2,
                );
                let mut holder = ResultHolder::new("[rio de janeiro]");
                holder.push(result);
                holder.calculate_weight(&weights, &config).unwrap();
                black_box(holder.weight())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, enumeration, scoring);
criterion_main!(benches);
