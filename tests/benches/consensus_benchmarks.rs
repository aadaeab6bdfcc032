//! # Hashgraph Ordering Benchmarks
//!
//! | Stage | Measured |
//! |-------|----------|
//! | Orphan buffer | Release of shuffled gossip |
//! | Consensus engine | Events to rounds, in parents-first order |
//! | Full node | Orphan buffer plus engine with window feedback |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hg_01_event_intake::{IntakeConfig, OrphanBuffer};
use hg_02_consensus::ConsensusEngineApi;
use hg_tests::fixtures::{engine, Gossip, Node};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;

// ============================================================================
// HG-01: Orphan Buffer
// ============================================================================

fn bench_orphan_buffer_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("hg-01-orphan-buffer");

    for size in [500usize, 2_000] {
        let mut events = Gossip::new(8, 1).events(size);
        events.shuffle(&mut StdRng::seed_from_u64(2));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("shuffled_release", size), &events, |b, events| {
            b.iter(|| {
                let mut buffer = OrphanBuffer::new(IntakeConfig::default());
                let released: usize = events
                    .iter()
                    .cloned()
                    .map(|e| buffer.handle_event(e).len())
                    .sum();
                black_box(released)
            })
        });
    }

    group.finish();
}

// ============================================================================
// HG-02: Consensus Engine
// ============================================================================

fn bench_consensus_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("hg-02-consensus");
    group.measurement_time(Duration::from_secs(10));

    for nodes in [4u64, 10, 25] {
        let events = Gossip::new(nodes, 3).events(2_000);

        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::new("add_event", nodes), &events, |b, events| {
            b.iter(|| {
                let mut engine = engine(nodes);
                let mut rounds = 0usize;
                for event in events.iter().cloned() {
                    rounds += engine.add_event(event).map(|r| r.len()).unwrap_or(0);
                }
                black_box(rounds)
            })
        });
    }

    group.finish();
}

fn bench_full_node(c: &mut Criterion) {
    let mut group = c.benchmark_group("hg-full-node");
    group.measurement_time(Duration::from_secs(10));

    let mut events = Gossip::new(7, 4).events(3_000);
    events.shuffle(&mut StdRng::seed_from_u64(5));

    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("shuffled_gossip_7_nodes", |b| {
        b.iter(|| {
            let mut node = Node::new(engine(7));
            black_box(node.receive_all(events.iter().cloned()).map(|r| r.len()))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_orphan_buffer_release,
    bench_consensus_engine,
    bench_full_node
);
criterion_main!(benches);
