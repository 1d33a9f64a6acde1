//! Criterion benchmarks for graph topology rebuild and block processing.
//!
//! Measures graph overhead independently of DSP cost using a trivial `Gain`
//! insert. Two axes:
//!
//! - **Topology** — Kahn sort cost on the first `process` call after an edge change
//! - **Execute** — steady-state `process()` throughput at varying block sizes
//!
//! Run with: `cargo bench -p patchbay-graph -- graph/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use patchbay_core::{AudioBuffer, Node, NodeCategory, ProcessContext};
use patchbay_graph::{Edge, Graph};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZE: usize = 256;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];
const CHANNELS: usize = 2;

/// Trivial gain insert that multiplies every sample by a constant; isolates
/// graph scheduling overhead from DSP processing cost.
struct Gain(f32);

impl Node for Gain {
    fn process_in_place(&mut self, _ctx: &ProcessContext, buffer: &mut AudioBuffer) {
        for s in buffer.as_mut_slice().iter_mut() {
            *s *= self.0;
        }
    }

    fn category(&self) -> NodeCategory {
        NodeCategory::Insert
    }
}

fn make_linear(n: usize) -> Graph {
    let mut graph = Graph::new(CHANNELS);
    let mut prev = graph.add_node("n0", Box::new(Gain(0.9)));
    let mut edges = Vec::with_capacity(n.saturating_sub(1));
    for i in 1..n {
        let next = graph.add_node(format!("n{i}"), Box::new(Gain(0.9)));
        edges.push(Edge::new(prev, next, 1.0));
        prev = next;
    }
    graph.set_edges(edges);
    graph.prepare(SAMPLE_RATE, BLOCK_SIZE).unwrap();
    graph
}

fn make_diamond() -> Graph {
    let mut graph = Graph::new(CHANNELS);
    let input = graph.add_node("input", Box::new(Gain(1.0)));
    let a = graph.add_node("a", Box::new(Gain(0.8)));
    let b = graph.add_node("b", Box::new(Gain(0.7)));
    let merge = graph.add_node("merge", Box::new(Gain(1.0)));
    graph.set_edges(vec![
        Edge::new(input, a, 1.0),
        Edge::new(input, b, 1.0),
        Edge::new(a, merge, 1.0),
        Edge::new(b, merge, 1.0),
    ]);
    graph.prepare(SAMPLE_RATE, BLOCK_SIZE).unwrap();
    graph
}

fn bench_topology(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/topology");

    group.bench_function("linear_5", |b| {
        b.iter(|| {
            let mut graph = make_linear(5);
            let ctx = ProcessContext::new(SAMPLE_RATE, BLOCK_SIZE, 0);
            let mut out = AudioBuffer::new(0, CHANNELS);
            black_box(graph.process(&ctx, &mut out));
        });
    });

    group.bench_function("linear_20", |b| {
        b.iter(|| {
            let mut graph = make_linear(20);
            let ctx = ProcessContext::new(SAMPLE_RATE, BLOCK_SIZE, 0);
            let mut out = AudioBuffer::new(0, CHANNELS);
            black_box(graph.process(&ctx, &mut out));
        });
    });

    group.bench_function("diamond", |b| {
        b.iter(|| {
            let mut graph = make_diamond();
            let ctx = ProcessContext::new(SAMPLE_RATE, BLOCK_SIZE, 0);
            let mut out = AudioBuffer::new(0, CHANNELS);
            black_box(graph.process(&ctx, &mut out));
        });
    });

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/execute");
    let ctx = ProcessContext::new(SAMPLE_RATE, BLOCK_SIZE, 0);

    for (name, mut graph) in [
        ("linear_5_block256", make_linear(5)),
        ("linear_20_block256", make_linear(20)),
        ("diamond_block256", make_diamond()),
    ] {
        let mut out = AudioBuffer::new(0, CHANNELS);
        graph.process(&ctx, &mut out); // warm up buffers
        group.bench_function(name, |b| {
            b.iter(|| {
                graph.process(black_box(&ctx), &mut out);
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_block_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/block_sweep");

    for &block_size in BLOCK_SIZES {
        let mut graph = make_linear(5);
        let ctx = ProcessContext::new(SAMPLE_RATE, block_size, 0);
        let mut out = AudioBuffer::new(0, CHANNELS);
        graph.process(&ctx, &mut out);

        group.bench_with_input(
            BenchmarkId::new("linear_5", block_size),
            &block_size,
            |b, _| {
                b.iter(|| {
                    graph.process(black_box(&ctx), &mut out);
                    black_box(&out);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_topology, bench_execute, bench_block_sweep);
criterion_main!(benches);
