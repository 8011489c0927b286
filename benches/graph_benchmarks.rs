use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use interactome::graph::{giant_component, InteractionGraph, SelfLoopPolicy};
use interactome::source::HumanInteractions;

/// Synthetic tab3 text, one row in ten with a non-human interactor
fn synthetic_release(pairs: usize) -> String {
    let mut text = String::from(
        "#BioGRID Interaction ID\tSWISS-PROT Accessions Interactor A\t\
         SWISS-PROT Accessions Interactor B\tOrganism Name Interactor A\t\
         Organism Name Interactor B\n",
    );
    for i in 0..pairs {
        let organism = if i % 10 == 0 { "Mus musculus" } else { "Homo sapiens" };
        text.push_str(&format!(
            "{i}\tP{:05}\tP{:05}\t{organism}\tHomo sapiens\n",
            i % (pairs / 2),
            (i * 7 + 1) % (pairs / 2)
        ));
    }
    text
}

/// Benchmark streaming the filter into a graph
fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");

    for size in [1_000, 10_000, 100_000].iter() {
        let text = synthetic_release(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| {
                let pairs = HumanInteractions::new(text.as_bytes()).unwrap();
                let graph = InteractionGraph::from_pairs(pairs, SelfLoopPolicy::Keep).unwrap();
                criterion::black_box(graph.edge_count());
            });
        });
    }
    group.finish();
}

/// Benchmark largest-component extraction
fn bench_giant_component(c: &mut Criterion) {
    let mut group = c.benchmark_group("giant_component");

    for size in [1_000, 10_000, 100_000].iter() {
        let text = synthetic_release(*size);
        let pairs = HumanInteractions::new(text.as_bytes()).unwrap();
        let graph = InteractionGraph::from_pairs(pairs, SelfLoopPolicy::Keep).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| {
                let giant = giant_component(graph);
                criterion::black_box(giant.node_count());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_graph_build, bench_giant_component);
criterion_main!(benches);
