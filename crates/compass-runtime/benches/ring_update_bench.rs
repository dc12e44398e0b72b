use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use compass_runtime::{
    run_fixed, Network, NetworkBuilder, NeuronCluster, NeuronParams, RecordingParams, SimParams,
    SynapseSpec,
};

fn build_ring(clusters: usize, size: usize, steps: u64) -> Network {
    let names: Vec<String> = (0..clusters).map(|i| format!("n{}", i)).collect();
    let mut builder = NetworkBuilder::new().with_params(SimParams::new(0.0, 1e-3, steps).expect("bench params"));
    for name in &names {
        builder = builder.add_neuron(NeuronCluster::new(name.as_str(), size, NeuronParams::default()).expect("bench cluster"));
    }
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut network = builder.ring(&refs, SynapseSpec::nmda(1.0)).build().expect("bench network build");
    network
        .neuron_mut("n0")
        .expect("bench cluster")
        .set_bias_current(-200.0);
    network
}

fn bench_ring_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("compass_ring_update");
    // Short runs to keep benches fast in CI
    let steps = 1_000;

    for &size in &[10usize, 100, 1000] {
        group.throughput(Throughput::Elements((size as u64) * steps));
        group.bench_with_input(BenchmarkId::new("ring3", size), &size, |b, &size| {
            b.iter_batched(
                || build_ring(3, size, steps),
                |net| {
                    let _res = run_fixed(net, RecordingParams::default()).unwrap();
                },
                BatchSize::SmallInput,
            );
        });
    }

    // Cluster count comparable to the heading circuit
    group.bench_function("ring60x10", |b| {
        b.iter_batched(
            || build_ring(60, 10, steps),
            |net| {
                let _res = run_fixed(net, RecordingParams::default()).unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_ring_update);
criterion_main!(benches);
