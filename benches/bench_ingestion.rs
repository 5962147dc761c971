// benches/bench_ingestion.rs

use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use junction_sim::simulation_engine::ingestion::IngestionAdapter;
use junction_sim::simulation_engine::junction::JunctionState;
use junction_sim::simulation_engine::traffic_generator::generate_record_line;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

// Parse and route a batch of generated records into a fresh junction.
fn bench_ingest_batches(c: &mut Criterion) {
    let adapter = IngestionAdapter::default();
    let mut group = c.benchmark_group("ingest_batch");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &batch_size in [10, 100, 1000].iter() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch: String = (0..batch_size)
            .map(|_| generate_record_line(&mut rng))
            .collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch,
            |b, batch| {
                b.iter(|| {
                    let mut state = JunctionState::new(200);
                    black_box(adapter.ingest_lines(&mut state, batch.lines()));
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_ingest_batches);
criterion_main!(benches);
