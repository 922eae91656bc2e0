use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use cropcast_core::CropType;
use cropcast_model::{ForestParams, SyntheticDataGenerator, Trainer, TrainingConfig};

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_training");
    group.sample_size(10);

    for n in [200usize, 1000] {
        let samples = SyntheticDataGenerator::default().generate(n, CropType::Corn).unwrap();
        group.bench_with_input(BenchmarkId::new("corn_20_trees", n), &samples, |b, samples| {
            let trainer = Trainer::new(TrainingConfig::default().with_forest(ForestParams::default().with_trees(20)));
            b.iter(|| trainer.train(black_box(samples), CropType::Corn).unwrap());
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let samples = SyntheticDataGenerator::default().generate(1000, CropType::Wheat).unwrap();
    let model = Trainer::default().train(&samples, CropType::Wheat).unwrap();
    let v = *samples[0].features();

    c.bench_function("predict_wheat_100_trees", |b| {
        b.iter(|| model.predict_yield(black_box(&v)));
    });
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
