use criterion::{criterion_group, criterion_main, Criterion};
use pmbp::image::encode_colour;
use pmbp::lowlevel::{gradient, median_filter};
use pmbp::{
    CostParams, EnergyModel, FlowModel, ParticleGraph, PatchEvaluator, PmbpConfig, RgbaImage,
    Scene, State, View,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize, shift: usize) -> RgbaImage {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let xs = x + shift;
            let r = ((xs * 13) ^ (y * 7) ^ (xs * y)) & 0xFF;
            let g = ((xs * 3) + (y * 11)) & 0xFF;
            let b = ((xs ^ y) * 5) & 0xFF;
            data.push(encode_colour(r as u8, g as u8, b as u8, 255));
        }
    }
    RgbaImage::new(data, width, height).unwrap()
}

fn bench_preprocessing(c: &mut Criterion) {
    let img = make_image(256, 192, 0);

    c.bench_function("gradient_256x192", |b| {
        b.iter(|| black_box(gradient(&img)));
    });
    c.bench_function("median3_256x192", |b| {
        b.iter(|| black_box(median_filter(&img, 3).unwrap()));
    });

    #[cfg(feature = "rayon")]
    c.bench_function("median3_256x192_parallel", |b| {
        b.iter(|| black_box(pmbp::lowlevel::median_filter_par(&img, 3).unwrap()));
    });
}

fn bench_patch_cost(c: &mut Criterion) {
    let scene = Scene::new(make_image(128, 96, 2), make_image(128, 96, 0), 3).unwrap();
    let params = CostParams::default();
    let evaluator = PatchEvaluator::new(&scene, &params);
    let model = FlowModel::default();
    let state = State::from_data(vec![2.25, -0.5]);

    c.bench_function("patch_cost_5x5", |b| {
        b.iter(|| {
            black_box(model.unary_energy(
                &evaluator,
                View::One,
                black_box(64),
                black_box(48),
                &state,
                params.infinity,
            ))
        });
    });
}

fn bench_sweep(c: &mut Criterion) {
    let config = PmbpConfig {
        n_particles: 4,
        cost: CostParams {
            max_motion: 4.0,
            ..CostParams::default()
        },
        ..PmbpConfig::default()
    };
    let mut graph = ParticleGraph::new(
        FlowModel::default(),
        config,
        make_image(64, 48, 2),
        make_image(64, 48, 0),
    )
    .unwrap();
    let mut it = 0;

    c.bench_function("flow_sweep_64x48_4p", |b| {
        b.iter(|| {
            graph.iterate(it);
            it += 1;
        });
    });
}

criterion_group!(benches, bench_preprocessing, bench_patch_cost, bench_sweep);
criterion_main!(benches);
