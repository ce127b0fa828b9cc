use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_edge_disparity::{
    edgebound::{self, EdgeBounded},
    fixed_window::{self, FixedWindow},
    prelude::*
};
use image::{GrayImage, Luma};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Blocky random scene with the right view shifted by a fixed disparity.
fn synthetic_frame(width: u32, height: u32, shift: u32) -> StereoFrame {
    let mut rng = StdRng::seed_from_u64(0);
    let stride = (width + shift) / 8 + 1;
    let blocks: Vec<u8> = (0..stride * (height / 8 + 1)).map(|_| rng.gen()).collect();

    let at = |x: u32, y: u32| Luma([blocks[((y / 8) * stride + x / 8) as usize]]);

    StereoFrame {
        left: GrayImage::from_fn(width, height, |x, y| at(x, y)),
        right: GrayImage::from_fn(width, height, |x, y| at(x + shift, y))
    }
}

fn edgebound_bench(c: &mut Criterion) {
    let frame = synthetic_frame(160, 120, 6);

    // Build disparity alg
    let mut disp = EdgeBounded::new(edgebound::Params {
        max_disparity: 16,
        edge_threshold: 200,
        dilation_radius: 1,
        num_voting_iterations: 5,
        hybrid_fraction_threshold: 0.75,
        seed: Some(0)
    })
    .unwrap();

    c.bench_function("edgebound blocks_160x120", |b| {
        b.iter(|| disp.compute(black_box(&frame)))
    });
}

fn fixed_window_bench(c: &mut Criterion) {
    let frame = synthetic_frame(160, 120, 6);

    let mut disp = FixedWindow::new(fixed_window::Params {
        window_size: 7,
        max_disparity: 16,
        edge_threshold: 200,
        dilation_radius: 1,
        hybrid_fraction_threshold: 0.75,
        matching: fixed_window::Matching::Hybrid,
        seed: Some(0)
    })
    .unwrap();

    c.bench_function("fixed_window blocks_160x120", |b| {
        b.iter(|| disp.compute(black_box(&frame)))
    });
}

criterion_group!(benches, edgebound_bench, fixed_window_bench);
criterion_main!(benches);
