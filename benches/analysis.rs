use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use drumline::{analyze::analyze, audio::Audio, config::Config};

fn click_track(c: &mut Criterion) {
    let sr = 22050u32;
    let mut samples = vec![0.0f32; sr as usize * 2];
    let mut i = 0;
    while i < samples.len() {
        samples[i] = 1.0;
        i += sr as usize / 2;
    }
    let audio = Audio { samples, sample_rate: sr };
    let config = Config::default();

    c.bench_function("analyze", |b| {
        b.iter(|| black_box(analyze(&audio, "bench", &config)))
    });
}

criterion_group!(benches, click_track);
criterion_main!(benches);
