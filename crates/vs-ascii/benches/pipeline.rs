use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vs_ascii::render::render;
use vs_ascii::transform::FrameTransformer;
use vs_core::config::RenderConfig;
use vs_core::frame::FrameBuffer;

fn gradient(width: u32, height: u32) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    for (i, px) in fb.data.chunks_exact_mut(4).enumerate() {
        let v = (i % 256) as u8;
        px.copy_from_slice(&[v, v.wrapping_add(40), v.wrapping_add(80), 255]);
    }
    fb
}

fn bench_pipeline(c: &mut Criterion) {
    let config = RenderConfig::default();
    let ramp = config.ramp().unwrap_or_else(|e| panic!("ramp: {e}"));
    let frame = gradient(640, 360);

    let mut transformer =
        FrameTransformer::new(&config).unwrap_or_else(|e| panic!("transformer: {e}"));
    c.bench_function("transform_640x360_to_100", |b| {
        b.iter(|| transformer.transform(black_box(&frame)));
    });

    let grid = transformer
        .transform(&frame)
        .unwrap_or_else(|e| panic!("transform: {e}"));
    c.bench_function("render_100_cols", |b| {
        b.iter(|| render(black_box(&grid), &ramp, " "));
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
