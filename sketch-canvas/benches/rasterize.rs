use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sketch_canvas::{rasterize, DrawRegion, LineSegment, Point};

fn l_shaped_outline(region: &DrawRegion) -> Vec<LineSegment> {
    let corners = [
        (60.0, 60.0),
        (340.0, 60.0),
        (340.0, 200.0),
        (200.0, 200.0),
        (200.0, 340.0),
        (60.0, 340.0),
    ];
    corners
        .iter()
        .zip(corners.iter().cycle().skip(1))
        .map(|(&(x1, y1), &(x2, y2))| {
            LineSegment::new(
                Point::new(region.left + x1, region.top + y1),
                Point::new(region.left + x2, region.top + y2),
                20.0,
            )
        })
        .collect()
}

fn bench_rasterize(c: &mut Criterion) {
    let region = DrawRegion::centered(800, 600, 400);
    let segments = l_shaped_outline(&region);

    c.bench_function("rasterize_l_shape_64", |b| {
        b.iter(|| rasterize(black_box(&segments), &region, 64))
    });
}

criterion_group!(benches, bench_rasterize);
criterion_main!(benches);
