//! Benchmarks for the collapse primitive, the Hausdorff measure and the
//! adaptive loop

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lowpoly_core::{Mesh, MeshSnapshot, Point3f};
use lowpoly_simplification::{
    one_sided_hausdorff, AdaptiveDecimator, CollapseDecimator, QuadricCollapser, QualityThreshold,
    SurfaceIndex,
};

fn generate_grid_mesh(size: usize) -> Mesh {
    let mut vertices = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let fy = y as f32 / (size - 1) as f32 * std::f32::consts::PI;
            vertices.push(Point3f::new(
                x as f32,
                y as f32,
                (fx.sin() * fy.sin()) * 2.0,
            ));
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }
    Mesh::from_triangles(vertices, &faces)
}

fn bench_collapse(c: &mut Criterion) {
    let sizes = [20, 40, 80];
    let ratios = [0.2, 0.5];

    let mut group = c.benchmark_group("collapse");

    for &size in &sizes {
        let mesh = generate_grid_mesh(size);
        let triangles = mesh.triangles();

        for &ratio in &ratios {
            let target = (triangles.len() as f64 * ratio).round() as usize;
            group.bench_with_input(
                BenchmarkId::new(
                    "qem",
                    format!("{}f_r{}", triangles.len(), (ratio * 100.0) as u32),
                ),
                &target,
                |b, &target| {
                    let collapser = QuadricCollapser::new();
                    b.iter(|| {
                        let out = collapser.collapse(black_box(&mesh.vertices), black_box(&triangles), target);
                        black_box(out);
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_hausdorff(c: &mut Criterion) {
    let mut group = c.benchmark_group("hausdorff");

    for &size in &[40, 80, 160] {
        let reference = generate_grid_mesh(size);
        let target = generate_grid_mesh(size / 2);
        let faces = reference.face_count();

        group.bench_with_input(BenchmarkId::new("build_index", faces), &reference, |b, reference| {
            b.iter(|| black_box(SurfaceIndex::build(black_box(reference))));
        });

        group.bench_with_input(BenchmarkId::new("one_sided", faces), &reference, |b, reference| {
            b.iter(|| black_box(one_sided_hausdorff(black_box(&target), reference).unwrap()));
        });

        let index = SurfaceIndex::build(&reference);
        group.bench_with_input(BenchmarkId::new("query_prebuilt", faces), &index, |b, index| {
            b.iter(|| black_box(index.one_sided_hausdorff(black_box(&target)).unwrap()));
        });
    }

    group.finish();
}

fn bench_adaptive(c: &mut Criterion) {
    let snapshot = MeshSnapshot::new(generate_grid_mesh(60)).unwrap();
    let threshold = QualityThreshold::from_diagonal(snapshot.diagonal(), 0.001).unwrap();
    let decimator = AdaptiveDecimator::new(CollapseDecimator::default());
    let target = snapshot.face_count() / 5;

    c.bench_function("adaptive_loop_60", |b| {
        b.iter(|| {
            let report = decimator
                .decimate_with_quality_control(black_box(&snapshot), target, &threshold, 6)
                .unwrap();
            black_box(report);
        });
    });
}

criterion_group!(benches, bench_collapse, bench_hausdorff, bench_adaptive);
criterion_main!(benches);
