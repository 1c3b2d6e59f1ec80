use criterion::{criterion_group, criterion_main, Criterion};
use rockdiff_algorithms::{
    alpha_shape::{alpha_shape_from_triangulation, AlphaMode},
    dbscan::{dbscan, DbscanParams},
    delaunay::triangulate,
};
use rockdiff_core::nalgebra::{Point2, Vector3};
use rand::{distributions::Uniform, thread_rng, Rng};

const NUM_POINTS_SMALL: usize = 1000;
const NUM_POINTS_MEDIUM: usize = 10000;
const NUM_POINTS_BIG: usize = 50000;

fn random_positions(num_points: usize) -> Vec<Vector3<f64>> {
    let mut rng = thread_rng();
    let coordinate = Uniform::new(-20.0, 20.0);
    (0..num_points)
        .map(|_| {
            Vector3::new(
                rng.sample(coordinate),
                rng.sample(Uniform::new(-0.5, 0.5)),
                rng.sample(coordinate),
            )
        })
        .collect()
}

fn project_xz(positions: &[Vector3<f64>]) -> Vec<Point2<f64>> {
    positions.iter().map(|p| Point2::new(p.x, p.z)).collect()
}

fn bench(c: &mut Criterion) {
    let sizes = [
        ("small", NUM_POINTS_SMALL),
        ("medium", NUM_POINTS_MEDIUM),
        ("big", NUM_POINTS_BIG),
    ];
    let params = DbscanParams {
        eps: 1.0,
        min_points: 5,
    };
    for (testname, num_points) in sizes.iter() {
        let positions = random_positions(*num_points);
        let planar = project_xz(&positions);

        c.bench_function(&format!("dbscan_performance_{}", testname), |b| {
            b.iter(|| dbscan(&positions, &params))
        });
        c.bench_function(&format!("delaunay_performance_{}", testname), |b| {
            b.iter(|| triangulate(&planar))
        });
        if let Ok(triangulation) = triangulate(&planar) {
            c.bench_function(&format!("alpha_shape_performance_{}", testname), |b| {
                b.iter(|| alpha_shape_from_triangulation(&triangulation, &AlphaMode::default()))
            });
        }
    }
}

criterion_group! {
    name = clustering;
    config = Criterion::default().sample_size(20);
    targets = bench
}
criterion_main!(clustering);
