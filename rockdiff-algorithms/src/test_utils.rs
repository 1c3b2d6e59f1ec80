use rand::{distributions::Uniform, rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rockdiff_core::containers::{Point, PointCloud};
use rockdiff_core::layout::PointLayout;
use rockdiff_core::nalgebra::Vector3;

/// Regular grid of `nx * nz` points in the xz plane (y = 0) with the given spacing and a constant displacement
pub(crate) fn grid_cloud(nx: usize, nz: usize, spacing: f64, diff: f64) -> PointCloud {
    PointCloud::from_points(
        PointLayout::new(),
        (0..nx).flat_map(move |ix| {
            (0..nz).map(move |iz| {
                Point::new(
                    Vector3::new(ix as f64 * spacing, 0.0, iz as f64 * spacing),
                    diff,
                )
            })
        }),
    )
}

/// Uniformly random points inside a disk in the xz plane with a little noise along y
pub(crate) fn random_disk(
    rng: &mut StdRng,
    center: Vector3<f64>,
    radius: f64,
    count: usize,
    diff: f64,
) -> Vec<Point> {
    let angles = Uniform::new(0.0, std::f64::consts::TAU);
    let radii = Uniform::new(0.0f64, 1.0);
    let depth = Uniform::new(-0.01, 0.01);
    (0..count)
        .map(|_| {
            let angle = rng.sample(angles);
            let r = radius * rng.sample(radii).sqrt();
            Point::new(
                center + Vector3::new(r * angle.cos(), rng.sample(depth), r * angle.sin()),
                diff,
            )
        })
        .collect()
}

/// Uniformly random points inside an axis aligned box
pub(crate) fn random_box(
    rng: &mut StdRng,
    min: Vector3<f64>,
    max: Vector3<f64>,
    count: usize,
    diff: f64,
) -> Vec<Point> {
    (0..count)
        .map(|_| {
            Point::new(
                Vector3::new(
                    rng.gen_range(min.x..=max.x),
                    rng.gen_range(min.y..=max.y),
                    rng.gen_range(min.z..=max.z),
                ),
                diff,
            )
        })
        .collect()
}

pub(crate) fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Returns a random permutation of `0..len`
pub(crate) fn random_permutation(rng: &mut StdRng, len: usize) -> Vec<usize> {
    let mut permutation = (0..len).collect::<Vec<_>>();
    permutation.shuffle(rng);
    permutation
}
