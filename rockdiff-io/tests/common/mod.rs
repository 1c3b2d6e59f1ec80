use std::path::PathBuf;

use rockdiff_core::{
    containers::{Point, PointCloud},
    layout::{attributes, PointLayout},
    nalgebra::Vector3,
};

/// Returns the path of a file in resources/test
pub fn get_test_file_path(filename: &str) -> PathBuf {
    let mut test_file_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    test_file_path.push(format!("resources/test/{}", filename));
    test_file_path
}

/// Returns a fresh, empty directory below the system temp directory. The caller removes it
pub fn temp_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("rockdiff_io_{}_{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("Could not clear temp directory");
    }
    std::fs::create_dir_all(&dir).expect("Could not create temp directory");
    dir
}

/// A square grid patch of `n * n` points in the xz plane starting at `origin`, all with the same displacement
pub fn grid_patch(origin: Vector3<f64>, n: usize, spacing: f64, diff: f64) -> Vec<Point> {
    (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            Point::with_attributes(
                origin + Vector3::new(i as f64 * spacing, 0.0, j as f64 * spacing),
                diff,
                vec![0.01],
            )
        })
        .collect()
}

/// Two separated loss patches of 6x6 points on a stable background
pub fn two_rockfalls() -> PointCloud {
    let points = grid_patch(Vector3::new(0.0, 0.0, 0.0), 6, 0.2, -0.5)
        .into_iter()
        .chain(grid_patch(Vector3::new(5.0, 0.0, 0.0), 6, 0.2, -0.8))
        .chain(grid_patch(Vector3::new(-2.0, 0.0, -2.0), 10, 1.0, 0.01));
    PointCloud::from_points(PointLayout::from_attributes(&[attributes::UNCERTAINTY]), points)
}
