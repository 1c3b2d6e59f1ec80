use rockdiff_core::{
    containers::{Point, PointCloud},
    layout::{attributes, PointLayout},
    nalgebra::Vector3,
};
use std::path::PathBuf;

/// Returns the resource/test/folder
pub(crate) fn get_test_file_path(filename: &str) -> PathBuf {
    let mut test_file_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    test_file_path.push(format!("resources/test/{}", filename));
    test_file_path
}

pub(crate) fn test_data_positions() -> Vec<Vector3<f64>> {
    vec![
        Vector3::new(0.0, 2.0, 0.0),
        Vector3::new(0.5, 2.0, 0.25),
        Vector3::new(1.0, 2.0, 0.5),
        Vector3::new(1.5, 2.0, 0.75),
        Vector3::new(2.0, 2.0, 1.0),
        Vector3::new(2.5, 2.0, 1.25),
        Vector3::new(3.0, 2.0, 1.5),
        Vector3::new(3.5, 2.0, 1.75),
        Vector3::new(4.0, 2.0, 2.0),
        Vector3::new(4.5, 2.0, 2.25),
    ]
}

pub(crate) fn test_data_diffs() -> Vec<f64> {
    vec![0.1, 0.25, 0.3, -0.5, 0.0, 0.45, -0.22, 0.31, 0.05, -0.6]
}

pub(crate) fn test_data_uncertainties() -> Vec<f64> {
    vec![0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08, 0.09, 0.1]
}

/// The points of the test files with the uncertainty as their only attribute
pub(crate) fn test_data_cloud() -> PointCloud {
    PointCloud::from_points(
        PointLayout::from_attributes(&[attributes::UNCERTAINTY]),
        test_data_positions()
            .into_iter()
            .zip(test_data_diffs())
            .zip(test_data_uncertainties())
            .map(|((position, diff), uncertainty)| {
                Point::with_attributes(position, diff, vec![uncertainty])
            }),
    )
}
