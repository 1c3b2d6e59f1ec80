use std::f64::consts::PI;

use rayon::prelude::*;
use rockdiff_core::containers::PointCloud;
use rockdiff_core::{ChangeError, Result, Stage};

use crate::spatial_index::PositionIndex;

/// Result of a local density estimation
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DensityEstimate {
    /// Mean number of neighbours within the search radius, not counting the point itself
    pub mean_neighbors: f64,
    /// Areal density in points per square unit, using the circle of the search radius as reference area
    pub density: f64,
    /// Implied mean spacing between neighbouring points, `sqrt(1 / density)`
    pub spacing: f64,
}

/// Estimates the local point density of `cloud`. For every point, the neighbours within `radius` are counted in
/// parallel; the mean count is converted to an areal density using the circle with `radius`.
///
/// The areal interpretation assumes that the surveyed surface is locally flat at the scale of `radius`.
///
/// ```
/// # use rockdiff_algorithms::density::estimate_density;
/// # use rockdiff_core::containers::*;
/// # use rockdiff_core::layout::PointLayout;
/// # use rockdiff_core::nalgebra::Vector3;
/// let points = (0..4).flat_map(|x| (0..4).map(move |z| Point::new(Vector3::new(x as f64, 0.0, z as f64), 0.5)));
/// let cloud = PointCloud::from_points(PointLayout::new(), points);
/// let estimate = estimate_density(&cloud, 1.0).unwrap();
/// assert_eq!(estimate.mean_neighbors, 3.0);
/// ```
pub fn estimate_density(cloud: &PointCloud, radius: f64) -> Result<DensityEstimate> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(ChangeError::invalid_parameter(
            Stage::DensityEstimation,
            "density_radius",
            format!("search radius must be a positive number, got {}", radius),
        ));
    }
    if cloud.is_empty() {
        return Err(ChangeError::data_insufficient(
            Stage::DensityEstimation,
            "cannot estimate the density of an empty point cloud",
        ));
    }

    let positions = cloud.positions();
    let index = PositionIndex::new(positions);
    let total_neighbors: usize = positions
        .par_iter()
        // A point with a NaN coordinate is not even its own neighbour
        .map(|position| index.within_radius(position, radius).len().saturating_sub(1))
        .sum();
    if total_neighbors == 0 {
        return Err(ChangeError::data_insufficient(
            Stage::DensityEstimation,
            format!("no point has a neighbour within radius {}", radius),
        ));
    }

    let mean_neighbors = total_neighbors as f64 / positions.len() as f64;
    let density = mean_neighbors / (PI * radius * radius);
    Ok(DensityEstimate {
        mean_neighbors,
        density,
        spacing: (1.0 / density).sqrt(),
    })
}

/// Derives the DBSCAN `min_points` parameter from an areal `density`: the expected number of points in a circle of
/// radius `eps`, scaled down by `safety_factor` so that sparser parts of a change still form clusters. The result is
/// at least 1
pub fn min_points_for_cluster(density: f64, eps: f64, safety_factor: f64) -> Result<usize> {
    if !(safety_factor > 0.0 && safety_factor <= 1.0) {
        return Err(ChangeError::invalid_parameter(
            Stage::DensityEstimation,
            "safety_factor",
            format!("must be in (0, 1], got {}", safety_factor),
        ));
    }
    if !(eps.is_finite() && eps > 0.0) {
        return Err(ChangeError::invalid_parameter(
            Stage::DensityEstimation,
            "eps",
            format!("must be a positive number, got {}", eps),
        ));
    }
    if !(density.is_finite() && density > 0.0) {
        return Err(ChangeError::data_insufficient(
            Stage::DensityEstimation,
            format!("density must be positive to derive min_points, got {}", density),
        ));
    }
    let expected = (density * PI * eps * eps * safety_factor).ceil();
    Ok((expected as usize).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::grid_cloud;
    use assert_approx_eq::assert_approx_eq;
    use rockdiff_core::containers::Point;
    use rockdiff_core::layout::PointLayout;
    use rockdiff_core::nalgebra::Vector3;

    #[test]
    fn test_spacing_of_regular_grid() {
        let cloud = grid_cloud(50, 50, 0.1, 0.5);
        let estimate = estimate_density(&cloud, 0.25).unwrap();
        assert!(estimate.mean_neighbors <= 20.0);
        assert_approx_eq!(estimate.spacing, 0.1, 0.005);
    }

    #[test]
    fn test_empty_cloud_is_insufficient() {
        let err = estimate_density(&PointCloud::new(PointLayout::new()), 1.0).unwrap_err();
        assert!(matches!(err, ChangeError::DataInsufficient { .. }));
        assert_eq!(err.stage(), Stage::DensityEstimation);
    }

    #[test]
    fn test_isolated_points_are_insufficient() {
        let cloud = grid_cloud(3, 3, 10.0, 0.5);
        let err = estimate_density(&cloud, 1.0).unwrap_err();
        assert!(matches!(err, ChangeError::DataInsufficient { .. }));
    }

    #[test]
    fn test_nan_position_has_no_neighbours() {
        let cloud = PointCloud::from_points(
            PointLayout::new(),
            vec![
                Point::new(Vector3::new(0.0, 0.0, 0.0), 0.5),
                Point::new(Vector3::new(0.1, 0.0, 0.0), 0.5),
                Point::new(Vector3::new(f64::NAN, 0.0, 0.0), 0.5),
            ],
        );
        let estimate = estimate_density(&cloud, 0.5).unwrap();
        assert_approx_eq!(estimate.mean_neighbors, 2.0 / 3.0);
    }

    #[test]
    fn test_invalid_radius() {
        let cloud = grid_cloud(3, 3, 1.0, 0.5);
        assert!(matches!(
            estimate_density(&cloud, 0.0),
            Err(ChangeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_min_points_for_cluster() {
        // 100 points per unit area, circle of radius 0.5 holds ~78.5 points
        assert_eq!(min_points_for_cluster(100.0, 0.5, 1.0).unwrap(), 79);
        assert_eq!(min_points_for_cluster(100.0, 0.5, 0.5).unwrap(), 40);
        assert_eq!(min_points_for_cluster(1e-6, 0.5, 0.5).unwrap(), 1);
        assert!(min_points_for_cluster(100.0, 0.5, 0.0).is_err());
        assert!(min_points_for_cluster(100.0, 0.5, 1.5).is_err());
    }
}
