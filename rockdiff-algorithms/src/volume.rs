use rockdiff_core::geometry::Boundary;
use rockdiff_core::nalgebra::Point2;
use rockdiff_core::{ChangeError, Result, Stage};

use crate::delaunay::{triangulate, Triangulation};

/// Triangles of a cluster footprint, as index triples into the projected points of the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriangleMesh {
    triangles: Vec<[usize; 3]>,
}

impl TriangleMesh {
    pub fn new(triangles: Vec<[usize; 3]>) -> Self {
        Self { triangles }
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Integrated footprint area and displaced volume of a cluster
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeEstimate {
    pub area: f64,
    pub volume: f64,
    /// The triangles that contributed to `area` and `volume`
    pub mesh: TriangleMesh,
}

/// Integrates displacement over the footprint of a cluster. See [integrate_volume_with] for details
///
/// # Panics
///
/// If `points` and `magnitudes` have different lengths
///
/// ```
/// # use rockdiff_algorithms::volume::integrate_volume;
/// # use rockdiff_core::geometry::{Boundary, Polygon};
/// # use rockdiff_core::nalgebra::Point2;
/// let square = vec![
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ];
/// let boundary = Boundary::Single(Polygon::new(square.clone()));
/// let estimate = integrate_volume(&square, &[0.5; 4], &boundary).unwrap();
/// assert!((estimate.area - 1.0).abs() < 1e-9);
/// assert!((estimate.volume - 0.5).abs() < 1e-9);
/// ```
pub fn integrate_volume(
    points: &[Point2<f64>],
    magnitudes: &[f64],
    boundary: &Boundary,
) -> Result<VolumeEstimate> {
    assert_eq!(
        points.len(),
        magnitudes.len(),
        "Every point needs exactly one displacement magnitude"
    );
    if points.len() < 3 {
        return Err(ChangeError::data_insufficient(
            Stage::VolumeIntegration,
            format!("{} points cannot span a footprint", points.len()),
        ));
    }
    let triangulation = triangulate(points)?;
    integrate_volume_with(&triangulation, magnitudes, boundary)
}

/// Integrates displacement over an existing Delaunay triangulation of the projected cluster points.
///
/// Only triangles whose centroid lies inside some polygon of `boundary` are retained. Each retained triangle
/// contributes its planar area and the volume `area * mean(magnitude)` of its three vertices. `magnitudes` must be
/// the displacements in the direction of the threshold pass that produced the cluster, so that volumes of one pass
/// share their sign. Fails with [GeometryDegenerate](ChangeError::GeometryDegenerate) if no triangle is retained
///
/// # Panics
///
/// If `magnitudes` has a different length than the triangulated point set
pub fn integrate_volume_with(
    triangulation: &Triangulation,
    magnitudes: &[f64],
    boundary: &Boundary,
) -> Result<VolumeEstimate> {
    assert_eq!(
        triangulation.points().len(),
        magnitudes.len(),
        "Every point needs exactly one displacement magnitude"
    );

    let retained = triangulation
        .triangles()
        .iter()
        .filter(|triangle| boundary.contains(&triangulation.centroid(triangle)))
        .copied()
        .collect::<Vec<_>>();
    if retained.is_empty() {
        return Err(ChangeError::geometry_degenerate(
            Stage::VolumeIntegration,
            format!(
                "none of the {} triangles lies inside the boundary",
                triangulation.len()
            ),
        ));
    }

    let (area, volume) = retained
        .iter()
        .fold((0.0, 0.0), |(area, volume), triangle| {
            let triangle_area = triangulation.triangle_area(triangle);
            let mean_magnitude = triangle.iter().map(|v| magnitudes[*v]).sum::<f64>() / 3.0;
            (area + triangle_area, volume + triangle_area * mean_magnitude)
        });

    Ok(VolumeEstimate {
        area,
        volume,
        mesh: TriangleMesh::new(retained),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alpha_shape::{alpha_shape_from_triangulation, AlphaMode};
    use crate::convex_hull::convex_hull_area;
    use crate::test_utils::seeded_rng;
    use assert_approx_eq::assert_approx_eq;
    use rand::Rng;
    use rockdiff_core::geometry::Polygon;

    fn unit_square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_uniform_unit_square() {
        let square = unit_square();
        let boundary = Boundary::Single(Polygon::new(square.clone()));
        let estimate = integrate_volume(&square, &[0.5; 4], &boundary).unwrap();
        assert_approx_eq!(estimate.area, 1.0);
        assert_approx_eq!(estimate.volume, 0.5);
        assert_eq!(estimate.mesh.len(), 2);
    }

    #[test]
    fn test_linear_displacement() {
        // A plane rising from 0 to 2 along x over a 2x1 rectangle holds a volume of 2
        let points = (0..=4)
            .flat_map(|x| (0..=2).map(move |y| Point2::new(x as f64 * 0.5, y as f64 * 0.5)))
            .collect::<Vec<_>>();
        let magnitudes = points.iter().map(|p| p.x).collect::<Vec<_>>();
        let boundary = Boundary::Single(Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 1.0),
        ]));
        let estimate = integrate_volume(&points, &magnitudes, &boundary).unwrap();
        assert_approx_eq!(estimate.area, 2.0);
        assert_approx_eq!(estimate.volume, 2.0);
    }

    #[test]
    fn test_boundary_restricts_triangles() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ];
        // Only the left half of the rectangle
        let boundary = Boundary::Single(Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]));
        let estimate = integrate_volume(&points, &[1.0; 6], &boundary).unwrap();
        assert_approx_eq!(estimate.area, 1.0);
        assert_approx_eq!(estimate.volume, 1.0);
    }

    #[test]
    fn test_area_never_exceeds_convex_hull() {
        let mut rng = seeded_rng(21);
        for _ in 0..5 {
            let points = (0..150)
                .map(|_| Point2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-1.0..1.0)))
                .collect::<Vec<_>>();
            let magnitudes = vec![0.3; points.len()];
            let triangulation = triangulate(&points).unwrap();
            let shape = alpha_shape_from_triangulation(&triangulation, &AlphaMode::default()).unwrap();
            let estimate = integrate_volume_with(&triangulation, &magnitudes, &shape.boundary).unwrap();
            assert!(estimate.area <= convex_hull_area(&points) + 1e-9);
            assert!(estimate.volume >= 0.0);
            assert_approx_eq!(estimate.volume, 0.3 * estimate.area);
        }
    }

    #[test]
    fn test_convex_hull_alpha_integrates_hull_area() {
        let mut rng = seeded_rng(34);
        for _ in 0..50 {
            let points = (0..rng.gen_range(3..40))
                .map(|_| Point2::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..1.0)))
                .collect::<Vec<_>>();
            let magnitudes = vec![0.5; points.len()];
            let triangulation = triangulate(&points).unwrap();
            let shape = alpha_shape_from_triangulation(&triangulation, &AlphaMode::Fixed(0.0)).unwrap();
            let estimate = integrate_volume_with(&triangulation, &magnitudes, &shape.boundary).unwrap();
            let hull_area = convex_hull_area(&points);
            assert_approx_eq!(shape.boundary.area(), hull_area, 1e-9);
            assert_approx_eq!(estimate.area, hull_area, 1e-9);
            assert_approx_eq!(estimate.volume, 0.5 * hull_area, 1e-9);
        }
    }

    #[test]
    fn test_zero_displacement_gives_zero_volume() {
        let square = unit_square();
        let boundary = Boundary::Single(Polygon::new(square.clone()));
        let estimate = integrate_volume(&square, &[0.0; 4], &boundary).unwrap();
        assert_approx_eq!(estimate.area, 1.0);
        assert_eq!(estimate.volume, 0.0);
    }

    #[test]
    fn test_insufficient_and_degenerate() {
        let square = unit_square();
        let boundary = Boundary::Single(Polygon::new(square.clone()));
        assert!(matches!(
            integrate_volume(&square[..2], &[1.0; 2], &boundary),
            Err(ChangeError::DataInsufficient { .. })
        ));

        let elsewhere = Boundary::Single(Polygon::new(vec![
            Point2::new(10.0, 10.0),
            Point2::new(11.0, 10.0),
            Point2::new(11.0, 11.0),
        ]));
        assert!(matches!(
            integrate_volume(&square, &[1.0; 4], &elsewhere),
            Err(ChangeError::GeometryDegenerate {
                stage: Stage::VolumeIntegration,
                ..
            })
        ));
    }
}
