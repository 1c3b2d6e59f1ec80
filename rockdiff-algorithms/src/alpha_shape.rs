use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use log::debug;
use rayon::prelude::*;
use rockdiff_core::geometry::{ring_contains, signed_area, Boundary, Polygon};
use rockdiff_core::math::percentile;
use rockdiff_core::nalgebra::{Point2, Vector2};
use rockdiff_core::{ChangeError, Result, Stage};

use crate::convex_hull::convex_hull_polygon;
use crate::delaunay::{triangulate, Triangulation};
use crate::spatial_index::PlanarIndex;

/// Relative tolerance when comparing circumradii against `1 / alpha`, so that the radius an alpha was derived from
/// still passes after the round trip through the reciprocal
const RADIUS_TOLERANCE: f64 = 1e-9;

/// How the alpha parameter of the alpha shape is chosen
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlphaMode {
    /// `alpha = 1 / (2d)`, where `d` is the given percentile of the nearest neighbour distances
    Auto { percentile: f64 },
    /// A fixed alpha. Zero yields the convex hull
    Fixed(f64),
    /// The largest alpha for which every point is still a vertex of the shape
    Optimize,
}

impl Default for AlphaMode {
    fn default() -> Self {
        AlphaMode::Auto { percentile: 50.0 }
    }
}

impl AlphaMode {
    pub fn validate(&self) -> Result<()> {
        match self {
            AlphaMode::Auto { percentile } if !(0.0..=100.0).contains(percentile) => {
                Err(ChangeError::invalid_parameter(
                    Stage::BoundaryReconstruction,
                    "percentile",
                    format!("must be in [0, 100], got {}", percentile),
                ))
            }
            AlphaMode::Fixed(alpha) if !(alpha.is_finite() && *alpha >= 0.0) => {
                Err(ChangeError::invalid_parameter(
                    Stage::BoundaryReconstruction,
                    "alpha",
                    format!("must be a non-negative number, got {}", alpha),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl Display for AlphaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlphaMode::Auto { percentile } => write!(f, "auto (percentile {})", percentile),
            AlphaMode::Fixed(alpha) => write!(f, "{}", alpha),
            AlphaMode::Optimize => f.write_str("optimize"),
        }
    }
}

/// Reconstructed footprint of a point set
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaShape {
    /// The alpha that was used
    pub alpha: f64,
    pub boundary: Boundary,
}

fn degenerate<S: Into<String>>(reason: S) -> ChangeError {
    ChangeError::geometry_degenerate(Stage::BoundaryReconstruction, reason)
}

/// Estimates alpha from the point spacing: `d` is the `percentile` of the distances of all points to their nearest
/// distinct neighbour and `alpha = 1 / (2d)`. Sparse point sets get a looser shape than dense ones
/// ```
/// # use rockdiff_algorithms::alpha_shape::estimate_alpha;
/// # use rockdiff_core::nalgebra::Point2;
/// let points = (0..10).flat_map(|x| (0..10).map(move |y| Point2::new(x as f64 * 0.5, y as f64 * 0.5)));
/// let alpha = estimate_alpha(&points.collect::<Vec<_>>(), 50.0).unwrap();
/// assert!((alpha - 1.0).abs() < 1e-9);
/// ```
pub fn estimate_alpha(points: &[Point2<f64>], nn_percentile: f64) -> Result<f64> {
    AlphaMode::Auto {
        percentile: nn_percentile,
    }
    .validate()?;
    let index = PlanarIndex::new(points);
    let distances = points
        .par_iter()
        .filter_map(|point| index.nearest_distinct_distance(point))
        .collect::<Vec<_>>();
    let spacing = percentile(&distances, nn_percentile)
        .ok_or_else(|| degenerate("points have no distinct neighbours to estimate the spacing from"))?;
    Ok(1.0 / (2.0 * spacing))
}

/// The largest alpha for which every triangulated point is a vertex of at least one triangle of the shape: the
/// reciprocal of the largest per-vertex minimum circumradius
pub fn optimize_alpha(triangulation: &Triangulation) -> Result<f64> {
    let mut min_radius = HashMap::new();
    for triangle in triangulation.triangles() {
        let radius = triangulation.circumradius(triangle);
        for vertex in triangle.iter() {
            let entry = min_radius.entry(*vertex).or_insert(f64::INFINITY);
            if radius < *entry {
                *entry = radius;
            }
        }
    }
    let radius = min_radius.values().copied().fold(0.0, f64::max);
    if !(radius.is_finite() && radius > 0.0) {
        return Err(degenerate("no finite circumradius to derive alpha from"));
    }
    Ok(1.0 / radius)
}

/// Resolves the alpha value for the given mode
pub fn resolve_alpha(mode: &AlphaMode, triangulation: &Triangulation) -> Result<f64> {
    mode.validate()?;
    let alpha = match mode {
        AlphaMode::Auto { percentile } => estimate_alpha(triangulation.points(), *percentile)?,
        AlphaMode::Fixed(alpha) => *alpha,
        AlphaMode::Optimize => optimize_alpha(triangulation)?,
    };
    debug!("Using alpha {} ({})", alpha, mode);
    Ok(alpha)
}

/// Delaunay triangulation of a footprint that is about to be reconstructed. Failures are reported as errors of the
/// boundary reconstruction stage
pub fn triangulate_footprint(points: &[Point2<f64>]) -> Result<Triangulation> {
    if points.len() < 3 {
        return Err(degenerate(format!(
            "an alpha shape needs at least 3 points, got {}",
            points.len()
        )));
    }
    triangulate(points).map_err(|err| match err {
        ChangeError::GeometryDegenerate { reason, .. } => degenerate(reason),
        other => other,
    })
}

/// Computes the alpha shape of the given points. See [alpha_shape_from_triangulation]
pub fn alpha_shape(points: &[Point2<f64>], mode: &AlphaMode) -> Result<AlphaShape> {
    let triangulation = triangulate_footprint(points)?;
    alpha_shape_from_triangulation(&triangulation, mode)
}

/// Computes the alpha shape of a triangulated point set: the union of all Delaunay triangles whose circumradius is
/// at most `1 / alpha`. Its boundary may consist of several polygons, each of which may have holes. All of them are
/// kept, ordered by descending area.
///
/// An alpha of zero yields the convex hull. Fails with [GeometryDegenerate](ChangeError::GeometryDegenerate) if alpha
/// is so large that no triangle remains
pub fn alpha_shape_from_triangulation(
    triangulation: &Triangulation,
    mode: &AlphaMode,
) -> Result<AlphaShape> {
    let alpha = resolve_alpha(mode, triangulation)?;
    let points = triangulation.points();

    if alpha == 0.0 {
        let hull = convex_hull_polygon(points).ok_or_else(|| degenerate("convex hull has no area"))?;
        return Ok(AlphaShape {
            alpha,
            boundary: Boundary::Single(hull),
        });
    }

    let max_radius = (1.0 / alpha) * (1.0 + RADIUS_TOLERANCE);
    let kept = triangulation
        .triangles()
        .iter()
        .filter(|triangle| triangulation.circumradius(triangle) <= max_radius)
        .collect::<Vec<_>>();
    if kept.is_empty() {
        return Err(degenerate(format!(
            "alpha {} removes all {} triangles",
            alpha,
            triangulation.len()
        )));
    }

    // Edges used by exactly one kept triangle form the boundary. Triangles are counter-clockwise, so the shape lies
    // to the left of each directed boundary edge
    let mut edge_use = HashMap::new();
    for triangle in kept.iter() {
        for i in 0..3 {
            let (a, b) = (triangle[i], triangle[(i + 1) % 3]);
            *edge_use.entry((a.min(b), a.max(b))).or_insert(0usize) += 1;
        }
    }
    let mut boundary_edges = kept
        .iter()
        .flat_map(|triangle| (0..3).map(move |i| (triangle[i], triangle[(i + 1) % 3])))
        .filter(|(a, b)| edge_use[&(*a.min(b), *a.max(b))] == 1)
        .collect::<Vec<_>>();
    boundary_edges.sort_unstable();

    let rings = trace_rings(points, &boundary_edges);
    let (exteriors, holes): (Vec<_>, Vec<_>) = rings
        .into_iter()
        .map(|ring| ring.into_iter().map(|index| points[index]).collect::<Vec<_>>())
        .partition(|ring| signed_area(ring) > 0.0);

    let mut interiors = vec![Vec::new(); exteriors.len()];
    for hole in holes {
        let owner = exteriors
            .iter()
            .enumerate()
            .map(|(index, exterior)| {
                let inside = hole
                    .iter()
                    .filter(|vertex| ring_contains(exterior, vertex))
                    .count();
                (inside, index)
            })
            .filter(|(inside, _)| *inside > 0)
            .max_by_key(|(inside, index)| (*inside, std::cmp::Reverse(*index)));
        match owner {
            Some((_, index)) => interiors[index].push(hole),
            None => debug!("Dropping a hole ring that lies outside of all exterior rings"),
        }
    }

    let polygons = exteriors
        .into_iter()
        .zip(interiors)
        .map(|(exterior, interiors)| Polygon::with_holes(exterior, interiors))
        .collect::<Vec<_>>();
    let boundary = Boundary::from_polygons(polygons)
        .ok_or_else(|| degenerate("no closed boundary ring could be traced"))?;
    Ok(AlphaShape { alpha, boundary })
}

/// Clockwise angle in `(0, 2pi]` by which `from` has to be rotated to point along `to`
fn clockwise_angle(from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    let counter_clockwise = (from.x * to.y - from.y * to.x).atan2(from.dot(to));
    if counter_clockwise >= 0.0 {
        std::f64::consts::TAU - counter_clockwise
    } else {
        -counter_clockwise
    }
}

/// Links directed boundary edges into closed rings of vertex indices. At vertices where several rings touch, the
/// outgoing edge with the smallest clockwise turn from the reversed incoming edge is taken, which keeps every ring
/// simple
fn trace_rings(points: &[Point2<f64>], edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for &(from, to) in edges {
        outgoing.entry(from).or_default().push(to);
    }

    let mut used = HashSet::new();
    let mut rings = vec![];
    for &start_edge in edges {
        if !used.insert(start_edge) {
            continue;
        }
        let (start, first) = start_edge;
        let mut ring = vec![start];
        let mut previous = start;
        let mut current = first;
        let mut closed = false;
        for _ in 0..edges.len() {
            let backwards = points[previous] - points[current];
            let next = outgoing.get(&current).and_then(|targets| {
                targets
                    .iter()
                    .filter(|to| (current, **to) == start_edge || !used.contains(&(current, **to)))
                    .min_by(|a, b| {
                        let angle_a = clockwise_angle(&backwards, &(points[**a] - points[current]));
                        let angle_b = clockwise_angle(&backwards, &(points[**b] - points[current]));
                        angle_a
                            .partial_cmp(&angle_b)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .copied()
            });
            let next = match next {
                Some(next) => next,
                None => break,
            };
            if (current, next) == start_edge {
                closed = true;
                break;
            }
            used.insert((current, next));
            ring.push(current);
            previous = current;
            current = next;
        }
        if closed && ring.len() >= 3 {
            rings.push(ring);
        } else {
            debug!("Discarding an open boundary chain of {} vertices", ring.len());
        }
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convex_hull::convex_hull_area;
    use crate::test_utils::seeded_rng;
    use assert_approx_eq::assert_approx_eq;
    use rand::Rng;

    fn grid(nx: usize, ny: usize, spacing: f64, offset: Vector2<f64>) -> Vec<Point2<f64>> {
        (0..nx)
            .flat_map(|x| {
                (0..ny).map(move |y| {
                    Point2::new(x as f64 * spacing + offset.x, y as f64 * spacing + offset.y)
                })
            })
            .collect()
    }

    #[test]
    fn test_dense_grid_gives_single_polygon() {
        let points = grid(6, 6, 1.0, Vector2::zeros());
        let shape = alpha_shape(&points, &AlphaMode::default()).unwrap();
        assert_approx_eq!(shape.alpha, 0.5);
        assert!(matches!(shape.boundary, Boundary::Single(_)));
        assert_approx_eq!(shape.boundary.area(), 25.0);
    }

    #[test]
    fn test_separated_patches_give_multiple_polygons() {
        let mut points = grid(5, 5, 1.0, Vector2::zeros());
        points.extend(grid(3, 3, 1.0, Vector2::new(20.0, 0.0)));
        let shape = alpha_shape(&points, &AlphaMode::default()).unwrap();
        assert_eq!(shape.boundary.len(), 2);
        assert_approx_eq!(shape.boundary.area(), 20.0);
        assert_approx_eq!(shape.boundary.dominant().unwrap().area(), 16.0);
        assert!(shape.boundary.contains(&Point2::new(21.0, 1.0)));
        assert!(!shape.boundary.contains(&Point2::new(10.0, 1.0)));
    }

    #[test]
    fn test_ring_with_hole() {
        // A 7x7 grid with the inner 3x3 block missing. The hole is the 4x4 square between the remaining points
        // with its corners cut off by the half-cell triangles that are still small enough
        let points = grid(7, 7, 1.0, Vector2::zeros())
            .into_iter()
            .filter(|p| !(p.x >= 2.0 && p.x <= 4.0 && p.y >= 2.0 && p.y <= 4.0))
            .collect::<Vec<_>>();
        let shape = alpha_shape(&points, &AlphaMode::Fixed(1.0)).unwrap();
        assert_eq!(shape.boundary.len(), 1);
        let polygon = shape.boundary.dominant().unwrap();
        assert_eq!(polygon.interiors().len(), 1);
        assert_approx_eq!(polygon.area(), 36.0 - 14.0);
        assert!(!shape.boundary.contains(&Point2::new(3.0, 3.0)));
    }

    #[test]
    fn test_zero_alpha_is_convex_hull() {
        let mut rng = seeded_rng(11);
        let points = (0..100)
            .map(|_| Point2::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..5.0)))
            .collect::<Vec<_>>();
        let shape = alpha_shape(&points, &AlphaMode::Fixed(0.0)).unwrap();
        assert_approx_eq!(shape.boundary.area(), convex_hull_area(&points));
        let concave = alpha_shape(&points, &AlphaMode::default()).unwrap();
        assert!(concave.boundary.area() <= convex_hull_area(&points) + 1e-9);
    }

    #[test]
    fn test_optimized_alpha_keeps_every_point() {
        let mut rng = seeded_rng(5);
        let points = (0..80)
            .map(|_| Point2::new(rng.gen_range(0.0..4.0), rng.gen_range(0.0..4.0)))
            .collect::<Vec<_>>();
        let triangulation = triangulate(&points).unwrap();
        let alpha = optimize_alpha(&triangulation).unwrap();
        let max_radius = 1.0 / alpha * (1.0 + RADIUS_TOLERANCE);
        let mut covered = vec![false; points.len()];
        for triangle in triangulation.triangles() {
            if triangulation.circumradius(triangle) <= max_radius {
                for vertex in triangle.iter() {
                    covered[*vertex] = true;
                }
            }
        }
        assert!(covered.iter().all(|c| *c));
        assert!(alpha_shape_from_triangulation(&triangulation, &AlphaMode::Optimize).is_ok());
    }

    #[test]
    fn test_degenerate_inputs() {
        let two = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(matches!(
            alpha_shape(&two, &AlphaMode::default()),
            Err(ChangeError::GeometryDegenerate {
                stage: Stage::BoundaryReconstruction,
                ..
            })
        ));
        let collinear = (0..4)
            .map(|i| Point2::new(i as f64, 0.0))
            .collect::<Vec<_>>();
        assert!(matches!(
            alpha_shape(&collinear, &AlphaMode::default()),
            Err(ChangeError::GeometryDegenerate {
                stage: Stage::BoundaryReconstruction,
                ..
            })
        ));
        let square = grid(2, 2, 1.0, Vector2::zeros());
        assert!(alpha_shape(&square, &AlphaMode::Fixed(100.0)).is_err());
        assert!(alpha_shape(&square, &AlphaMode::Fixed(-1.0)).is_err());
        assert!(alpha_shape(&square, &AlphaMode::Auto { percentile: 120.0 }).is_err());
    }

    #[test]
    fn test_clockwise_angle() {
        let backwards = Vector2::new(-1.0, 0.0);
        assert_approx_eq!(
            clockwise_angle(&backwards, &Vector2::new(0.0, 1.0)),
            std::f64::consts::FRAC_PI_2
        );
        assert_approx_eq!(
            clockwise_angle(&backwards, &Vector2::new(0.0, -1.0)),
            3.0 * std::f64::consts::FRAC_PI_2
        );
        assert_approx_eq!(clockwise_angle(&backwards, &backwards), std::f64::consts::TAU);
    }
}
