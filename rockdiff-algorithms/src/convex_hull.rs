use float_ord::FloatOrd;
use itertools::Itertools;
use rockdiff_core::geometry::{signed_area, Polygon};
use rockdiff_core::nalgebra::Point2;

use crate::delaunay::orientation;

/// 2D convex hull with Andrew's monotone chain algorithm.
/// Returns the indices of the hull vertices within `points` in counter-clockwise order, starting at the
/// lexicographically smallest point. Collinear points on hull edges are not part of the result. Returns fewer than
/// three indices if the points are all collinear or coincide
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<usize> {
    let sorted = (0..points.len())
        .sorted_by_key(|&index| (FloatOrd(points[index].x), FloatOrd(points[index].y)))
        .dedup_by(|a, b| points[*a] == points[*b])
        .collect::<Vec<_>>();
    if sorted.len() < 3 {
        return sorted;
    }

    let turns_left = |hull: &[usize], next: usize| {
        orientation(
            &points[hull[hull.len() - 2]],
            &points[hull[hull.len() - 1]],
            &points[next],
        ) > 0.0
    };

    let mut hull: Vec<usize> = Vec::with_capacity(2 * sorted.len());
    for &index in sorted.iter() {
        while hull.len() >= 2 && !turns_left(&hull, index) {
            hull.pop();
        }
        hull.push(index);
    }
    let lower_len = hull.len() + 1;
    for &index in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len && !turns_left(&hull, index) {
            hull.pop();
        }
        hull.push(index);
    }
    // The last point is the first point again
    hull.pop();
    hull
}

/// Convex hull of the given points as a polygon. Returns `None` if the hull has no area
pub fn convex_hull_polygon(points: &[Point2<f64>]) -> Option<Polygon> {
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return None;
    }
    Some(Polygon::new(
        hull.into_iter().map(|index| points[index]).collect(),
    ))
}

/// Area of the convex hull of the given points
pub fn convex_hull_area(points: &[Point2<f64>]) -> f64 {
    let hull = convex_hull(points)
        .into_iter()
        .map(|index| points[index])
        .collect::<Vec<_>>();
    signed_area(&hull).abs()
}
