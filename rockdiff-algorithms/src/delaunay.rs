use std::collections::HashMap;

use float_ord::FloatOrd;
use log::debug;
use rockdiff_core::nalgebra::{Point2, Vector2};
use rockdiff_core::{ChangeError, Result, Stage};

/// Vertex at infinity. Every hull edge has a ghost triangle made of the edge and this vertex, so the triangulation
/// always covers the whole plane and points outside the current hull can be located like any other point
const GHOST: usize = usize::MAX;

/// Twice the signed area of the triangle `abc`. Positive if `abc` is counter-clockwise
pub(crate) fn orientation(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Returns true if `d` lies strictly inside the circumcircle of the counter-clockwise triangle `abc`
fn in_circumcircle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> bool {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);
    let det = (adx * adx + ady * ady) * (bdx * cdy - cdx * bdy)
        - (bdx * bdx + bdy * bdy) * (adx * cdy - cdx * ady)
        + (cdx * cdx + cdy * cdy) * (adx * bdy - bdx * ady);
    det > 0.0
}

/// A Delaunay triangulation of a 2D point set. Triangles are counter-clockwise index triples into the point set
/// that was triangulated
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    points: Vec<Point2<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Number of triangles
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Area of the given triangle
    pub fn triangle_area(&self, triangle: &[usize; 3]) -> f64 {
        let [a, b, c] = *triangle;
        orientation(&self.points[a], &self.points[b], &self.points[c]).abs() / 2.0
    }

    pub fn centroid(&self, triangle: &[usize; 3]) -> Point2<f64> {
        let [a, b, c] = *triangle;
        let sum = self.points[a].coords + self.points[b].coords + self.points[c].coords;
        Point2::from(sum / 3.0)
    }

    /// Radius of the circumcircle of the given triangle. Infinite for degenerate triangles
    pub fn circumradius(&self, triangle: &[usize; 3]) -> f64 {
        let [a, b, c] = *triangle;
        let (a, b, c) = (&self.points[a], &self.points[b], &self.points[c]);
        let twice_area = orientation(a, b, c).abs();
        if twice_area == 0.0 {
            return f64::INFINITY;
        }
        (b - a).norm() * (c - b).norm() * (a - c).norm() / (2.0 * twice_area)
    }

    /// Total area of all triangles
    pub fn area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|triangle| self.triangle_area(triangle))
            .sum()
    }
}

#[derive(Debug, Copy, Clone)]
struct Triangle {
    vertices: [usize; 3],
    /// `neighbours[i]` shares the edge opposite of `vertices[i]`
    neighbours: [Option<usize>; 3],
    alive: bool,
}

impl Triangle {
    fn new(vertices: [usize; 3]) -> Self {
        Self {
            vertices,
            neighbours: [None; 3],
            alive: true,
        }
    }

    fn edge(&self, opposite: usize) -> (usize, usize) {
        (
            self.vertices[(opposite + 1) % 3],
            self.vertices[(opposite + 2) % 3],
        )
    }

    fn ghost_position(&self) -> Option<usize> {
        self.vertices.iter().position(|v| *v == GHOST)
    }

    /// The hull edge of a ghost triangle, directed so that the outside of the hull lies to its left
    fn hull_edge(&self) -> Option<(usize, usize)> {
        self.ghost_position().map(|position| self.edge(position))
    }
}

/// Returns true if `p`, which is collinear with `a` and `b`, lies strictly between them
fn on_open_segment(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> bool {
    let direction = b - a;
    let t = (p - a).dot(&direction);
    t > 0.0 && t < direction.norm_squared()
}

/// Incrementally built triangulation that keeps triangle adjacency for point location and cavity search
struct Mesh {
    points: Vec<Point2<f64>>,
    triangles: Vec<Triangle>,
    last: usize,
    cavity_marks: Vec<usize>,
    insertion: usize,
}

impl Mesh {
    /// Starts the mesh with the counter-clockwise triangle `seed` and the ghost triangles of its three edges
    fn new(points: Vec<Point2<f64>>, seed: [usize; 3]) -> Self {
        let [a, b, c] = seed;
        let mut triangles = vec![
            Triangle::new([a, b, c]),
            Triangle::new([b, a, GHOST]),
            Triangle::new([c, b, GHOST]),
            Triangle::new([a, c, GHOST]),
        ];
        let mut edges = HashMap::new();
        for (id, triangle) in triangles.iter().enumerate() {
            for i in 0..3 {
                edges.insert(triangle.edge(i), id);
            }
        }
        for triangle in triangles.iter_mut() {
            for i in 0..3 {
                let (from, to) = triangle.edge(i);
                triangle.neighbours[i] = edges.get(&(to, from)).copied();
            }
        }
        let count = triangles.len();
        Self {
            points,
            triangles,
            last: 0,
            cavity_marks: vec![0; count],
            insertion: 0,
        }
    }

    /// A ghost triangle covers the open half-plane beyond its hull edge plus the open edge itself
    fn beyond_hull_edge(&self, (a, b): (usize, usize), point: &Point2<f64>) -> bool {
        let (a, b) = (&self.points[a], &self.points[b]);
        let side = orientation(a, b, point);
        side > 0.0 || (side == 0.0 && on_open_segment(a, b, point))
    }

    fn contains(&self, triangle: usize, point: &Point2<f64>) -> bool {
        let triangle = &self.triangles[triangle];
        if let Some(edge) = triangle.hull_edge() {
            return self.beyond_hull_edge(edge, point);
        }
        (0..3).all(|i| {
            let (a, b) = triangle.edge(i);
            orientation(&self.points[a], &self.points[b], point) >= 0.0
        })
    }

    fn circumcircle_contains(&self, triangle: usize, point: &Point2<f64>) -> bool {
        let triangle = &self.triangles[triangle];
        if let Some(edge) = triangle.hull_edge() {
            return self.beyond_hull_edge(edge, point);
        }
        let [a, b, c] = triangle.vertices;
        in_circumcircle(&self.points[a], &self.points[b], &self.points[c], point)
    }

    /// Finds the triangle that contains `point` by walking from the most recently created triangle towards it.
    /// Falls back to a linear scan if the walk does not terminate
    fn locate(&self, point: &Point2<f64>) -> Option<usize> {
        let mut current = self.last;
        for _ in 0..self.triangles.len() {
            let triangle = &self.triangles[current];
            let next = match triangle.ghost_position() {
                Some(ghost) => {
                    if self.contains(current, point) {
                        return Some(current);
                    }
                    // Back across the hull edge
                    triangle.neighbours[ghost]
                }
                None => {
                    let next = (0..3).find_map(|i| {
                        let (a, b) = triangle.edge(i);
                        if orientation(&self.points[a], &self.points[b], point) < 0.0 {
                            triangle.neighbours[i]
                        } else {
                            None
                        }
                    });
                    if next.is_none() && self.contains(current, point) {
                        return Some(current);
                    }
                    next
                }
            };
            match next {
                Some(neighbour) => current = neighbour,
                None => break,
            }
        }
        (0..self.triangles.len())
            .find(|&triangle| self.triangles[triangle].alive && self.contains(triangle, point))
    }

    /// Inserts the point with the given index. Returns false if the point was skipped because it coincides with
    /// an existing vertex or could not be located
    fn insert(&mut self, vertex: usize, duplicate_tolerance: f64) -> bool {
        let point = self.points[vertex];
        let start = match self.locate(&point) {
            Some(triangle) => triangle,
            None => return false,
        };
        if self.triangles[start]
            .vertices
            .iter()
            .filter(|v| **v != GHOST)
            .any(|v| (self.points[*v] - point).norm_squared() <= duplicate_tolerance)
        {
            return false;
        }

        // Grow the cavity of all triangles whose circumcircle contains the new point
        self.insertion += 1;
        let mark = self.insertion;
        self.cavity_marks[start] = mark;
        let mut cavity = vec![start];
        let mut next = 0;
        while next < cavity.len() {
            let neighbours = self.triangles[cavity[next]].neighbours;
            next += 1;
            for neighbour in neighbours.iter().flatten() {
                if self.cavity_marks[*neighbour] != mark
                    && self.circumcircle_contains(*neighbour, &point)
                {
                    self.cavity_marks[*neighbour] = mark;
                    cavity.push(*neighbour);
                }
            }
        }

        // Edges on the cavity boundary, counter-clockwise as seen from inside the cavity
        let mut boundary = vec![];
        for &triangle in &cavity {
            let old = self.triangles[triangle];
            for i in 0..3 {
                let outer = old.neighbours[i];
                if outer.map_or(true, |outer| self.cavity_marks[outer] != mark) {
                    let (a, b) = old.edge(i);
                    boundary.push((a, b, outer, triangle));
                }
            }
        }
        for &triangle in &cavity {
            self.triangles[triangle].alive = false;
        }

        let first_new = self.triangles.len();
        let mut by_start = HashMap::with_capacity(boundary.len());
        let mut by_end = HashMap::with_capacity(boundary.len());
        for (offset, (a, b, outer, old)) in boundary.into_iter().enumerate() {
            let id = first_new + offset;
            let mut triangle = Triangle::new([a, b, vertex]);
            triangle.neighbours[2] = outer;
            self.triangles.push(triangle);
            if let Some(outer) = outer {
                for slot in self.triangles[outer].neighbours.iter_mut() {
                    if *slot == Some(old) {
                        *slot = Some(id);
                    }
                }
            }
            by_start.insert(a, id);
            by_end.insert(b, id);
        }
        // The new triangles form a fan around the inserted vertex
        for id in first_new..self.triangles.len() {
            let [a, b, _] = self.triangles[id].vertices;
            self.triangles[id].neighbours[0] = by_start.get(&b).copied();
            self.triangles[id].neighbours[1] = by_end.get(&a).copied();
        }
        self.cavity_marks.resize(self.triangles.len(), 0);
        self.last = first_new;
        true
    }
}

/// Order in which points are inserted: a snake through horizontal bands, so that consecutive points are close to
/// each other and point location walks stay short
fn insertion_order(points: &[Point2<f64>]) -> Vec<usize> {
    let (min_y, max_y) = points.iter().fold((f64::MAX, f64::MIN), |(min, max), p| {
        (min.min(p.y), max.max(p.y))
    });
    let bands = ((points.len() as f64).sqrt() / 2.0).ceil().max(1.0) as usize;
    let band_height = (max_y - min_y) / bands as f64;
    let band_of = |point: &Point2<f64>| {
        if band_height > 0.0 {
            (((point.y - min_y) / band_height) as usize).min(bands - 1)
        } else {
            0
        }
    };
    let mut order = (0..points.len()).collect::<Vec<_>>();
    order.sort_by_key(|&index| {
        let point = &points[index];
        let band = band_of(point);
        let x = if band % 2 == 0 { point.x } else { -point.x };
        (band, FloatOrd(x), index)
    });
    order
}

/// The first counter-clockwise triangle of distinct, non-collinear points in insertion order
fn seed_triangle(
    points: &[Point2<f64>],
    order: &[usize],
    duplicate_tolerance: f64,
) -> Option<[usize; 3]> {
    let first = *order.first()?;
    let second = order
        .iter()
        .copied()
        .find(|v| (points[*v] - points[first]).norm_squared() > duplicate_tolerance)?;
    let third = order
        .iter()
        .copied()
        .find(|v| orientation(&points[first], &points[second], &points[*v]) != 0.0)?;
    if orientation(&points[first], &points[second], &points[third]) > 0.0 {
        Some([first, second, third])
    } else {
        Some([first, third, second])
    }
}

fn degenerate<S: Into<String>>(reason: S) -> ChangeError {
    ChangeError::geometry_degenerate(Stage::VolumeIntegration, reason)
}

/// Computes the Delaunay triangulation of the given points with the Bowyer-Watson algorithm.
///
/// Points are shifted to their centroid before any geometric predicate is evaluated, so large survey coordinates do
/// not cost precision. Points that coincide with an already inserted point are skipped and do not appear in any
/// triangle. Fails with [GeometryDegenerate](ChangeError::GeometryDegenerate) if no triangle can be formed, i.e. if
/// there are fewer than three distinct points or all points are collinear.
///
/// ```
/// # use rockdiff_algorithms::delaunay::triangulate;
/// # use rockdiff_core::nalgebra::Point2;
/// let square = [
///     Point2::new(0.0, 0.0),
///     Point2::new(1.0, 0.0),
///     Point2::new(1.0, 1.0),
///     Point2::new(0.0, 1.0),
/// ];
/// let triangulation = triangulate(&square).unwrap();
/// assert_eq!(triangulation.len(), 2);
/// assert!((triangulation.area() - 1.0).abs() < 1e-12);
/// ```
pub fn triangulate(points: &[Point2<f64>]) -> Result<Triangulation> {
    if points.len() < 3 {
        return Err(degenerate(format!(
            "{} points cannot be triangulated",
            points.len()
        )));
    }
    if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(degenerate("points with non-finite coordinates"));
    }

    let center = points
        .iter()
        .fold(Vector2::zeros(), |sum, p| sum + p.coords)
        / points.len() as f64;
    let local = points
        .iter()
        .map(|p| Point2::from(p.coords - center))
        .collect::<Vec<_>>();
    let extent = local
        .iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0, f64::max);
    if extent == 0.0 {
        return Err(degenerate("all points coincide"));
    }

    let order = insertion_order(&local);
    let duplicate_tolerance = (extent * 1e-12) * (extent * 1e-12);
    let seed = seed_triangle(&local, &order, duplicate_tolerance).ok_or_else(|| {
        degenerate(format!(
            "no triangle can be formed from {} points, they are collinear or coincide",
            points.len()
        ))
    })?;

    let mut mesh = Mesh::new(local, seed);
    let skipped = order
        .into_iter()
        .filter(|vertex| !seed.contains(vertex))
        .filter(|&vertex| !mesh.insert(vertex, duplicate_tolerance))
        .count();
    if skipped > 0 {
        debug!("Skipped {} duplicate points during triangulation", skipped);
    }

    let triangles = mesh
        .triangles
        .iter()
        .filter(|triangle| triangle.alive && triangle.ghost_position().is_none())
        .filter(|triangle| {
            let [a, b, c] = triangle.vertices;
            orientation(&mesh.points[a], &mesh.points[b], &mesh.points[c]) > 0.0
        })
        .map(|triangle| triangle.vertices)
        .collect::<Vec<_>>();
    if triangles.is_empty() {
        return Err(degenerate(format!(
            "no triangle can be formed from {} points",
            points.len()
        )));
    }

    Ok(Triangulation {
        points: points.to_vec(),
        triangles,
    })
}
