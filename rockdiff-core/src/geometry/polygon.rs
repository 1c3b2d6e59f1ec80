use nalgebra::{Point2, Vector2};

/// Signed area of a closed ring given by its vertices (the closing edge from the last to the first vertex is
/// implicit). Counter-clockwise rings have a positive area, clockwise rings a negative one
/// ```
/// # use rockdiff_core::geometry::signed_area;
/// # use rockdiff_core::nalgebra::Point2;
/// let square = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)];
/// assert_eq!(signed_area(&square), 1.0);
/// ```
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (index, current) in ring.iter().enumerate() {
        let next = &ring[(index + 1) % ring.len()];
        twice_area += current.x * next.y - next.x * current.y;
    }
    twice_area / 2.0
}

/// Even-odd ray casting test. Returns true if `point` lies inside the closed ring. Points exactly on an edge may be
/// classified either way
pub fn ring_contains(ring: &[Point2<f64>], point: &Point2<f64>) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut previous = &ring[ring.len() - 1];
    for current in ring {
        if (current.y > point.y) != (previous.y > point.y) {
            let crossing_x =
                current.x + (point.y - current.y) * (previous.x - current.x) / (previous.y - current.y);
            if point.x < crossing_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

/// A simple polygon in the projection plane with optional holes. Rings are stored without repeating the first
/// vertex. The exterior ring is counter-clockwise, holes are clockwise
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Vec<Point2<f64>>,
    interiors: Vec<Vec<Point2<f64>>>,
}

impl Polygon {
    /// Creates a polygon without holes
    pub fn new(exterior: Vec<Point2<f64>>) -> Self {
        Self::with_holes(exterior, vec![])
    }

    /// Creates a polygon with holes. Ring orientations are normalized: the exterior becomes counter-clockwise and
    /// the holes clockwise
    pub fn with_holes(mut exterior: Vec<Point2<f64>>, mut interiors: Vec<Vec<Point2<f64>>>) -> Self {
        if signed_area(&exterior) < 0.0 {
            exterior.reverse();
        }
        for hole in interiors.iter_mut() {
            if signed_area(hole) > 0.0 {
                hole.reverse();
            }
        }
        Self {
            exterior,
            interiors,
        }
    }

    pub fn exterior(&self) -> &[Point2<f64>] {
        &self.exterior
    }

    pub fn interiors(&self) -> &[Vec<Point2<f64>>] {
        &self.interiors
    }

    /// Area enclosed by the exterior ring minus the area of all holes
    /// ```
    /// # use rockdiff_core::geometry::Polygon;
    /// # use rockdiff_core::nalgebra::Point2;
    /// let polygon = Polygon::with_holes(
    ///     vec![Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), Point2::new(4.0, 4.0), Point2::new(0.0, 4.0)],
    ///     vec![vec![Point2::new(1.0, 1.0), Point2::new(2.0, 1.0), Point2::new(2.0, 2.0), Point2::new(1.0, 2.0)]],
    /// );
    /// assert_eq!(polygon.area(), 15.0);
    /// ```
    pub fn area(&self) -> f64 {
        let holes: f64 = self.interiors.iter().map(|hole| signed_area(hole).abs()).sum();
        signed_area(&self.exterior).abs() - holes
    }

    /// Returns true if `point` lies inside the exterior ring and outside of all holes
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        ring_contains(&self.exterior, point)
            && !self.interiors.iter().any(|hole| ring_contains(hole, point))
    }

    /// Returns a copy of this polygon moved by `offset`
    pub fn translated(&self, offset: &Vector2<f64>) -> Polygon {
        let translate_ring =
            |ring: &[Point2<f64>]| ring.iter().map(|vertex| vertex + offset).collect::<Vec<_>>();
        Polygon {
            exterior: translate_ring(&self.exterior),
            interiors: self
                .interiors
                .iter()
                .map(|hole| translate_ring(hole))
                .collect(),
        }
    }
}
