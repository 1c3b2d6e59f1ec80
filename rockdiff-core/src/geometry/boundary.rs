use nalgebra::{Point2, Vector2};

use super::Polygon;

/// Footprint boundary of a cluster. The alpha shape of a cluster can fall apart into several disjoint polygons, all
/// of which are kept: triangle retention during volume integration tests membership in any of them
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Single(Polygon),
    Multiple(Vec<Polygon>),
}

impl Boundary {
    /// Creates a boundary from the given polygons. Returns `None` if `polygons` is empty. Polygons are ordered by
    /// descending area, so the dominant polygon comes first
    pub fn from_polygons(mut polygons: Vec<Polygon>) -> Option<Boundary> {
        polygons.sort_by(|a, b| {
            b.area()
                .partial_cmp(&a.area())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        match polygons.len() {
            0 => None,
            1 => polygons.pop().map(Boundary::Single),
            _ => Some(Boundary::Multiple(polygons)),
        }
    }

    /// All polygons of this boundary
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Boundary::Single(polygon) => std::slice::from_ref(polygon),
            Boundary::Multiple(polygons) => polygons,
        }
    }

    /// Number of polygons
    pub fn len(&self) -> usize {
        self.polygons().len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons().is_empty()
    }

    /// Returns true if `point` lies inside any polygon of this boundary
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        self.polygons().iter().any(|polygon| polygon.contains(point))
    }

    /// Summed area of all polygons
    pub fn area(&self) -> f64 {
        self.polygons().iter().map(|polygon| polygon.area()).sum()
    }

    /// The polygon with the largest area
    pub fn dominant(&self) -> Option<&Polygon> {
        self.polygons().iter().max_by(|a, b| {
            a.area()
                .partial_cmp(&b.area())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Returns a copy of this boundary moved by `offset`
    pub fn translated(&self, offset: &Vector2<f64>) -> Boundary {
        match self {
            Boundary::Single(polygon) => Boundary::Single(polygon.translated(offset)),
            Boundary::Multiple(polygons) => Boundary::Multiple(
                polygons
                    .iter()
                    .map(|polygon| polygon.translated(offset))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn rectangle(x0: f64, y0: f64, width: f64, height: f64) -> Polygon {
        Polygon::new(vec![
            Point2::new(x0, y0),
            Point2::new(x0 + width, y0),
            Point2::new(x0 + width, y0 + height),
            Point2::new(x0, y0 + height),
        ])
    }

    #[test]
    fn test_single_and_multiple() {
        assert!(Boundary::from_polygons(vec![]).is_none());
        let single = Boundary::from_polygons(vec![rectangle(0.0, 0.0, 1.0, 1.0)]).unwrap();
        assert!(matches!(single, Boundary::Single(_)));
        assert_eq!(single.len(), 1);

        let multiple = Boundary::from_polygons(vec![
            rectangle(0.0, 0.0, 1.0, 1.0),
            rectangle(5.0, 5.0, 2.0, 3.0),
        ])
        .unwrap();
        assert_eq!(multiple.len(), 2);
        assert_approx_eq!(multiple.area(), 7.0);
        assert_approx_eq!(multiple.dominant().unwrap().area(), 6.0);
        assert_approx_eq!(multiple.polygons()[0].area(), 6.0);
    }

    #[test]
    fn test_contains_any_polygon() {
        let boundary = Boundary::from_polygons(vec![
            rectangle(0.0, 0.0, 1.0, 1.0),
            rectangle(5.0, 5.0, 2.0, 3.0),
        ])
        .unwrap();
        assert!(boundary.contains(&Point2::new(0.5, 0.5)));
        assert!(boundary.contains(&Point2::new(6.0, 7.0)));
        assert!(!boundary.contains(&Point2::new(3.0, 3.0)));
    }
}
