use nalgebra::{Point3, Vector3};

use crate::layout::PointLayout;
use crate::math::AABB;

/// A single owned point: position, signed displacement and the values of the extra attributes of the layout that
/// the point belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub position: Vector3<f64>,
    pub diff: f64,
    pub attributes: Vec<f64>,
}

impl Point {
    /// Creates a point without extra attributes
    pub fn new(position: Vector3<f64>, diff: f64) -> Self {
        Self {
            position,
            diff,
            attributes: vec![],
        }
    }

    pub fn with_attributes(position: Vector3<f64>, diff: f64, attributes: Vec<f64>) -> Self {
        Self {
            position,
            diff,
            attributes,
        }
    }
}

/// Borrowed view onto a single point inside a [PointCloud]
#[derive(Debug, Copy, Clone)]
pub struct PointView<'a> {
    cloud: &'a PointCloud,
    index: usize,
}

impl<'a> PointView<'a> {
    /// Index of this point within its cloud
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn position(&self) -> &'a Vector3<f64> {
        &self.cloud.positions[self.index]
    }

    pub fn diff(&self) -> f64 {
        self.cloud.diffs[self.index]
    }

    /// Value of the extra attribute at `attribute_index` (column index within the layout)
    pub fn attribute(&self, attribute_index: usize) -> f64 {
        self.cloud.attributes[attribute_index][self.index]
    }

    /// Copies this point into an owned [Point]
    pub fn to_point(&self) -> Point {
        Point {
            position: *self.position(),
            diff: self.diff(),
            attributes: self
                .cloud
                .attributes
                .iter()
                .map(|column| column[self.index])
                .collect(),
        }
    }
}

/// Ordered collection of points that share a common [PointLayout]. Data is stored per attribute, which keeps the
/// position column contiguous for building spatial indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    layout: PointLayout,
    positions: Vec<Vector3<f64>>,
    diffs: Vec<f64>,
    attributes: Vec<Vec<f64>>,
}

impl PointCloud {
    /// Creates an empty point cloud with the given layout
    pub fn new(layout: PointLayout) -> Self {
        Self::with_capacity(0, layout)
    }

    /// Creates an empty point cloud with the given layout that can hold `capacity` points without reallocating
    pub fn with_capacity(capacity: usize, layout: PointLayout) -> Self {
        let attributes = (0..layout.len())
            .map(|_| Vec::with_capacity(capacity))
            .collect();
        Self {
            layout,
            positions: Vec::with_capacity(capacity),
            diffs: Vec::with_capacity(capacity),
            attributes,
        }
    }

    /// Creates a point cloud from the given points
    ///
    /// # Panics
    ///
    /// If any of the points has a different number of attributes than `layout`
    ///
    /// ```
    /// # use rockdiff_core::containers::*;
    /// # use rockdiff_core::layout::PointLayout;
    /// # use rockdiff_core::nalgebra::Vector3;
    /// let cloud = PointCloud::from_points(
    ///     PointLayout::new(),
    ///     vec![
    ///         Point::new(Vector3::new(0.0, 0.0, 0.0), 0.3),
    ///         Point::new(Vector3::new(1.0, 0.0, 0.0), -0.1),
    ///     ],
    /// );
    /// assert_eq!(cloud.len(), 2);
    /// assert_eq!(cloud.diffs(), &[0.3, -0.1]);
    /// ```
    pub fn from_points<I: IntoIterator<Item = Point>>(layout: PointLayout, points: I) -> Self {
        let points = points.into_iter();
        let mut cloud = Self::with_capacity(points.size_hint().0, layout);
        for point in points {
            cloud.push(point);
        }
        cloud
    }

    /// Appends the given point
    ///
    /// # Panics
    ///
    /// If the point has a different number of attributes than the layout of this cloud
    pub fn push(&mut self, point: Point) {
        self.push_parts(point.position, point.diff, &point.attributes);
    }

    /// Appends a point given as its individual parts
    ///
    /// # Panics
    ///
    /// If `attributes` has a different length than the layout of this cloud
    pub fn push_parts(&mut self, position: Vector3<f64>, diff: f64, attributes: &[f64]) {
        assert_eq!(
            attributes.len(),
            self.layout.len(),
            "Point has {} attributes but the layout '{}' expects {}",
            attributes.len(),
            self.layout,
            self.layout.len()
        );
        self.positions.push(position);
        self.diffs.push(diff);
        for (column, value) in self.attributes.iter_mut().zip(attributes) {
            column.push(*value);
        }
    }

    pub fn layout(&self) -> &PointLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn diffs(&self) -> &[f64] {
        &self.diffs
    }

    /// Returns the column of the extra attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&[f64]> {
        self.layout
            .index_of(name)
            .map(|index| self.attributes[index].as_slice())
    }

    /// Returns the column of the extra attribute at `attribute_index`
    ///
    /// # Panics
    ///
    /// If `attribute_index` is out of bounds for the layout of this cloud
    pub fn attribute_column(&self, attribute_index: usize) -> &[f64] {
        &self.attributes[attribute_index]
    }

    /// Returns a view onto the point at `index`
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds
    pub fn point(&self, index: usize) -> PointView<'_> {
        assert!(index < self.len(), "Point index {} out of bounds", index);
        PointView { cloud: self, index }
    }

    /// Iterates over views onto all points in order
    pub fn iter(&self) -> impl Iterator<Item = PointView<'_>> + '_ {
        (0..self.len()).map(move |index| PointView { cloud: self, index })
    }

    /// Creates a new cloud with the same layout containing the points at the given indices, in the order of
    /// `indices`
    ///
    /// # Panics
    ///
    /// If any index is out of bounds
    pub fn select(&self, indices: &[usize]) -> PointCloud {
        PointCloud {
            layout: self.layout.clone(),
            positions: indices.iter().map(|&idx| self.positions[idx]).collect(),
            diffs: indices.iter().map(|&idx| self.diffs[idx]).collect(),
            attributes: self
                .attributes
                .iter()
                .map(|column| indices.iter().map(|&idx| column[idx]).collect())
                .collect(),
        }
    }

    /// Calculates the bounding box of all positions. Returns `None` if the cloud is empty
    pub fn bounds(&self) -> Option<AABB<f64>> {
        let first = self.positions.first()?;
        let initial = AABB::from_min_max_unchecked(Point3::from(*first), Point3::from(*first));
        Some(self.positions.iter().fold(initial, |bounds, position| {
            AABB::extend_with_point(&bounds, &Point3::from(*position))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::attributes::UNCERTAINTY;

    fn test_cloud() -> PointCloud {
        PointCloud::from_points(
            PointLayout::from_attributes(&[UNCERTAINTY]),
            vec![
                Point::with_attributes(Vector3::new(0.0, 1.0, 2.0), 0.5, vec![0.01]),
                Point::with_attributes(Vector3::new(-1.0, 4.0, 0.0), -0.2, vec![0.02]),
                Point::with_attributes(Vector3::new(3.0, 2.0, 1.0), 0.1, vec![0.03]),
            ],
        )
    }

    #[test]
    fn test_select_keeps_order_and_attributes() {
        let cloud = test_cloud();
        let subset = cloud.select(&[2, 0]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.diffs(), &[0.1, 0.5]);
        assert_eq!(subset.attribute(UNCERTAINTY).unwrap(), &[0.03, 0.01]);
        assert_eq!(subset.point(1).to_point(), cloud.point(0).to_point());
    }

    #[test]
    fn test_bounds() {
        let cloud = test_cloud();
        let bounds = cloud.bounds().unwrap();
        assert_eq!(*bounds.min(), Point3::new(-1.0, 1.0, 0.0));
        assert_eq!(*bounds.max(), Point3::new(3.0, 4.0, 2.0));
        assert!(PointCloud::new(PointLayout::new()).bounds().is_none());
    }

    #[test]
    #[should_panic(expected = "attributes but the layout")]
    fn test_push_with_wrong_attribute_count() {
        let mut cloud = PointCloud::new(PointLayout::from_attributes(&[UNCERTAINTY]));
        cloud.push(Point::new(Vector3::new(0.0, 0.0, 0.0), 1.0));
    }
}
