use nalgebra::{ClosedSub, Point3, Scalar, Vector3};

use super::MinMax;

/// 3D axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB<T: Scalar + PartialOrd> {
    min: Point3<T>,
    max: Point3<T>,
}

impl<T: Scalar + ClosedSub + PartialOrd + MinMax + Copy> AABB<T> {
    /// Creates a new AABB from the given minimum and maximum coordinates. Returns `None` if the minimum position
    /// is not less than or equal to the maximum position in all components
    /// ```
    /// # use rockdiff_core::math::AABB;
    /// # use rockdiff_core::nalgebra::Point3;
    /// assert!(AABB::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).is_some());
    /// assert!(AABB::from_min_max(Point3::new(2.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).is_none());
    /// ```
    pub fn from_min_max(min: Point3<T>, max: Point3<T>) -> Option<Self> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return None;
        }
        Some(Self { min, max })
    }

    /// Creates a new AABB from the given minimum and maximum coordinates without checking that min <= max
    pub fn from_min_max_unchecked(min: Point3<T>, max: Point3<T>) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> &Point3<T> {
        &self.min
    }

    pub fn max(&self) -> &Point3<T> {
        &self.max
    }

    /// Size of the box along each axis
    pub fn extent(&self) -> Vector3<T> {
        self.max - self.min
    }

    /// Returns true if the given point is inside this box. Points on the boundary count as inside
    pub fn contains(&self, point: &Point3<T>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Returns the smallest box that contains `bounds` and `point`
    pub fn extend_with_point(bounds: &AABB<T>, point: &Point3<T>) -> AABB<T> {
        Self {
            min: bounds.min.infimum(point),
            max: bounds.max.supremum(point),
        }
    }

    /// Index (0 = x, 1 = y, 2 = z) of the axis along which this box is thinnest
    /// ```
    /// # use rockdiff_core::math::AABB;
    /// # use rockdiff_core::nalgebra::Point3;
    /// let bounds = AABB::from_min_max_unchecked(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.5, 3.0));
    /// assert_eq!(bounds.thinnest_axis(), 1);
    /// ```
    pub fn thinnest_axis(&self) -> usize {
        let extent = self.extent();
        let mut axis = 0;
        for candidate in 1..3 {
            if extent[candidate] < extent[axis] {
                axis = candidate;
            }
        }
        axis
    }
}
