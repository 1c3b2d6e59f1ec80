use nalgebra::{Point3, Scalar, Vector3};

/// Component-wise minimum and maximum. Used to grow bounding boxes and to find the value range of point attributes
pub trait MinMax {
    /// Computes the infimum of this value and `other`. For scalars this is the minimum, for vectors and points it
    /// is the component-wise minimum
    ///
    /// # Example
    /// ```
    /// use rockdiff_core::math::MinMax;
    /// # use rockdiff_core::nalgebra::Vector3;
    ///
    /// assert_eq!(5.0f64.infimum(&3.0), 3.0);
    /// assert_eq!(Vector3::new(1.0, 2.0, 3.0).infimum(&Vector3::new(2.0, 1.0, 0.0)), Vector3::new(1.0, 1.0, 0.0));
    /// ```
    fn infimum(&self, other: &Self) -> Self;
    /// Computes the supremum of this value and `other`. For scalars this is the maximum, for vectors and points it
    /// is the component-wise maximum
    fn supremum(&self, other: &Self) -> Self;
}

// NaN never wins a comparison, so a NaN on either side leaves the other value in place
macro_rules! impl_minmax_for_float {
    ($type:ty) => {
        impl MinMax for $type {
            fn infimum(&self, other: &Self) -> Self {
                if other < self || self.is_nan() {
                    *other
                } else {
                    *self
                }
            }

            fn supremum(&self, other: &Self) -> Self {
                if other > self || self.is_nan() {
                    *other
                } else {
                    *self
                }
            }
        }
    };
}

impl_minmax_for_float! {f32}
impl_minmax_for_float! {f64}

impl<T: MinMax + Scalar> MinMax for Vector3<T> {
    fn infimum(&self, other: &Self) -> Self {
        Vector3::new(
            self.x.infimum(&other.x),
            self.y.infimum(&other.y),
            self.z.infimum(&other.z),
        )
    }

    fn supremum(&self, other: &Self) -> Self {
        Vector3::new(
            self.x.supremum(&other.x),
            self.y.supremum(&other.y),
            self.z.supremum(&other.z),
        )
    }
}

impl<T: MinMax + Scalar> MinMax for Point3<T> {
    fn infimum(&self, other: &Self) -> Self {
        Point3::from(self.coords.infimum(&other.coords))
    }

    fn supremum(&self, other: &Self) -> Self {
        Point3::from(self.coords.supremum(&other.coords))
    }
}

/// Returns the minimum and maximum of the given values, or `None` if the iterator is empty
/// ```
/// # use rockdiff_core::math::minmax;
/// assert_eq!(minmax(vec![0.2, -0.4, 0.1]), Some((-0.4, 0.2)));
/// ```
pub fn minmax<T: MinMax + Copy, I: IntoIterator<Item = T>>(values: I) -> Option<(T, T)> {
    values.into_iter().fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((min.infimum(&value), max.supremum(&value))),
    })
}
