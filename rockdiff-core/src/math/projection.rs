use std::fmt::Display;
use std::str::FromStr;

use nalgebra::{Point2, Vector3};

use crate::containers::PointCloud;

/// The plane onto which cluster footprints are projected for boundary reconstruction and area integration. The
/// plane is named by the two coordinates it keeps; the third coordinate is dropped
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProjectionPlane {
    XY,
    XZ,
    YZ,
    /// Drop the axis along which the projected points have the smallest extent
    Auto,
}

impl Default for ProjectionPlane {
    /// Rock faces are usually surveyed as near-vertical walls facing the y axis, so the default drops y
    fn default() -> Self {
        ProjectionPlane::XZ
    }
}

impl ProjectionPlane {
    /// Resolves `Auto` against the bounds of the given cloud. Concrete planes are returned unchanged, as is `Auto`
    /// for an empty cloud
    pub fn resolve(&self, cloud: &PointCloud) -> ProjectionPlane {
        match self {
            ProjectionPlane::Auto => match cloud.bounds().map(|bounds| bounds.thinnest_axis()) {
                Some(0) => ProjectionPlane::YZ,
                Some(1) => ProjectionPlane::XZ,
                Some(_) => ProjectionPlane::XY,
                None => ProjectionPlane::Auto,
            },
            other => *other,
        }
    }

    /// Indices of the two kept coordinates
    pub fn kept_axes(&self) -> [usize; 2] {
        match self {
            ProjectionPlane::XY => [0, 1],
            ProjectionPlane::XZ | ProjectionPlane::Auto => [0, 2],
            ProjectionPlane::YZ => [1, 2],
        }
    }

    /// Projects a single position onto this plane. An unresolved `Auto` plane projects like `XZ`, call
    /// [resolve](ProjectionPlane::resolve) first to pick the plane from the data
    /// ```
    /// # use rockdiff_core::math::ProjectionPlane;
    /// # use rockdiff_core::nalgebra::{Point2, Vector3};
    /// let position = Vector3::new(1.0, 2.0, 3.0);
    /// assert_eq!(ProjectionPlane::XZ.project(&position), Point2::new(1.0, 3.0));
    /// assert_eq!(ProjectionPlane::YZ.project(&position), Point2::new(2.0, 3.0));
    /// ```
    pub fn project(&self, position: &Vector3<f64>) -> Point2<f64> {
        let [u, v] = self.kept_axes();
        Point2::new(position[u], position[v])
    }

    /// Projects all positions of the given cloud
    pub fn project_cloud(&self, cloud: &PointCloud) -> Vec<Point2<f64>> {
        cloud
            .positions()
            .iter()
            .map(|position| self.project(position))
            .collect()
    }
}

impl Display for ProjectionPlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProjectionPlane::XY => "xy",
            ProjectionPlane::XZ => "xz",
            ProjectionPlane::YZ => "yz",
            ProjectionPlane::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for ProjectionPlane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xy" => Ok(ProjectionPlane::XY),
            "xz" => Ok(ProjectionPlane::XZ),
            "yz" => Ok(ProjectionPlane::YZ),
            "auto" => Ok(ProjectionPlane::Auto),
            _ => Err(format!(
                "unknown projection plane '{}', expected one of xy, xz, yz, auto",
                s
            )),
        }
    }
}
