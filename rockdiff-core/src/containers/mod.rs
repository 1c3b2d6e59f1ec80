//! Containers for point cloud data and cluster labels.
//!
//! A [PointCloud] stores its data per attribute (one column for positions, one for displacements and one for each
//! extra attribute of its [PointLayout](crate::layout::PointLayout)). Clouds are produced by the readers in
//! `rockdiff-io`, consumed read-only by the threshold filter and sliced into per-cluster subsets with
//! [PointCloud::select].

mod point_cloud;
pub use self::point_cloud::*;

mod labels;
pub use self::labels::*;
