#![warn(clippy::all)]

//! Core data structures for point cloud change detection
//!
//! rockdiff works on a single point cloud in which every point carries a signed displacement value (`diff`)
//! between two surveys of the same surface. This crate contains the in-memory representation of such clouds
//! ([PointCloud](crate::containers::PointCloud)), the cluster labels produced by the clustering stage, the
//! 2D footprint geometry used for boundary reconstruction and the error taxonomy shared by all stages.

pub extern crate nalgebra;
extern crate self as rockdiff_core;

/// Point cloud containers and cluster labels
pub mod containers;
/// Error taxonomy shared by all pipeline stages
pub mod error;
/// 2D footprint geometry: polygons and cluster boundaries
pub mod geometry;
/// Defines the attribute schema of point cloud data
pub mod layout;
/// Useful mathematical tools when working with point cloud data
pub mod math;

pub use self::error::{ChangeError, Result, Stage};
