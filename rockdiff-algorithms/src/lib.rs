#![warn(clippy::all)]
//! Algorithms of the rockdiff change detection pipeline.
//!
//! The stages run in this order: [threshold] isolates significant displacements, [dbscan] groups them into
//! spatially coherent clusters and, per cluster, [alpha_shape] reconstructs the footprint boundary on which
//! [volume] integrates the displacement. [summary] builds the per-cluster report and [pipeline] chains all of it.
//! [density] derives the DBSCAN `min_points` parameter from the local point density when it is not configured.

// Alpha shape boundary reconstruction for cluster footprints, with automatic estimation of the alpha parameter.
pub mod alpha_shape;
// Monotone chain convex hull in two dimensions.
pub mod convex_hull;
// Density based clustering (DBSCAN) that is invariant to the order of the input points.
pub mod dbscan;
// Bowyer-Watson Delaunay triangulation of 2D point sets.
pub mod delaunay;
// Local point density estimation and the derived DBSCAN parameters.
pub mod density;
// The complete change detection pipeline and its configuration.
pub mod pipeline;
// Spatial indices for radius and nearest neighbour queries.
pub mod spatial_index;
// Per-cluster statistics.
pub mod summary;
// One-sided displacement threshold filter.
pub mod threshold;
// Boundary restricted triangulation and volume integration.
pub mod volume;

#[cfg(test)]
pub(crate) mod test_utils;
