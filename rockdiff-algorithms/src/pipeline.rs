use log::{info, warn};
use rayon::prelude::*;
use rockdiff_core::containers::{ClusterLabels, PointCloud};
use rockdiff_core::geometry::Boundary;
use rockdiff_core::math::ProjectionPlane;
use rockdiff_core::nalgebra::{Point2, Vector2};
use rockdiff_core::{ChangeError, Result, Stage};

use crate::alpha_shape::{
    alpha_shape_from_triangulation, triangulate_footprint, AlphaMode, AlphaShape,
};
use crate::dbscan::{dbscan, DbscanParams};
use crate::density::{estimate_density, min_points_for_cluster};
use crate::summary::{summarize_cluster, ClusterStatus, ClusterSummary, Footprint};
use crate::threshold::{filter_by_threshold, ChangeKind, FilteredCloud, Threshold};
use crate::volume::{integrate_volume_with, TriangleMesh, VolumeEstimate};

/// How the DBSCAN `min_points` parameter is obtained
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MinPoints {
    Fixed(usize),
    /// Derived from the point density of the input cloud, see
    /// [min_points_for_cluster](crate::density::min_points_for_cluster)
    Auto {
        density_radius: f64,
        safety_factor: f64,
    },
}

impl MinPoints {
    /// Density based `min_points` with a density radius of 0.5 and a safety factor of 0.5
    pub fn auto() -> Self {
        MinPoints::Auto {
            density_radius: 0.5,
            safety_factor: 0.5,
        }
    }
}

impl Default for MinPoints {
    fn default() -> Self {
        MinPoints::Fixed(15)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClusteringParams {
    pub eps: f64,
    pub min_points: MinPoints,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            eps: 1.0,
            min_points: MinPoints::default(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoundaryParams {
    pub alpha: AlphaMode,
    pub plane: ProjectionPlane,
}

/// Complete configuration of a change detection run. A single immutable value that is passed to every stage
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChangeDetectionParams {
    /// Signed displacement threshold. Negative values detect loss, positive values gain
    pub threshold: f64,
    pub clustering: ClusteringParams,
    pub boundary: BoundaryParams,
    /// Number of decimals of the values in the cluster summaries
    pub precision: u32,
}

impl Default for ChangeDetectionParams {
    fn default() -> Self {
        Self {
            threshold: 0.20,
            clustering: ClusteringParams::default(),
            boundary: BoundaryParams::default(),
            precision: 3,
        }
    }
}

impl ChangeDetectionParams {
    /// Checks all parameters. Every violation is reported as an
    /// [InvalidParameter](ChangeError::InvalidParameter) error of the configuration stage
    pub fn validate(&self) -> Result<()> {
        let checks = [
            Threshold::new(self.threshold).map(|_| ()),
            DbscanParams {
                eps: self.clustering.eps,
                min_points: match self.clustering.min_points {
                    MinPoints::Fixed(min_points) => min_points,
                    MinPoints::Auto { .. } => 1,
                },
            }
            .validate(),
            self.validate_auto_min_points(),
            self.boundary.alpha.validate(),
        ];
        for check in checks.iter() {
            if let Err(ChangeError::InvalidParameter {
                parameter, reason, ..
            }) = check
            {
                return Err(ChangeError::invalid_parameter(
                    Stage::Configuration,
                    *parameter,
                    reason.clone(),
                ));
            }
        }
        Ok(())
    }

    fn validate_auto_min_points(&self) -> Result<()> {
        if let MinPoints::Auto {
            density_radius,
            safety_factor,
        } = self.clustering.min_points
        {
            if !(density_radius.is_finite() && density_radius > 0.0) {
                return Err(ChangeError::invalid_parameter(
                    Stage::Configuration,
                    "density_radius",
                    format!("must be a positive number, got {}", density_radius),
                ));
            }
            if !(safety_factor > 0.0 && safety_factor <= 1.0) {
                return Err(ChangeError::invalid_parameter(
                    Stage::Configuration,
                    "safety_factor",
                    format!("must be in (0, 1], got {}", safety_factor),
                ));
            }
        }
        Ok(())
    }
}

/// Everything that is known about a single cluster after the run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAnalysis {
    pub summary: ClusterSummary,
    /// Indices of the cluster points within the filtered cloud
    pub indices: Vec<usize>,
    /// The plane the footprint was reconstructed in
    pub plane: ProjectionPlane,
    /// Projected cluster points, relative to `origin`
    pub footprint: Vec<Point2<f64>>,
    /// Centroid of the projected cluster points in plane coordinates
    pub origin: Vector2<f64>,
    /// Footprint boundary relative to `origin`, if it could be reconstructed
    pub boundary: Option<Boundary>,
    /// Triangles that were integrated, indexing into `footprint`
    pub mesh: TriangleMesh,
}

impl ClusterAnalysis {
    /// Footprint boundary in plane coordinates
    pub fn boundary_in_plane(&self) -> Option<Boundary> {
        self.boundary
            .as_ref()
            .map(|boundary| boundary.translated(&self.origin))
    }
}

/// Result of a change detection run
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeReport {
    pub kind: ChangeKind,
    pub filtered: FilteredCloud,
    /// One label per point of the filtered cloud
    pub labels: ClusterLabels,
    /// The `min_points` that was used for clustering
    pub min_points: usize,
    /// One analysis per cluster, ordered by label
    pub clusters: Vec<ClusterAnalysis>,
}

impl ChangeReport {
    pub fn summaries(&self) -> impl Iterator<Item = &ClusterSummary> + '_ {
        self.clusters.iter().map(|cluster| &cluster.summary)
    }

    pub fn total_area(&self) -> f64 {
        self.summaries().map(|summary| summary.area).sum()
    }

    pub fn total_volume(&self) -> f64 {
        self.summaries().map(|summary| summary.volume).sum()
    }

    /// Number of clusters whose footprint could not be reconstructed
    pub fn failed_cluster_count(&self) -> usize {
        self.summaries()
            .filter(|summary| !summary.status.is_ok())
            .count()
    }
}

/// Resolves the `min_points` parameter, estimating the density of `cloud` if required
pub fn resolve_min_points(cloud: &PointCloud, params: &ClusteringParams) -> Result<usize> {
    match params.min_points {
        MinPoints::Fixed(min_points) => Ok(min_points),
        MinPoints::Auto {
            density_radius,
            safety_factor,
        } => {
            let estimate = estimate_density(cloud, density_radius)?;
            let min_points = min_points_for_cluster(estimate.density, params.eps, safety_factor)?;
            info!(
                "Estimated density {:.1} points per square unit (spacing {:.3}), using min_points = {}",
                estimate.density, estimate.spacing, min_points
            );
            Ok(min_points)
        }
    }
}

/// Runs the full change detection on `cloud`: threshold filter, clustering and, for every cluster in parallel,
/// boundary reconstruction, volume integration and summary.
///
/// Invalid parameters, an empty filter result and clustering failures abort the run. Failures of a single cluster
/// footprint do not: the cluster is reported with zero area and volume and a [ClusterStatus] describing the failure
pub fn detect_changes(cloud: &PointCloud, params: &ChangeDetectionParams) -> Result<ChangeReport> {
    params.validate()?;
    let threshold = Threshold::new(params.threshold)?;
    let min_points = resolve_min_points(cloud, &params.clustering)?;

    let filtered = filter_by_threshold(cloud, threshold);
    info!(
        "{} of {} points pass the {} threshold {}",
        filtered.len(),
        cloud.len(),
        filtered.kind,
        threshold
    );
    if filtered.is_empty() {
        return Err(ChangeError::data_insufficient(
            Stage::ThresholdFilter,
            format!("no point passes the threshold {}", threshold),
        ));
    }

    let labels = dbscan(
        filtered.cloud.positions(),
        &DbscanParams {
            eps: params.clustering.eps,
            min_points,
        },
    )?;

    let clusters = labels
        .clusters()
        .into_par_iter()
        .enumerate()
        .map(|(label, indices)| {
            analyze_cluster(
                label as u32,
                &filtered.cloud,
                indices,
                threshold,
                &params.boundary,
                params.precision,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let report = ChangeReport {
        kind: filtered.kind,
        filtered,
        labels,
        min_points,
        clusters,
    };
    info!(
        "{} clusters with a total {} volume of {:.3} over an area of {:.3} ({} without footprint)",
        report.clusters.len(),
        report.kind,
        report.total_volume(),
        report.total_area(),
        report.failed_cluster_count()
    );
    Ok(report)
}

fn reconstruct_footprint(
    points: &[Point2<f64>],
    magnitudes: &[f64],
    alpha: &AlphaMode,
) -> Result<(AlphaShape, VolumeEstimate)> {
    let triangulation = triangulate_footprint(points)?;
    let shape = alpha_shape_from_triangulation(&triangulation, alpha)?;
    let estimate = integrate_volume_with(&triangulation, magnitudes, &shape.boundary)?;
    Ok((shape, estimate))
}

/// Reconstructs the footprint of one cluster and summarizes it. `indices` are the cluster points within
/// `cloud`. Recoverable footprint failures are recorded in the summary status
pub fn analyze_cluster(
    label: u32,
    cloud: &PointCloud,
    indices: Vec<usize>,
    threshold: Threshold,
    params: &BoundaryParams,
    precision: u32,
) -> Result<ClusterAnalysis> {
    let points = cloud.select(&indices);
    let plane = params.plane.resolve(&points);
    let projected = plane.project_cloud(&points);
    let origin = projected
        .iter()
        .fold(Vector2::zeros(), |sum, point| sum + point.coords)
        / projected.len().max(1) as f64;
    let footprint_points = projected
        .iter()
        .map(|point| Point2::from(point.coords - origin))
        .collect::<Vec<_>>();
    let magnitudes = points
        .diffs()
        .iter()
        .map(|diff| threshold.magnitude(*diff))
        .collect::<Vec<_>>();

    let (footprint, boundary, mesh) =
        match reconstruct_footprint(&footprint_points, &magnitudes, &params.alpha) {
            Ok((shape, estimate)) => (
                Footprint {
                    area: estimate.area,
                    volume: estimate.volume,
                    alpha: Some(shape.alpha),
                    polygon_count: shape.boundary.len(),
                    status: ClusterStatus::Ok,
                },
                Some(shape.boundary),
                estimate.mesh,
            ),
            Err(err) => match ClusterStatus::from_error(&err) {
                Some(status) => {
                    warn!("Cluster {} ({} points): {}", label, points.len(), err);
                    (Footprint::failed(status), None, TriangleMesh::default())
                }
                None => return Err(err),
            },
        };

    let summary = summarize_cluster(label, &points, &footprint, precision)?;
    Ok(ClusterAnalysis {
        summary,
        indices,
        plane,
        footprint: footprint_points,
        origin,
        boundary,
        mesh,
    })
}
