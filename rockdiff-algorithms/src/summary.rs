use std::fmt::Display;

use rockdiff_core::containers::PointCloud;
use rockdiff_core::math::{mean, median, round_to, std_dev};
use rockdiff_core::nalgebra::Vector3;
use rockdiff_core::{ChangeError, Result, Stage};

/// Outcome of the boundary reconstruction and volume integration of one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterStatus {
    Ok,
    /// The footprint geometry was degenerate, area and volume are reported as zero
    Degenerate(String),
    /// The cluster had too few points, area and volume are reported as zero
    Insufficient(String),
}

impl ClusterStatus {
    /// Status for a cluster whose footprint failed with `error`. Returns `None` for errors that are not
    /// recoverable on the cluster level
    pub fn from_error(error: &ChangeError) -> Option<Self> {
        match error {
            ChangeError::GeometryDegenerate { .. } => {
                Some(ClusterStatus::Degenerate(error.to_string()))
            }
            ChangeError::DataInsufficient { .. } => {
                Some(ClusterStatus::Insufficient(error.to_string()))
            }
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ClusterStatus::Ok)
    }

    /// Short name of the status, as used in the summary table
    pub fn name(&self) -> &'static str {
        match self {
            ClusterStatus::Ok => "ok",
            ClusterStatus::Degenerate(_) => "degenerate",
            ClusterStatus::Insufficient(_) => "insufficient",
        }
    }
}

impl Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterStatus::Ok => f.write_str("ok"),
            ClusterStatus::Degenerate(reason) | ClusterStatus::Insufficient(reason) => {
                write!(f, "{}: {}", self.name(), reason)
            }
        }
    }
}

/// Area, volume and reconstruction details of a cluster footprint
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub area: f64,
    pub volume: f64,
    /// The alpha of the boundary, if one could be reconstructed
    pub alpha: Option<f64>,
    pub polygon_count: usize,
    pub status: ClusterStatus,
}

impl Footprint {
    /// A zero-valued footprint for a cluster whose reconstruction failed
    pub fn failed(status: ClusterStatus) -> Self {
        Self {
            area: 0.0,
            volume: 0.0,
            alpha: None,
            polygon_count: 0,
            status,
        }
    }
}

/// One row of the cluster report
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub label: u32,
    pub point_count: usize,
    /// Mean position of the cluster points
    pub centroid: Vector3<f64>,
    /// Per-coordinate median position
    pub median_position: Vector3<f64>,
    /// Median of every extra attribute, in layout order
    pub median_attributes: Vec<(String, f64)>,
    pub median_diff: f64,
    pub std_diff: f64,
    pub area: f64,
    pub volume: f64,
    pub alpha: Option<f64>,
    pub polygon_count: usize,
    pub status: ClusterStatus,
}

/// Builds the summary row of a single cluster from its points and footprint. All values are rounded to
/// `precision` decimals. Fails with [DataInsufficient](ChangeError::DataInsufficient) for an empty cluster
pub fn summarize_cluster(
    label: u32,
    points: &PointCloud,
    footprint: &Footprint,
    precision: u32,
) -> Result<ClusterSummary> {
    if points.is_empty() {
        return Err(ChangeError::data_insufficient(
            Stage::Summary,
            format!("cluster {} has no points", label),
        ));
    }
    let round = |value: f64| round_to(value, precision);
    let column = |axis: usize| {
        points
            .positions()
            .iter()
            .map(|position| position[axis])
            .collect::<Vec<_>>()
    };
    let columns = [column(0), column(1), column(2)];
    // Both statistics exist since the cluster is not empty
    let stat = |values: &[f64], statistic: fn(&[f64]) -> Option<f64>| {
        round(statistic(values).unwrap_or(f64::NAN))
    };

    let median_attributes = points
        .layout()
        .attributes()
        .enumerate()
        .map(|(index, name)| {
            (
                name.to_owned(),
                stat(points.attribute_column(index), median),
            )
        })
        .collect();

    Ok(ClusterSummary {
        label,
        point_count: points.len(),
        centroid: Vector3::new(
            stat(&columns[0], mean),
            stat(&columns[1], mean),
            stat(&columns[2], mean),
        ),
        median_position: Vector3::new(
            stat(&columns[0], median),
            stat(&columns[1], median),
            stat(&columns[2], median),
        ),
        median_attributes,
        median_diff: stat(points.diffs(), median),
        std_diff: stat(points.diffs(), std_dev),
        area: round(footprint.area),
        volume: round(footprint.volume),
        alpha: footprint.alpha.map(round),
        polygon_count: footprint.polygon_count,
        status: footprint.status.clone(),
    })
}

/// Joins the footprints of all clusters with the statistics of their points. `clusters[label]` holds the indices
/// of the points of cluster `label` within `cloud`, and `footprints[label]` its footprint
pub fn summarize(
    cloud: &PointCloud,
    clusters: &[Vec<usize>],
    footprints: &[Footprint],
    precision: u32,
) -> Result<Vec<ClusterSummary>> {
    if clusters.len() != footprints.len() {
        return Err(ChangeError::invalid_parameter(
            Stage::Summary,
            "footprints",
            format!(
                "expected one footprint per cluster ({}), got {}",
                clusters.len(),
                footprints.len()
            ),
        ));
    }
    clusters
        .iter()
        .zip(footprints)
        .enumerate()
        .map(|(label, (indices, footprint))| {
            summarize_cluster(label as u32, &cloud.select(indices), footprint, precision)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockdiff_core::containers::Point;
    use rockdiff_core::layout::{attributes::UNCERTAINTY, PointLayout};

    fn cluster() -> PointCloud {
        PointCloud::from_points(
            PointLayout::from_attributes(&[UNCERTAINTY]),
            vec![
                Point::with_attributes(Vector3::new(0.0, 0.0, 0.0), 0.3, vec![0.01]),
                Point::with_attributes(Vector3::new(1.0, 0.5, 2.0), 0.5, vec![0.03]),
                Point::with_attributes(Vector3::new(2.0, 0.1, 1.0), 0.4, vec![0.02]),
                Point::with_attributes(Vector3::new(5.0, 0.2, 3.0), 0.6, vec![0.05]),
            ],
        )
    }

    fn footprint() -> Footprint {
        Footprint {
            area: 1.23456,
            volume: 0.654321,
            alpha: Some(2.0),
            polygon_count: 1,
            status: ClusterStatus::Ok,
        }
    }

    #[test]
    fn test_statistics_are_rounded() {
        let summary = summarize_cluster(3, &cluster(), &footprint(), 3).unwrap();
        assert_eq!(summary.label, 3);
        assert_eq!(summary.point_count, 4);
        assert_eq!(summary.centroid, Vector3::new(2.0, 0.2, 1.5));
        assert_eq!(summary.median_position, Vector3::new(1.5, 0.15, 1.5));
        assert_eq!(summary.median_diff, 0.45);
        assert_eq!(summary.std_diff, 0.112);
        assert_eq!(
            summary.median_attributes,
            vec![(UNCERTAINTY.to_owned(), 0.025)]
        );
        assert_eq!(summary.area, 1.235);
        assert_eq!(summary.volume, 0.654);
    }

    #[test]
    fn test_degenerate_cluster_keeps_its_row() {
        let status = ClusterStatus::from_error(&ChangeError::geometry_degenerate(
            Stage::BoundaryReconstruction,
            "2 points",
        ))
        .unwrap();
        let cloud = cluster();
        let summaries = summarize(
            &cloud,
            &[vec![0, 1], vec![2, 3]],
            &[Footprint::failed(status), footprint()],
            3,
        )
        .unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].area, 0.0);
        assert_eq!(summaries[0].volume, 0.0);
        assert_eq!(summaries[0].status.name(), "degenerate");
        assert!(summaries[1].status.is_ok());
        assert_eq!(summaries[1].label, 1);
    }

    #[test]
    fn test_mismatched_footprints() {
        assert!(summarize(&cluster(), &[vec![0]], &[], 3).is_err());
        assert!(ClusterStatus::from_error(&ChangeError::invalid_parameter(
            Stage::Configuration,
            "eps",
            "negative"
        ))
        .is_none());
    }

    #[test]
    fn test_empty_cluster() {
        let empty = PointCloud::new(PointLayout::new());
        assert!(matches!(
            summarize_cluster(0, &empty, &footprint(), 3),
            Err(ChangeError::DataInsufficient { .. })
        ));
    }
}
