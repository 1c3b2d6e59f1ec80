use std::fmt::Display;

use rockdiff_core::containers::PointCloud;
use rockdiff_core::{ChangeError, Result, Stage};

/// Direction of surface change that a threshold pass detects
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChangeKind {
    /// Material loss, detected with a negative threshold
    Loss,
    /// Material gain, detected with a positive threshold
    Gain,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Loss => f.write_str("loss"),
            ChangeKind::Gain => f.write_str("gain"),
        }
    }
}

/// A signed, non-zero displacement threshold. The sign selects which side of the displacement distribution is
/// kept: negative thresholds keep `diff < t`, positive thresholds keep `diff > t`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    /// Creates a new threshold. Zero and non-finite values are rejected, since they would either keep everything
    /// or nothing
    /// ```
    /// # use rockdiff_algorithms::threshold::*;
    /// let threshold = Threshold::new(-0.2).unwrap();
    /// assert_eq!(threshold.kind(), ChangeKind::Loss);
    /// assert!(threshold.passes(-0.3));
    /// assert!(!threshold.passes(-0.1));
    /// assert!(Threshold::new(0.0).is_err());
    /// ```
    pub fn new(value: f64) -> Result<Self> {
        if value == 0.0 || !value.is_finite() {
            return Err(ChangeError::invalid_parameter(
                Stage::ThresholdFilter,
                "threshold",
                format!("must be a finite non-zero number, got {}", value),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn kind(&self) -> ChangeKind {
        if self.0 < 0.0 {
            ChangeKind::Loss
        } else {
            ChangeKind::Gain
        }
    }

    /// Returns true if `diff` lies strictly beyond this threshold. NaN never passes
    pub fn passes(&self, diff: f64) -> bool {
        if self.0 < 0.0 {
            diff < self.0
        } else {
            diff > self.0
        }
    }

    /// Displacement magnitude of `diff` in the direction of this threshold, `sign(t) * diff`. Strictly positive
    /// for every displacement that passes the threshold
    pub fn magnitude(&self, diff: f64) -> f64 {
        self.0.signum() * diff
    }
}

impl Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The points of a [PointCloud] that passed a [Threshold]
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredCloud {
    pub cloud: PointCloud,
    /// For every point in `cloud`, its row index within the unfiltered input cloud
    pub source_indices: Vec<usize>,
    pub kind: ChangeKind,
    pub threshold: Threshold,
}

impl FilteredCloud {
    pub fn len(&self) -> usize {
        self.cloud.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cloud.is_empty()
    }
}

/// Keeps all points of `cloud` whose displacement passes `threshold`, in input order
pub fn filter_by_threshold(cloud: &PointCloud, threshold: Threshold) -> FilteredCloud {
    let source_indices = cloud
        .diffs()
        .iter()
        .enumerate()
        .filter(|(_, diff)| threshold.passes(**diff))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    FilteredCloud {
        cloud: cloud.select(&source_indices),
        source_indices,
        kind: threshold.kind(),
        threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rockdiff_core::containers::Point;
    use rockdiff_core::layout::PointLayout;
    use rockdiff_core::nalgebra::Vector3;

    fn cloud_with_diffs(diffs: &[f64]) -> PointCloud {
        PointCloud::from_points(
            PointLayout::new(),
            diffs
                .iter()
                .enumerate()
                .map(|(index, diff)| Point::new(Vector3::new(index as f64, 0.0, 0.0), *diff)),
        )
    }

    #[test]
    fn test_positive_threshold_keeps_gain() {
        let cloud = cloud_with_diffs(&[0.1, 0.25, 0.3, -0.5]);
        let filtered = filter_by_threshold(&cloud, Threshold::new(0.20).unwrap());
        assert_eq!(filtered.cloud.diffs(), &[0.25, 0.3]);
        assert_eq!(filtered.source_indices, vec![1, 2]);
        assert_eq!(filtered.kind, ChangeKind::Gain);
    }

    #[test]
    fn test_negative_threshold_keeps_loss() {
        let cloud = cloud_with_diffs(&[0.1, 0.25, -0.3, -0.5, -0.2, f64::NAN]);
        let filtered = filter_by_threshold(&cloud, Threshold::new(-0.2).unwrap());
        assert_eq!(filtered.cloud.diffs(), &[-0.3, -0.5]);
        assert_eq!(filtered.source_indices, vec![2, 3]);
        assert_eq!(filtered.kind, ChangeKind::Loss);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let cloud = cloud_with_diffs(&[0.5, -0.7, 0.05, -0.1, 0.9, -0.25]);
        for t in [-0.2, 0.2, 0.6].iter() {
            let threshold = Threshold::new(*t).unwrap();
            let once = filter_by_threshold(&cloud, threshold);
            let twice = filter_by_threshold(&once.cloud, threshold);
            assert_eq!(once.cloud, twice.cloud);
        }
    }

    #[test]
    fn test_magnitude_is_positive_for_passing_points() {
        let loss = Threshold::new(-0.2).unwrap();
        assert_eq!(loss.magnitude(-0.5), 0.5);
        let gain = Threshold::new(0.2).unwrap();
        assert_eq!(gain.magnitude(0.5), 0.5);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(matches!(
            Threshold::new(0.0),
            Err(ChangeError::InvalidParameter { stage: Stage::ThresholdFilter, .. })
        ));
        assert!(Threshold::new(f64::NAN).is_err());
        assert!(Threshold::new(f64::INFINITY).is_err());
    }
}
