use std::fmt::Display;

/// Cluster membership of a single point. Noise is its own variant instead of a sentinel label, so it can never take
/// part in arithmetic on cluster numbers
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterId {
    Cluster(u32),
    Noise,
}

impl ClusterId {
    /// Returns the cluster number, or `None` for noise
    pub fn cluster(&self) -> Option<u32> {
        match self {
            ClusterId::Cluster(id) => Some(*id),
            ClusterId::Noise => None,
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterId::Noise)
    }

    /// Integer representation used in delimited text output: the cluster number, or `-1` for noise
    pub fn as_i64(&self) -> i64 {
        match self {
            ClusterId::Cluster(id) => *id as i64,
            ClusterId::Noise => -1,
        }
    }
}

impl Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// One [ClusterId] per point of a clustered point cloud. Cluster numbers are contiguous, starting at 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabels {
    labels: Vec<ClusterId>,
    cluster_count: u32,
}

impl ClusterLabels {
    /// Creates labels from per-point ids.
    ///
    /// # Panics
    ///
    /// If the cluster numbers in `labels` are not contiguous starting at 0
    pub fn new(labels: Vec<ClusterId>) -> Self {
        let cluster_count = labels
            .iter()
            .filter_map(|label| label.cluster())
            .max()
            .map(|max| max + 1)
            .unwrap_or(0);
        let mut seen = vec![false; cluster_count as usize];
        for id in labels.iter().filter_map(|label| label.cluster()) {
            seen[id as usize] = true;
        }
        assert!(
            seen.iter().all(|s| *s),
            "Cluster numbers must be contiguous starting at 0"
        );
        Self {
            labels,
            cluster_count,
        }
    }

    /// Number of distinct clusters, noise excluded
    pub fn cluster_count(&self) -> u32 {
        self.cluster_count
    }

    /// Number of points labeled as noise
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|label| label.is_noise()).count()
    }

    pub fn labels(&self) -> &[ClusterId] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Indices of all points that belong to the given cluster, in ascending order
    pub fn members(&self, cluster: u32) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == ClusterId::Cluster(cluster))
            .map(|(index, _)| index)
            .collect()
    }

    /// Point indices of all clusters, indexed by cluster number. Each inner vector is sorted in ascending order
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.cluster_count as usize];
        for (index, label) in self.labels.iter().enumerate() {
            if let ClusterId::Cluster(id) = label {
                clusters[*id as usize].push(index);
            }
        }
        clusters
    }

    /// Number of points per cluster, indexed by cluster number
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.cluster_count as usize];
        for id in self.labels.iter().filter_map(|label| label.cluster()) {
            sizes[id as usize] += 1;
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_minus_one() {
        assert_eq!(ClusterId::Noise.to_string(), "-1");
        assert_eq!(ClusterId::Cluster(7).to_string(), "7");
        assert_eq!(ClusterId::Noise.cluster(), None);
    }

    #[test]
    fn test_groups() {
        let labels = ClusterLabels::new(vec![
            ClusterId::Cluster(1),
            ClusterId::Noise,
            ClusterId::Cluster(0),
            ClusterId::Cluster(1),
        ]);
        assert_eq!(labels.cluster_count(), 2);
        assert_eq!(labels.noise_count(), 1);
        assert_eq!(labels.clusters(), vec![vec![2], vec![0, 3]]);
        assert_eq!(labels.members(1), vec![0, 3]);
        assert_eq!(labels.sizes(), vec![1, 2]);
    }

    #[test]
    fn test_only_noise() {
        let labels = ClusterLabels::new(vec![ClusterId::Noise; 3]);
        assert_eq!(labels.cluster_count(), 0);
        assert!(labels.clusters().is_empty());
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn test_non_contiguous_labels() {
        ClusterLabels::new(vec![ClusterId::Cluster(0), ClusterId::Cluster(2)]);
    }
}
