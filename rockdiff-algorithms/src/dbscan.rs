use std::collections::HashMap;

use float_ord::FloatOrd;
use log::info;
use rayon::prelude::*;
use rockdiff_core::containers::{ClusterId, ClusterLabels};
use rockdiff_core::nalgebra::Vector3;
use rockdiff_core::{ChangeError, Result, Stage};

use crate::spatial_index::PositionIndex;

/// Parameters of density based clustering
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DbscanParams {
    /// Neighbourhood radius
    pub eps: f64,
    /// Minimum size of the `eps` neighbourhood, including the point itself, for a point to be a core point
    pub min_points: usize,
}

impl DbscanParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(ChangeError::invalid_parameter(
                Stage::Clustering,
                "eps",
                format!("must be a positive number, got {}", self.eps),
            ));
        }
        if self.min_points == 0 {
            return Err(ChangeError::invalid_parameter(
                Stage::Clustering,
                "min_points",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

struct DisjointSets {
    parents: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parents: (0..len).collect(),
        }
    }

    fn find(&mut self, mut element: usize) -> usize {
        while self.parents[element] != element {
            self.parents[element] = self.parents[self.parents[element]];
            element = self.parents[element];
        }
        element
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        // The smaller root wins so that the representative does not depend on the order of the unions
        if root_a < root_b {
            self.parents[root_b] = root_a;
        } else if root_b < root_a {
            self.parents[root_a] = root_b;
        }
    }
}

fn lexicographic_key(position: &Vector3<f64>) -> (FloatOrd<f64>, FloatOrd<f64>, FloatOrd<f64>) {
    (
        FloatOrd(position.x),
        FloatOrd(position.y),
        FloatOrd(position.z),
    )
}

/// Density based spatial clustering (DBSCAN) of the given positions.
///
/// A point is a core point if at least `min_points` points (itself included) lie within a distance of `eps`. Core
/// points within `eps` of each other belong to the same cluster. A non-core point within `eps` of a core point is a
/// border point and joins the cluster of its closest core neighbour; ties are broken by the lexicographically
/// smallest position. All other points are noise.
///
/// Unlike the classic expansion order, this assignment does not depend on the order of the input points, so any
/// permutation of `positions` yields the same partition. Cluster numbers are assigned by first appearance in the
/// input order.
///
/// Neighbourhoods are found with a kd-tree and computed in parallel.
///
/// ```
/// # use rockdiff_algorithms::dbscan::*;
/// # use rockdiff_core::containers::ClusterId;
/// # use rockdiff_core::nalgebra::Vector3;
/// let positions = vec![
///     Vector3::new(0.0, 0.0, 0.0),
///     Vector3::new(0.5, 0.0, 0.0),
///     Vector3::new(10.0, 0.0, 0.0),
///     Vector3::new(1.0, 0.0, 0.0),
/// ];
/// let labels = dbscan(&positions, &DbscanParams { eps: 0.6, min_points: 2 }).unwrap();
/// assert_eq!(labels.cluster_count(), 1);
/// assert_eq!(labels.labels()[2], ClusterId::Noise);
/// assert_eq!(labels.members(0), vec![0, 1, 3]);
/// ```
pub fn dbscan(positions: &[Vector3<f64>], params: &DbscanParams) -> Result<ClusterLabels> {
    params.validate()?;
    if positions.is_empty() {
        return Ok(ClusterLabels::new(vec![]));
    }

    let index = PositionIndex::new(positions);
    let neighbourhoods = positions
        .par_iter()
        .map(|position| index.within_radius(position, params.eps))
        .collect::<Vec<_>>();
    let is_core = neighbourhoods
        .iter()
        .map(|neighbours| neighbours.len() >= params.min_points)
        .collect::<Vec<_>>();

    let mut components = DisjointSets::new(positions.len());
    for (point, neighbours) in neighbourhoods.iter().enumerate() {
        if !is_core[point] {
            continue;
        }
        for &neighbour in neighbours {
            if is_core[neighbour] {
                components.union(point, neighbour);
            }
        }
    }

    // Every non-noise point is represented by the core point whose component it joins
    let anchors = neighbourhoods
        .iter()
        .enumerate()
        .map(|(point, neighbours)| {
            if is_core[point] {
                return Some(point);
            }
            let position = &positions[point];
            neighbours
                .iter()
                .copied()
                .filter(|neighbour| is_core[*neighbour])
                .min_by_key(|neighbour| {
                    let candidate = &positions[*neighbour];
                    (
                        FloatOrd((candidate - position).norm_squared()),
                        lexicographic_key(candidate),
                        *neighbour,
                    )
                })
        })
        .collect::<Vec<_>>();

    let mut cluster_numbers = HashMap::new();
    let mut labels = Vec::with_capacity(positions.len());
    for anchor in anchors {
        let label = match anchor {
            Some(core_point) => {
                let root = components.find(core_point);
                let next_number = cluster_numbers.len() as u32;
                ClusterId::Cluster(*cluster_numbers.entry(root).or_insert(next_number))
            }
            None => ClusterId::Noise,
        };
        labels.push(label);
    }

    let labels = ClusterLabels::new(labels);
    info!(
        "DBSCAN (eps = {}, min_points = {}) found {} clusters and {} noise points among {} points",
        params.eps,
        params.min_points,
        labels.cluster_count(),
        labels.noise_count(),
        positions.len()
    );
    Ok(labels)
}
