use kd_tree::{KdPoint, KdTree};
use rockdiff_core::nalgebra::{Point2, Vector3};

/// A 3D position together with the index of its point in the indexed slice
#[derive(Debug, Copy, Clone, PartialEq)]
struct IndexedPosition {
    position: [f64; 3],
    index: usize,
}

impl KdPoint for IndexedPosition {
    type Scalar = f64;
    type Dim = typenum::U3;
    fn at(&self, k: usize) -> f64 {
        self.position[k]
    }
}

/// A 2D position together with the index of its point in the indexed slice
#[derive(Debug, Copy, Clone, PartialEq)]
struct IndexedPlanarPosition {
    position: [f64; 2],
    index: usize,
}

impl KdPoint for IndexedPlanarPosition {
    type Scalar = f64;
    type Dim = typenum::U2;
    fn at(&self, k: usize) -> f64 {
        self.position[k]
    }
}

/// kd-tree over 3D point positions. Query results are indices into the slice that the index was built from
pub struct PositionIndex {
    tree: KdTree<IndexedPosition>,
}

impl PositionIndex {
    pub fn new(positions: &[Vector3<f64>]) -> Self {
        let items = positions
            .iter()
            .enumerate()
            .map(|(index, position)| IndexedPosition {
                position: [position.x, position.y, position.z],
                index,
            })
            .collect();
        Self {
            tree: KdTree::build_by_ordered_float(items),
        }
    }

    /// Indices of all points with a Euclidean distance of at most `radius` to `position`, in ascending order. If
    /// `position` is itself an indexed point, its own index is part of the result
    pub fn within_radius(&self, position: &Vector3<f64>, radius: f64) -> Vec<usize> {
        let query = IndexedPosition {
            position: [position.x, position.y, position.z],
            index: usize::MAX,
        };
        let squared_radius = radius * radius;
        // Points exactly on the sphere must be included, so query slightly wider and filter exactly
        let mut indices = self
            .tree
            .within_radius(&query, radius * (1.0 + 1e-9) + f64::EPSILON)
            .into_iter()
            .filter(|candidate| {
                let dx = candidate.position[0] - position.x;
                let dy = candidate.position[1] - position.y;
                let dz = candidate.position[2] - position.z;
                dx * dx + dy * dy + dz * dz <= squared_radius
            })
            .map(|candidate| candidate.index)
            .collect::<Vec<_>>();
        indices.sort_unstable();
        indices
    }
}

/// kd-tree over 2D positions, used for spacing estimates of projected footprints
pub struct PlanarIndex {
    tree: KdTree<IndexedPlanarPosition>,
    len: usize,
}

impl PlanarIndex {
    pub fn new(points: &[Point2<f64>]) -> Self {
        let items = points
            .iter()
            .enumerate()
            .map(|(index, point)| IndexedPlanarPosition {
                position: [point.x, point.y],
                index,
            })
            .collect();
        Self {
            tree: KdTree::build_by_ordered_float(items),
            len: points.len(),
        }
    }

    /// Distance from `point` to the closest indexed point that does not coincide with it. Returns `None` if all
    /// indexed points coincide with `point`
    pub fn nearest_distinct_distance(&self, point: &Point2<f64>) -> Option<f64> {
        let query = IndexedPlanarPosition {
            position: [point.x, point.y],
            index: usize::MAX,
        };
        let mut count = 2.min(self.len);
        loop {
            let nearest = self
                .tree
                .nearests(&query, count)
                .into_iter()
                .map(|neighbour| neighbour.squared_distance)
                .find(|squared_distance| *squared_distance > 0.0);
            if let Some(squared_distance) = nearest {
                return Some(squared_distance.sqrt());
            }
            if count >= self.len {
                return None;
            }
            // Duplicates fill up the nearest neighbours, widen the search
            count = (count * 2).min(self.len);
        }
    }
}
