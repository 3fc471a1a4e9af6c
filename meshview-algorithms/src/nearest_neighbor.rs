//! Nearest neighbor search implementations

use kiddo::{KdTree, SquaredEuclidean};
use meshview_core::{NearestNeighborSearch, Point3f};

/// K-d tree over an immutable snapshot of points
///
/// Built once per mesh load in O(N log N); `nearest` answers in O(log N).
/// There is no incremental update path: rebuild after any vertex change.
pub struct KdTreeIndex {
    tree: KdTree<f32, 3>,
    len: usize,
}

impl KdTreeIndex {
    /// Build an index over a snapshot of the given points
    pub fn build(points: &[Point3f]) -> Self {
        let mut tree = KdTree::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            tree.add(&[p.x, p.y, p.z], i as u64);
        }
        Self {
            tree,
            len: points.len(),
        }
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no points
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl NearestNeighborSearch for KdTreeIndex {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        if self.len == 0 || k == 0 {
            return Vec::new();
        }
        self.tree
            .nearest_n::<SquaredEuclidean>(&[query.x, query.y, query.z], k)
            .into_iter()
            .map(|n| (n.item as usize, n.distance))
            .collect()
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        if self.len == 0 {
            return Vec::new();
        }
        self.tree
            .within::<SquaredEuclidean>(&[query.x, query.y, query.z], radius * radius)
            .into_iter()
            .map(|n| (n.item as usize, n.distance))
            .collect()
    }

    fn nearest(&self, query: &Point3f) -> Option<(usize, f32)> {
        if self.len == 0 {
            return None;
        }
        let n = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[query.x, query.y, query.z]);
        Some((n.item as usize, n.distance))
    }
}

/// Simple brute force nearest neighbor search for small datasets
pub struct BruteForceSearch {
    points: Vec<Point3f>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3f]) -> Self {
        Self {
            points: points.to_vec(),
        }
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let mut distances: Vec<(usize, f32)> = self
            .points
            .iter()
            .enumerate()
            .map(|(idx, point)| (idx, (point - query).norm_squared()))
            .collect();

        distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        distances.truncate(k);
        distances
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        let radius_squared = radius * radius;
        self.points
            .iter()
            .enumerate()
            .filter_map(|(idx, point)| {
                let distance_squared = (point - query).norm_squared();
                if distance_squared <= radius_squared {
                    Some((idx, distance_squared))
                } else {
                    None
                }
            })
            .collect()
    }
}
