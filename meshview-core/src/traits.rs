//! Core traits for meshview

use crate::{mesh::TriangleMesh, point::*};

/// Trait for nearest neighbor search structures
///
/// All distances are squared Euclidean distances. Queries take `&self` and
/// are side-effect-free, so a structure may be queried concurrently; the
/// structure itself is an immutable snapshot and must be rebuilt wholesale
/// when the underlying points change.
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point, closest first
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;

    /// Find all neighbors within a given (unsquared) radius
    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)>;

    /// Find the single nearest neighbor, if the structure is non-empty
    fn nearest(&self, query: &Point3f) -> Option<(usize, f32)> {
        self.find_k_nearest(query, 1).first().copied()
    }
}

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f;

    /// Bounding sphere derived from the bounding box
    fn bounding_sphere(&self) -> (Point3f, f32) {
        let (min, max) = self.bounding_box();
        let center = Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        );
        (center, (max - min).norm() / 2.0)
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        TriangleMesh::bounding_box(self)
    }

    fn center(&self) -> Point3f {
        TriangleMesh::center(self)
    }

    fn bounding_sphere(&self) -> (Point3f, f32) {
        TriangleMesh::bounding_sphere(self)
    }
}
