//! Mesh data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices and faces
///
/// Optional per-vertex normals and colors may accompany the geometry (for
/// example when read from a PLY file); the viewer treats them as overrides
/// for its own derived attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub colors: Option<Vec<Color3>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    ///
    /// Fails with [`Error::InvalidMesh`] if any face references a vertex
    /// index out of range. A corrupt index set is never clamped.
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Result<Self> {
        let mesh = Self {
            vertices,
            faces,
            normals: None,
            colors: None,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check that every face index is in range
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            for &iv in face {
                if iv >= n {
                    return Err(Error::InvalidMesh(format!(
                        "face {} references vertex {} but the mesh has {} vertices",
                        fi, iv, n
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh has no drawable geometry
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Set vertex normals; ignored unless one normal per vertex is given
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Set vertex colors; ignored unless one color per vertex is given
    pub fn set_colors(&mut self, colors: Vec<Color3>) {
        if colors.len() == self.vertices.len() {
            self.colors = Some(colors);
        }
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.normals = None;
        self.colors = None;
    }

    /// Axis-aligned bounding box as `(min, max)` corners
    pub fn bounding_box(&self) -> (Point3f, Point3f) {
        if self.vertices.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }

    /// Center of the bounding box
    pub fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }

    /// Bounding sphere as `(center, radius)`
    ///
    /// The sphere is centered on the bounding box and has radius equal to
    /// half the box diagonal, which is what the camera frames against.
    pub fn bounding_sphere(&self) -> (Point3f, f32) {
        let (min, max) = self.bounding_box();
        let center = Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        );
        let radius = (max - min).norm() / 2.0;
        (center, radius)
    }

    /// Mean edge length over all triangles
    ///
    /// Each triangle contributes its three edges, so an edge shared by two
    /// triangles is counted twice. Returns `0.0` for a mesh without faces.
    pub fn average_edge_length(&self) -> f32 {
        if self.faces.is_empty() {
            return 0.0;
        }

        let mut total = 0.0f32;
        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            total += (v1 - v0).norm() + (v2 - v1).norm() + (v0 - v2).norm();
        }
        total / (self.faces.len() as f32 * 3.0)
    }

    /// Centroid of each face
    pub fn face_centroids(&self) -> Vec<Point3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];
                Point3f::new(
                    (v0.x + v1.x + v2.x) / 3.0,
                    (v0.y + v1.y + v2.y) / 3.0,
                    (v0.z + v1.z + v2.z) / 3.0,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit cube centered on the origin: 8 vertices, 12 triangles
    fn unit_cube() -> TriangleMesh {
        let vertices = vec![
            Point3f::new(-0.5, -0.5, -0.5),
            Point3f::new(0.5, -0.5, -0.5),
            Point3f::new(0.5, 0.5, -0.5),
            Point3f::new(-0.5, 0.5, -0.5),
            Point3f::new(-0.5, -0.5, 0.5),
            Point3f::new(0.5, -0.5, 0.5),
            Point3f::new(0.5, 0.5, 0.5),
            Point3f::new(-0.5, 0.5, 0.5),
        ];
        let faces = vec![
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [1, 2, 6],
            [1, 6, 5],
            [3, 0, 4],
            [3, 4, 7],
        ];
        TriangleMesh::from_vertices_and_faces(vertices, faces).unwrap()
    }

    #[test]
    fn test_face_index_validation() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let result = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 3]]);
        assert!(matches!(result, Err(Error::InvalidMesh(_))));
    }

    #[test]
    fn test_unit_cube_bounding_sphere() {
        let cube = unit_cube();
        let (center, radius) = cube.bounding_sphere();
        assert_relative_eq!(center.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(center.z, 0.0, epsilon = 1e-6);
        assert_relative_eq!(radius, 3.0f32.sqrt() / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unit_cube_average_edge_length() {
        let cube = unit_cube();
        // every triangle of the cube has edges 1, 1, sqrt(2)
        let expected = (2.0 + 2.0f32.sqrt()) / 3.0;
        assert_relative_eq!(cube.average_edge_length(), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_mesh_quantities() {
        let mesh = TriangleMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.average_edge_length(), 0.0);
        let (center, radius) = mesh.bounding_sphere();
        assert_eq!(center, Point3f::origin());
        assert_eq!(radius, 0.0);
    }

    #[test]
    fn test_set_normals_rejects_wrong_length() {
        let mut cube = unit_cube();
        cube.set_normals(vec![Vector3f::z(); 3]);
        assert!(cube.normals.is_none());
        cube.set_normals(vec![Vector3f::z(); 8]);
        assert!(cube.normals.is_some());
    }

    #[test]
    fn test_face_centroids() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(3.0, 0.0, 0.0),
            Point3f::new(0.0, 3.0, 0.0),
        ];
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2]]).unwrap();
        let centroids = mesh.face_centroids();
        assert_eq!(centroids.len(), 1);
        assert_relative_eq!(centroids[0].x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(centroids[0].y, 1.0, epsilon = 1e-6);
    }
}
