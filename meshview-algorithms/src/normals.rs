//! Normal estimation for triangle meshes

use meshview_core::{TriangleMesh, Vector3f};
use rayon::prelude::*;

/// Compute one unit normal per face
///
/// Degenerate triangles (zero area) get a zero normal instead of NaN.
pub fn per_face_normals(mesh: &TriangleMesh) -> Vec<Vector3f> {
    mesh.faces
        .par_iter()
        .map(|face| {
            let v0 = mesh.vertices[face[0]];
            let v1 = mesh.vertices[face[1]];
            let v2 = mesh.vertices[face[2]];

            let n = (v1 - v0).cross(&(v2 - v0));
            let len = n.norm();
            if len > 0.0 {
                n / len
            } else {
                Vector3f::zeros()
            }
        })
        .collect()
}

/// Compute one unit normal per vertex, area-weighted over incident faces
///
/// The unnormalized cross product of a triangle's edges has magnitude
/// proportional to its area, so summing it per vertex weights large faces
/// more, then a final normalization yields the vertex normal. Vertices
/// with no incident (non-degenerate) face keep a zero normal.
pub fn per_vertex_normals(mesh: &TriangleMesh) -> Vec<Vector3f> {
    let mut accumulated = vec![Vector3f::zeros(); mesh.vertices.len()];

    for face in &mesh.faces {
        let v0 = mesh.vertices[face[0]];
        let v1 = mesh.vertices[face[1]];
        let v2 = mesh.vertices[face[2]];
        let weighted = (v1 - v0).cross(&(v2 - v0));

        for &iv in face {
            accumulated[iv] += weighted;
        }
    }

    for normal in &mut accumulated {
        let len = normal.norm();
        if len > 0.0 {
            *normal /= len;
        }
    }
    accumulated
}
