//! OBJ format support
//!
//! A line-based reader/writer for the geometry subset of Wavefront OBJ:
//! `v` and `f` records. Texture/normal references in face records are
//! accepted and ignored; polygonal faces are fan-triangulated. The viewer
//! recomputes normals on load, so `vn` records are not carried through.

use crate::{MeshReader, MeshWriter};
use meshview_core::{Error, Point3f, Result, TriangleMesh};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub struct ObjReader;
pub struct ObjWriter;

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut vertices: Vec<Point3f> = Vec::new();
        let mut faces: Vec<[usize; 3]> = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut tokens = line.split_whitespace();

            match tokens.next() {
                Some("v") => {
                    let coords = parse_coords(&mut tokens, line_no)?;
                    vertices.push(Point3f::new(coords[0], coords[1], coords[2]));
                }
                Some("f") => {
                    let mut corners = Vec::with_capacity(4);
                    for token in tokens {
                        corners.push(parse_face_index(token, vertices.len(), line_no)?);
                    }
                    if corners.len() < 3 {
                        return Err(Error::InvalidData(format!(
                            "OBJ line {}: face with fewer than 3 vertices",
                            line_no + 1
                        )));
                    }
                    for i in 1..corners.len() - 1 {
                        faces.push([corners[0], corners[i], corners[i + 1]]);
                    }
                }
                // groups, materials, normals, texcoords, comments
                _ => {}
            }
        }

        TriangleMesh::from_vertices_and_faces(vertices, faces)
    }
}

impl MeshWriter for ObjWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        for v in &mesh.vertices {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for face in &mesh.faces {
            writeln!(writer, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn parse_coords<'a, I>(tokens: &mut I, line_no: usize) -> Result<[f32; 3]>
where
    I: Iterator<Item = &'a str>,
{
    let mut coords = [0.0f32; 3];
    for coord in &mut coords {
        let token = tokens.next().ok_or_else(|| {
            Error::InvalidData(format!("OBJ line {}: truncated vertex record", line_no + 1))
        })?;
        *coord = token.parse::<f32>().map_err(|_| {
            Error::InvalidData(format!(
                "OBJ line {}: invalid coordinate {:?}",
                line_no + 1,
                token
            ))
        })?;
    }
    Ok(coords)
}

/// Parse one `f`-record corner (`i`, `i/j`, `i//k`, `i/j/k`) to a
/// zero-based vertex index. Negative indices are relative to the vertices
/// read so far, per the OBJ specification.
fn parse_face_index(token: &str, vertex_count: usize, line_no: usize) -> Result<usize> {
    let index_part = token.split('/').next().unwrap_or(token);
    let raw: i64 = index_part.parse().map_err(|_| {
        Error::InvalidData(format!(
            "OBJ line {}: invalid face index {:?}",
            line_no + 1,
            token
        ))
    })?;

    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        vertex_count as i64 + raw
    } else {
        return Err(Error::InvalidData(format!(
            "OBJ line {}: face index 0 is not allowed",
            line_no + 1
        )));
    };

    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(Error::InvalidMesh(format!(
            "OBJ line {}: face references vertex {} but only {} are defined",
            line_no + 1,
            raw,
            vertex_count
        )));
    }
    Ok(resolved as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write as _;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("meshview-obj-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_read_triangles_and_quads() {
        let path = temp_path("quad.obj");
        {
            let mut f = File::create(&path).unwrap();
            writeln!(f, "# a quad and a triangle").unwrap();
            writeln!(f, "v 0 0 0").unwrap();
            writeln!(f, "v 1 0 0").unwrap();
            writeln!(f, "v 1 1 0").unwrap();
            writeln!(f, "v 0 1 0").unwrap();
            writeln!(f, "f 1 2 3 4").unwrap();
            writeln!(f, "f 1/1 2/2 3/3").unwrap();
        }

        let mesh = ObjReader::read_mesh(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mesh.vertex_count(), 4);
        // quad fan-triangulated into 2 faces, plus the explicit triangle
        assert_eq!(mesh.face_count(), 3);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.faces[1], [0, 2, 3]);
    }

    #[test]
    fn test_negative_indices() {
        let path = temp_path("negative.obj");
        {
            let mut f = File::create(&path).unwrap();
            writeln!(f, "v 0 0 0").unwrap();
            writeln!(f, "v 1 0 0").unwrap();
            writeln!(f, "v 0 1 0").unwrap();
            writeln!(f, "f -3 -2 -1").unwrap();
        }

        let mesh = ObjReader::read_mesh(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(mesh.faces[0], [0, 1, 2]);
    }

    #[test]
    fn test_out_of_range_index_is_fatal() {
        let path = temp_path("corrupt.obj");
        {
            let mut f = File::create(&path).unwrap();
            writeln!(f, "v 0 0 0").unwrap();
            writeln!(f, "v 1 0 0").unwrap();
            writeln!(f, "v 0 1 0").unwrap();
            writeln!(f, "f 1 2 9").unwrap();
        }

        let result = ObjReader::read_mesh(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::InvalidMesh(_))));
    }

    #[test]
    fn test_write_read_round_trip() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.5, 0.0, 0.0),
            Point3f::new(0.0, 2.5, 0.0),
        ];
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2]]).unwrap();

        let path = temp_path("roundtrip.obj");
        ObjWriter::write_mesh(&mesh, &path).unwrap();
        let reread = ObjReader::read_mesh(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reread.vertex_count(), 3);
        assert_eq!(reread.faces, mesh.faces);
        assert_relative_eq!(reread.vertices[1].x, 1.5, epsilon = 1e-6);
        assert_relative_eq!(reread.vertices[2].y, 2.5, epsilon = 1e-6);
    }
}
