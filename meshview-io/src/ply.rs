//! PLY format support

use crate::{MeshReader, MeshWriter};
use meshview_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub struct PlyReader;
pub struct PlyWriter;

impl MeshReader for PlyReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        // Extract vertices
        let mut vertices = Vec::new();
        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                let x = extract_property_value(vertex, "x")?;
                let y = extract_property_value(vertex, "y")?;
                let z = extract_property_value(vertex, "z")?;

                vertices.push(Point3f::new(x, y, z));
            }
        }

        // Extract faces, fan-triangulating any polygonal ones
        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face)?;
                if indices.len() < 3 {
                    return Err(Error::InvalidData(
                        "PLY face with fewer than 3 vertices".to_string(),
                    ));
                }
                for i in 1..indices.len() - 1 {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
        }

        // Extract normals if every vertex carries them
        let normals = if let Some(vertex_element) = ply.payload.get("vertex") {
            let mut normals = Vec::new();
            let mut has_normals = true;

            for vertex in vertex_element {
                if let (Ok(nx), Ok(ny), Ok(nz)) = (
                    extract_property_value(vertex, "nx"),
                    extract_property_value(vertex, "ny"),
                    extract_property_value(vertex, "nz"),
                ) {
                    normals.push(Vector3f::new(nx, ny, nz));
                } else {
                    has_normals = false;
                    break;
                }
            }

            if has_normals && !normals.is_empty() {
                Some(normals)
            } else {
                None
            }
        } else {
            None
        };

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces)?;
        if let Some(normals) = normals {
            mesh.set_normals(normals);
        }

        Ok(mesh)
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();

        // Define vertex element
        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        vertex_element.properties.add(PropertyDef::new(
            "x".to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
        vertex_element.properties.add(PropertyDef::new(
            "y".to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
        vertex_element.properties.add(PropertyDef::new(
            "z".to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));

        if mesh.normals.is_some() {
            vertex_element.properties.add(PropertyDef::new(
                "nx".to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
            vertex_element.properties.add(PropertyDef::new(
                "ny".to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
            vertex_element.properties.add(PropertyDef::new(
                "nz".to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }

        ply.header.elements.add(vertex_element);

        // Define face element
        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));

        ply.header.elements.add(face_element);

        // Add vertex data
        let mut vertices = Vec::new();
        for (i, vertex) in mesh.vertices.iter().enumerate() {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Float(vertex.x));
            element.insert("y".to_string(), Property::Float(vertex.y));
            element.insert("z".to_string(), Property::Float(vertex.z));

            if let Some(normals) = &mesh.normals {
                if i < normals.len() {
                    element.insert("nx".to_string(), Property::Float(normals[i].x));
                    element.insert("ny".to_string(), Property::Float(normals[i].y));
                    element.insert("nz".to_string(), Property::Float(normals[i].z));
                }
            }

            vertices.push(element);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        // Add face data
        let mut faces = Vec::new();
        for face in &mesh.faces {
            let mut element = DefaultElement::new();
            let indices = vec![face[0] as i32, face[1] as i32, face[2] as i32];
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        Ok(())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "PLY property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    match element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"))
    {
        Some(Property::ListInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        _ => Err(Error::InvalidData("PLY face indices not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("meshview-ply-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_write_read_round_trip() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 1, 2], [0, 1, 3]];
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, faces).unwrap();

        let path = temp_path("roundtrip.ply");
        PlyWriter::write_mesh(&mesh, &path).unwrap();
        let reread = PlyReader::read_mesh(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reread.vertex_count(), 4);
        assert_eq!(reread.faces, mesh.faces);
        assert_relative_eq!(reread.vertices[3].z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normals_round_trip() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2]]).unwrap();
        mesh.set_normals(vec![Vector3f::z(); 3]);

        let path = temp_path("normals.ply");
        PlyWriter::write_mesh(&mesh, &path).unwrap();
        let reread = PlyReader::read_mesh(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let normals = reread.normals.expect("normals should survive the round trip");
        assert_eq!(normals.len(), 3);
        assert_relative_eq!(normals[0].z, 1.0, epsilon = 1e-6);
    }
}
