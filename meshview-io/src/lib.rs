//! Mesh file I/O for meshview
//!
//! This crate reads and writes triangle meshes in OBJ and PLY formats and
//! is the `MeshSource` collaborator of the viewer: a failed load surfaces
//! an error and leaves the caller's state untouched.

pub mod obj;
pub mod ply;

pub use obj::{ObjReader, ObjWriter};
pub use ply::{PlyReader, PlyWriter};

use meshview_core::{Error, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

/// Auto-detect format from the extension and read a mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("obj") => ObjReader::read_mesh(path),
        Some("ply") => PlyReader::read_mesh(path),
        other => Err(Error::UnsupportedFormat(format!(
            "unsupported mesh format: {:?}",
            other
        ))),
    }
}

/// Auto-detect format from the extension and write a mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("obj") => ObjWriter::write_mesh(mesh, path),
        Some("ply") => PlyWriter::write_mesh(mesh, path),
        other => Err(Error::UnsupportedFormat(format!(
            "unsupported mesh format: {:?}",
            other
        ))),
    }
}
