//! Ordered selection of mesh elements

use serde::{Deserialize, Serialize};

/// Picked vertex and face indices, in pick order
///
/// Both sequences have set semantics: an index appears at most once, and
/// picking it again removes it. Selection state is independent of the
/// camera and survives attribute edits; only a mesh replacement or an
/// explicit clear empties it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSet {
    vertices: Vec<usize>,
    faces: Vec<usize>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a vertex; returns true when the vertex is now selected
    pub fn toggle_vertex(&mut self, index: usize) -> bool {
        toggle(&mut self.vertices, index)
    }

    /// Toggle a face; returns true when the face is now selected
    pub fn toggle_face(&mut self, index: usize) -> bool {
        toggle(&mut self.faces, index)
    }

    /// Selected vertex indices in pick order
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Selected face indices in pick order
    pub fn faces(&self) -> &[usize] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// Drop every selected vertex and face
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
    }
}

fn toggle(indices: &mut Vec<usize>, index: usize) -> bool {
    if let Some(pos) = indices.iter().position(|&i| i == index) {
        indices.remove(pos);
        false
    } else {
        indices.push(index);
        true
    }
}
