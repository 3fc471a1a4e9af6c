//! Scene state: mesh geometry, derived attributes, and pick indexes
//!
//! `SceneData` owns the mesh and everything derived from it: normals,
//! material color tables, UVs, the default texture, and the k-d indexes
//! used for picking. Every mutator returns the [`DirtyFlags`] it caused so
//! the session can invalidate the render cache; reads are free-form.

use crate::render_cache::DirtyFlags;
use crate::selection::SelectionSet;
use log::{debug, warn};
use meshview_algorithms::{per_face_normals, per_vertex_normals, KdTreeIndex};
use meshview_core::{Color3, NearestNeighborSearch, Point3f, Result, TriangleMesh, Vector3f};

/// RGB texture stored as separate channel planes
#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub r: Vec<u8>,
    pub g: Vec<u8>,
    pub b: Vec<u8>,
}

/// The viewer's mesh plus all attributes derived from it
///
/// Fields are readable directly; mutation goes through the `set_*` and
/// pick methods so derived state and dirty flags stay consistent.
pub struct SceneData {
    pub mesh: TriangleMesh,

    // bounds and pick tolerance, cached at mesh load
    pub p_min: Point3f,
    pub p_max: Point3f,
    pub avg_edge: f32,

    // per-face attributes
    pub f_normals: Vec<Vector3f>,
    pub f_ambient: Vec<Color3>,
    pub f_diffuse: Vec<Color3>,
    pub f_specular: Vec<Color3>,

    // per-vertex attributes
    pub v_normals: Vec<Vector3f>,
    pub v_ambient: Vec<Color3>,
    pub v_diffuse: Vec<Color3>,
    pub v_specular: Vec<Color3>,

    // UV parametrization and texture
    pub v_uv: Vec<[f32; 2]>,
    pub f_uv: Vec<[usize; 3]>,
    pub texture: Texture,

    /// Whether face attributes take precedence over vertex attributes
    pub face_based: bool,

    vertex_index: Option<KdTreeIndex>,
    centroid_index: Option<KdTreeIndex>,

    selection: SelectionSet,
}

impl SceneData {
    pub fn new() -> Self {
        Self {
            mesh: TriangleMesh::new(),
            p_min: Point3f::origin(),
            p_max: Point3f::origin(),
            avg_edge: 0.0,
            f_normals: Vec::new(),
            f_ambient: Vec::new(),
            f_diffuse: Vec::new(),
            f_specular: Vec::new(),
            v_normals: Vec::new(),
            v_ambient: Vec::new(),
            v_diffuse: Vec::new(),
            v_specular: Vec::new(),
            v_uv: Vec::new(),
            f_uv: Vec::new(),
            texture: Texture::default(),
            face_based: false,
            vertex_index: None,
            centroid_index: None,
            selection: SelectionSet::new(),
        }
    }

    /// Empty all fields
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Replace the mesh wholesale and rebuild every derived attribute
    ///
    /// Validates face indices first; a corrupt mesh leaves prior state
    /// untouched. A mesh with zero vertices or faces is accepted with a
    /// warning; the viewer draws a placeholder for it. Returns all dirty
    /// flags, since nothing derived survives a geometry change.
    pub fn set_mesh(&mut self, mesh: TriangleMesh) -> Result<DirtyFlags> {
        mesh.validate()?;

        if mesh.is_empty() {
            warn!(
                "degenerate mesh: {} vertices, {} faces",
                mesh.vertex_count(),
                mesh.face_count()
            );
        }

        self.clear();
        self.mesh = mesh;

        let (p_min, p_max) = self.mesh.bounding_box();
        self.p_min = p_min;
        self.p_max = p_max;
        self.avg_edge = self.mesh.average_edge_length();

        self.compute_normals();
        self.uniform_colors(
            Color3::new(0.2, 0.2, 0.2),
            Color3::new(0.6, 0.5, 0.0),
            Color3::new(0.3, 0.3, 0.3),
        );

        // caller-supplied overrides shipped with the mesh file
        if let Some(normals) = self.mesh.normals.clone() {
            self.set_normals(&normals);
        }
        if let Some(colors) = self.mesh.colors.clone() {
            self.set_colors(&colors);
        }

        self.grid_texture();

        self.vertex_index = if self.mesh.vertices.is_empty() {
            None
        } else {
            Some(KdTreeIndex::build(&self.mesh.vertices))
        };
        self.centroid_index = if self.mesh.faces.is_empty() {
            None
        } else {
            Some(KdTreeIndex::build(&self.mesh.face_centroids()))
        };

        debug!(
            "scene set: {} vertices, {} faces, avg edge {}",
            self.mesh.vertex_count(),
            self.mesh.face_count(),
            self.avg_edge
        );
        Ok(DirtyFlags::all())
    }

    /// Recompute face and vertex normals from the geometry
    pub fn compute_normals(&mut self) {
        self.f_normals = per_face_normals(&self.mesh);
        self.v_normals = per_vertex_normals(&self.mesh);
    }

    /// Assign the same material to every face and vertex
    pub fn uniform_colors(&mut self, ambient: Color3, diffuse: Color3, specular: Color3) {
        let nv = self.mesh.vertex_count();
        let nf = self.mesh.face_count();
        self.v_ambient = vec![ambient; nv];
        self.v_diffuse = vec![diffuse; nv];
        self.v_specular = vec![specular; nv];
        self.f_ambient = vec![ambient; nf];
        self.f_diffuse = vec![diffuse; nf];
        self.f_specular = vec![specular; nf];
    }

    /// Replace normals with user-supplied ones
    ///
    /// One normal per vertex or one per face; anything else is logged and
    /// ignored, keeping the prior values.
    pub fn set_normals(&mut self, normals: &[Vector3f]) -> DirtyFlags {
        if normals.len() == self.mesh.vertex_count() {
            self.face_based = false;
            self.v_normals = normals.to_vec();
            DirtyFlags::NORMAL
        } else if normals.len() == self.mesh.face_count() {
            self.face_based = true;
            self.f_normals = normals.to_vec();
            DirtyFlags::NORMAL
        } else {
            warn!(
                "set_normals: got {} normals for {} vertices / {} faces; ignored",
                normals.len(),
                self.mesh.vertex_count(),
                self.mesh.face_count()
            );
            DirtyFlags::empty()
        }
    }

    /// Replace diffuse colors and derive ambient/specular from them
    ///
    /// Accepts a single color (applied uniformly), one color per vertex,
    /// or one color per face. Ambient is a darkened copy; specular is
    /// desaturated toward grey for dampened highlights. An ambiguous row
    /// count is logged and ignored.
    pub fn set_colors(&mut self, colors: &[Color3]) -> DirtyFlags {
        if colors.len() == 1 {
            for c in &mut self.v_diffuse {
                *c = colors[0];
            }
            derive_materials(&self.v_diffuse, &mut self.v_ambient, &mut self.v_specular);
            for c in &mut self.f_diffuse {
                *c = colors[0];
            }
            derive_materials(&self.f_diffuse, &mut self.f_ambient, &mut self.f_specular);
        } else if colors.len() == self.mesh.vertex_count() {
            self.face_based = false;
            self.v_diffuse = colors.to_vec();
            derive_materials(&self.v_diffuse, &mut self.v_ambient, &mut self.v_specular);
        } else if colors.len() == self.mesh.face_count() {
            self.face_based = true;
            self.f_diffuse = colors.to_vec();
            derive_materials(&self.f_diffuse, &mut self.f_ambient, &mut self.f_specular);
        } else {
            warn!(
                "set_colors: got {} colors for {} vertices / {} faces; ignored",
                colors.len(),
                self.mesh.vertex_count(),
                self.mesh.face_count()
            );
            return DirtyFlags::empty();
        }

        DirtyFlags::DIFFUSE | DirtyFlags::AMBIENT | DirtyFlags::SPECULAR
    }

    /// Set one UV coordinate per vertex
    pub fn set_uv(&mut self, uv: &[[f32; 2]]) -> DirtyFlags {
        if uv.len() == self.mesh.vertex_count() {
            self.face_based = false;
            self.v_uv = uv.to_vec();
            DirtyFlags::UV
        } else {
            warn!(
                "set_uv: got {} coordinates for {} vertices; ignored",
                uv.len(),
                self.mesh.vertex_count()
            );
            DirtyFlags::empty()
        }
    }

    /// Set UV coordinates with their own face topology
    pub fn set_uv_indexed(&mut self, uv: &[[f32; 2]], uv_faces: &[[usize; 3]]) -> DirtyFlags {
        self.face_based = true;
        self.v_uv = uv.to_vec();
        self.f_uv = uv_faces.to_vec();
        DirtyFlags::UV
    }

    /// Replace the texture with separate channel planes
    pub fn set_texture(
        &mut self,
        width: usize,
        height: usize,
        r: Vec<u8>,
        g: Vec<u8>,
        b: Vec<u8>,
    ) -> DirtyFlags {
        let expected = width * height;
        if r.len() != expected || g.len() != expected || b.len() != expected {
            warn!(
                "set_texture: channel planes do not match {}x{}; ignored",
                width, height
            );
            return DirtyFlags::empty();
        }
        self.texture = Texture {
            width,
            height,
            r,
            g,
            b,
        };
        DirtyFlags::TEXTURE
    }

    /// Generate default planar UVs (if none are set) and a checkerboard
    /// texture
    pub fn grid_texture(&mut self) {
        if self.v_uv.is_empty() && !self.mesh.vertices.is_empty() {
            let (min, max) = self.mesh.bounding_box();
            let extent_x = (max.x - min.x).max(f32::EPSILON);
            let extent_y = (max.y - min.y).max(f32::EPSILON);
            self.v_uv = self
                .mesh
                .vertices
                .iter()
                .map(|v| {
                    [
                        (v.x - min.x) / extent_x * 10.0,
                        (v.y - min.y) / extent_y * 10.0,
                    ]
                })
                .collect();
        }

        let size = 128usize;
        let half = size / 2;
        let mut plane = vec![0u8; size * size];
        for i in 0..size {
            for j in 0..size {
                if (i < half && j < half) || (i >= half && j >= half) {
                    plane[i * size + j] = 255;
                }
            }
        }

        self.texture = Texture {
            width: size,
            height: size,
            r: plane.clone(),
            g: plane.clone(),
            b: plane,
        };
    }

    /// Toggle the vertex nearest to a world-space point
    ///
    /// Queries outside the bounding box grown by one average edge length
    /// are rejected before touching the index, and a nearest vertex
    /// further than three average edge lengths away is not a pick either.
    /// Returns the toggled vertex index on acceptance.
    pub fn pick_vertex(&mut self, point: &Point3f) -> Option<usize> {
        if self.outside_pick_bounds(point) {
            return None;
        }

        let (index, dist_sq) = self.vertex_index.as_ref()?.nearest(point)?;
        let tolerance = 3.0 * self.avg_edge;
        if dist_sq < tolerance * tolerance {
            self.selection.toggle_vertex(index);
            Some(index)
        } else {
            None
        }
    }

    /// Toggle the face whose centroid is nearest to a world-space point
    ///
    /// Same bounds pre-reject and distance tolerance as vertex picking.
    pub fn pick_face(&mut self, point: &Point3f) -> Option<usize> {
        if self.outside_pick_bounds(point) {
            return None;
        }

        let (index, dist_sq) = self.centroid_index.as_ref()?.nearest(point)?;
        let tolerance = 3.0 * self.avg_edge;
        if dist_sq < tolerance * tolerance {
            self.selection.toggle_face(index);
            Some(index)
        } else {
            None
        }
    }

    fn outside_pick_bounds(&self, point: &Point3f) -> bool {
        for i in 0..3 {
            if point[i] < self.p_min[i] - self.avg_edge
                || point[i] > self.p_max[i] + self.avg_edge
            {
                return true;
            }
        }
        false
    }

    /// Empty the selection unconditionally
    pub fn clear_selection(&mut self) -> DirtyFlags {
        self.selection.clear();
        DirtyFlags::OVERLAY_SELECTION
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Radius for the selection marker spheres
    pub fn marker_radius(&self) -> f32 {
        let diagonal = (self.p_max - self.p_min).norm();
        (diagonal * 0.01).min(self.avg_edge / 3.0)
    }

    /// Whether there is any drawable geometry
    pub fn is_degenerate(&self) -> bool {
        self.mesh.is_empty()
    }
}

impl Default for SceneData {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive ambient and specular tables from a diffuse table
///
/// Ambient is a darker copy of the diffuse color; specular is pulled
/// toward a neutral grey so highlights come out dampened and desaturated.
fn derive_materials(diffuse: &[Color3], ambient: &mut Vec<Color3>, specular: &mut Vec<Color3>) {
    let grey = Color3::repeat(0.3);
    *ambient = diffuse.iter().map(|c| 0.1 * c).collect();
    *specular = diffuse.iter().map(|c| grey + 0.1 * (c - grey)).collect();
}

/// Unit cube centered on the origin: 8 vertices, 12 triangles
#[cfg(test)]
pub(crate) fn unit_cube() -> TriangleMesh {
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_set_mesh_populates_derived_state() {
        let mut scene = SceneData::new();
        let flags = scene.set_mesh(unit_cube()).unwrap();

        assert_eq!(flags, DirtyFlags::all());
        assert_eq!(scene.f_normals.len(), 12);
        assert_eq!(scene.v_normals.len(), 8);
        assert_eq!(scene.v_diffuse.len(), 8);
        assert_eq!(scene.f_diffuse.len(), 12);
        assert_eq!(scene.texture.width, 128);
        assert_relative_eq!(
            scene.avg_edge,
            (2.0 + 2.0f32.sqrt()) / 3.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_set_mesh_rejects_corrupt_faces() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();

        let corrupt = TriangleMesh {
            vertices: vec![Point3f::origin()],
            faces: vec![[0, 0, 7]],
            normals: None,
            colors: None,
        };
        assert!(scene.set_mesh(corrupt).is_err());
        // prior scene retained
        assert_eq!(scene.mesh.vertex_count(), 8);
    }

    #[test]
    fn test_pick_cube_corner() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();

        let picked = scene.pick_vertex(&Point3f::new(0.5, 0.5, 0.5));
        assert_eq!(picked, Some(6));
        assert_eq!(scene.selection().vertices(), &[6]);
    }

    #[test]
    fn test_pick_toggle_round_trip() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();

        let p = Point3f::new(0.5, 0.5, 0.5);
        scene.pick_vertex(&p);
        scene.pick_vertex(&p);
        assert!(scene.selection().vertices().is_empty());
    }

    #[test]
    fn test_pick_outside_bounds_is_rejected() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();

        // well beyond the box grown by one average edge length
        let picked = scene.pick_vertex(&Point3f::new(5.0, 0.0, 0.0));
        assert_eq!(picked, None);
        assert!(scene.selection().vertices().is_empty());
    }

    #[test]
    fn test_pick_beyond_tolerance_is_rejected() {
        // two far-apart triangles keep the average edge length small
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(100.0, 0.0, 0.0),
            Point3f::new(101.0, 0.0, 0.0),
            Point3f::new(100.0, 1.0, 0.0),
        ];
        let mesh =
            TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2], [3, 4, 5]]).unwrap();
        let mut scene = SceneData::new();
        scene.set_mesh(mesh).unwrap();

        // inside the bounding box, but three average edge lengths from
        // every vertex
        let picked = scene.pick_vertex(&Point3f::new(50.0, 0.5, 0.0));
        assert_eq!(picked, None);
        assert!(scene.selection().vertices().is_empty());
    }

    #[test]
    fn test_pick_two_distinct_vertices_keeps_both() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();

        scene.pick_vertex(&Point3f::new(0.5, 0.5, 0.5));
        scene.pick_vertex(&Point3f::new(-0.5, -0.5, -0.5));
        assert_eq!(scene.selection().vertices(), &[6, 0]);
    }

    #[test]
    fn test_pick_face_by_centroid() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();

        let centroids = scene.mesh.face_centroids();
        let picked = scene.pick_face(&centroids[3]);
        assert_eq!(picked, Some(3));
        assert_eq!(scene.selection().faces(), &[3]);
    }

    #[test]
    fn test_set_colors_shapes() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();

        // constant color hits both tables
        let flags = scene.set_colors(&[Color3::new(1.0, 0.0, 0.0)]);
        assert_eq!(
            flags,
            DirtyFlags::DIFFUSE | DirtyFlags::AMBIENT | DirtyFlags::SPECULAR
        );
        assert_relative_eq!(scene.v_diffuse[0].x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(scene.f_diffuse[0].x, 1.0, epsilon = 1e-6);

        // per-vertex
        let flags = scene.set_colors(&vec![Color3::new(0.0, 1.0, 0.0); 8]);
        assert!(!flags.is_empty());
        assert!(!scene.face_based);

        // per-face
        let flags = scene.set_colors(&vec![Color3::new(0.0, 0.0, 1.0); 12]);
        assert!(!flags.is_empty());
        assert!(scene.face_based);
    }

    #[test]
    fn test_ambiguous_colors_are_ignored() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();
        let before = scene.v_diffuse.clone();

        let flags = scene.set_colors(&vec![Color3::new(1.0, 1.0, 1.0); 5]);
        assert!(flags.is_empty());
        assert_eq!(scene.v_diffuse, before);
    }

    #[test]
    fn test_material_derivation() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();
        scene.set_colors(&[Color3::new(0.8, 0.4, 0.0)]);

        let ambient = scene.v_ambient[0];
        let specular = scene.v_specular[0];
        assert_relative_eq!(ambient.x, 0.08, epsilon = 1e-6);
        assert_relative_eq!(specular.x, 0.3 + 0.1 * (0.8 - 0.3), epsilon = 1e-6);
        assert_relative_eq!(specular.z, 0.3 + 0.1 * (0.0 - 0.3), epsilon = 1e-6);
    }

    #[test]
    fn test_ambiguous_normals_are_ignored() {
        let mut scene = SceneData::new();
        scene.set_mesh(unit_cube()).unwrap();
        let before = scene.v_normals.clone();

        let flags = scene.set_normals(&vec![Vector3f::z(); 5]);
        assert!(flags.is_empty());
        assert_eq!(scene.v_normals, before);

        let flags = scene.set_normals(&vec![Vector3f::z(); 12]);
        assert_eq!(flags, DirtyFlags::NORMAL);
        assert!(scene.face_based);
    }

    #[test]
    fn test_degenerate_mesh_is_accepted() {
        let mut scene = SceneData::new();
        let flags = scene.set_mesh(TriangleMesh::new()).unwrap();
        assert_eq!(flags, DirtyFlags::all());
        assert!(scene.is_degenerate());
        assert_eq!(scene.pick_vertex(&Point3f::origin()), None);
    }
}
