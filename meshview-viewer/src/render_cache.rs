//! Dirty-flag cache of GPU-ready draw batches
//!
//! Derived geometry is grouped by the attribute that feeds it; each group
//! moves CLEAN -> DIRTY on invalidation and back on rebuild. A batch is
//! rebuilt lazily, only when the current shading mode consumes it and one
//! of its source groups is dirty, and the swap is atomic: the old batch
//! stays visible until the new one is fully built.

use crate::scene::SceneData;
use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use log::debug;
use std::f32::consts::PI;

bitflags! {
    /// Attribute groups whose derived data can go stale
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u16 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const FACE = 1 << 2;
        const AMBIENT = 1 << 3;
        const DIFFUSE = 1 << 4;
        const SPECULAR = 1 << 5;
        const UV = 1 << 6;
        const TEXTURE = 1 << 7;
        const OVERLAY_SELECTION = 1 << 8;
    }
}

/// Shading mode selected by the host's panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    HiddenLine,
    WireFrame,
    SolidFlat,
    SolidSmooth,
}

/// Vertex data for mesh rendering: interleaved position/normal/color
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BatchVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// The cached batch variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Face normals, constant white; lighting comes from the pass
    FlatUncolored,
    /// Face normals with per-vertex (or per-face) diffuse colors
    FlatColored,
    /// Vertex normals with per-vertex diffuse colors
    SmoothColored,
    /// Marker spheres at the selected vertices
    SelectionMarkers,
}

impl BatchKind {
    const ALL: [BatchKind; 4] = [
        BatchKind::FlatUncolored,
        BatchKind::FlatColored,
        BatchKind::SmoothColored,
        BatchKind::SelectionMarkers,
    ];
}

/// A triangle list ready for the rasterizer
#[derive(Debug, Clone, Default)]
pub struct DrawBatch {
    pub vertices: Vec<BatchVertex>,
}

impl DrawBatch {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Dirty bookkeeping plus the batches themselves
///
/// Two levels of tracking: a global per-group mask answering the host's
/// "is group X dirty?" queries, and a per-batch mask, because one
/// attribute group may feed several batches and rebuilding the batch one
/// mode needs must not mark the others fresh.
pub struct RenderCache {
    dirty: DirtyFlags,
    pending: [DirtyFlags; 4],
    batches: [DrawBatch; 4],
}

impl RenderCache {
    /// A new cache starts fully dirty to force the first rebuild
    pub fn new() -> Self {
        Self {
            dirty: DirtyFlags::all(),
            pending: [DirtyFlags::all(); 4],
            batches: [
                DrawBatch::default(),
                DrawBatch::default(),
                DrawBatch::default(),
                DrawBatch::default(),
            ],
        }
    }

    /// Mark attribute groups stale
    pub fn invalidate(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
        for pending in &mut self.pending {
            *pending |= flags;
        }
    }

    /// Whether any of the given groups is dirty
    pub fn is_dirty(&self, flags: DirtyFlags) -> bool {
        self.dirty.intersects(flags)
    }

    /// The currently dirty groups
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Attribute groups a batch is derived from
    pub fn dependencies(kind: BatchKind) -> DirtyFlags {
        match kind {
            BatchKind::FlatUncolored => DirtyFlags::POSITION | DirtyFlags::FACE | DirtyFlags::NORMAL,
            BatchKind::FlatColored | BatchKind::SmoothColored => {
                DirtyFlags::POSITION
                    | DirtyFlags::FACE
                    | DirtyFlags::NORMAL
                    | DirtyFlags::AMBIENT
                    | DirtyFlags::DIFFUSE
                    | DirtyFlags::SPECULAR
            }
            BatchKind::SelectionMarkers => DirtyFlags::POSITION | DirtyFlags::OVERLAY_SELECTION,
        }
    }

    /// The mesh batch a shading mode draws from
    pub fn mode_batch(mode: ShadingMode) -> BatchKind {
        match mode {
            ShadingMode::HiddenLine | ShadingMode::WireFrame => BatchKind::FlatUncolored,
            ShadingMode::SolidFlat => BatchKind::FlatColored,
            ShadingMode::SolidSmooth => BatchKind::SmoothColored,
        }
    }

    /// Rebuild exactly the stale batches the given mode consumes
    ///
    /// Clears the groups the mode depends on; groups only other modes
    /// consume stay dirty until a frame in such a mode. UV and TEXTURE
    /// feed no batch (the scene regenerates those tables eagerly on set),
    /// so a frame leaves them clean as well.
    pub fn ensure(&mut self, scene: &SceneData, mode: ShadingMode) {
        let mesh_batch = Self::mode_batch(mode);
        self.ensure_batch(scene, mesh_batch);
        self.ensure_batch(scene, BatchKind::SelectionMarkers);

        self.dirty.remove(
            Self::dependencies(mesh_batch)
                | Self::dependencies(BatchKind::SelectionMarkers)
                | DirtyFlags::UV
                | DirtyFlags::TEXTURE,
        );
    }

    fn ensure_batch(&mut self, scene: &SceneData, kind: BatchKind) {
        let slot = index_of(kind);
        if !self.pending[slot].intersects(Self::dependencies(kind)) {
            return;
        }

        let rebuilt = build_batch(scene, kind);
        debug!("rebuilt {:?} batch: {} vertices", kind, rebuilt.vertices.len());
        self.batches[slot] = rebuilt;
        self.pending[slot] = DirtyFlags::empty();
    }

    /// Access a batch; callers go through [`RenderCache::ensure`] first
    pub fn batch(&self, kind: BatchKind) -> &DrawBatch {
        &self.batches[index_of(kind)]
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}

fn index_of(kind: BatchKind) -> usize {
    BatchKind::ALL
        .iter()
        .position(|&k| k == kind)
        .unwrap_or(0)
}

fn build_batch(scene: &SceneData, kind: BatchKind) -> DrawBatch {
    match kind {
        BatchKind::FlatUncolored => build_mesh_batch(scene, false, false),
        BatchKind::FlatColored => build_mesh_batch(scene, false, true),
        BatchKind::SmoothColored => build_mesh_batch(scene, true, true),
        BatchKind::SelectionMarkers => build_selection_markers(scene),
    }
}

fn build_mesh_batch(scene: &SceneData, smooth: bool, colored: bool) -> DrawBatch {
    let mut vertices = Vec::with_capacity(scene.mesh.face_count() * 3);

    for (fi, face) in scene.mesh.faces.iter().enumerate() {
        let face_normal = scene
            .f_normals
            .get(fi)
            .map(|n| [n.x, n.y, n.z])
            .unwrap_or([0.0, 0.0, 1.0]);

        for &iv in face {
            let p = scene.mesh.vertices[iv];
            let normal = if smooth {
                scene
                    .v_normals
                    .get(iv)
                    .map(|n| [n.x, n.y, n.z])
                    .unwrap_or(face_normal)
            } else {
                face_normal
            };
            let color = if colored {
                corner_color(scene, fi, iv)
            } else {
                [1.0, 1.0, 1.0]
            };

            vertices.push(BatchVertex {
                position: [p.x, p.y, p.z],
                normal,
                color,
            });
        }
    }

    DrawBatch { vertices }
}

fn corner_color(scene: &SceneData, face: usize, vertex: usize) -> [f32; 3] {
    let c = if scene.face_based {
        scene.f_diffuse.get(face)
    } else {
        scene.v_diffuse.get(vertex)
    };
    c.map(|c| [c.x, c.y, c.z]).unwrap_or([0.8, 0.8, 0.8])
}

const MARKER_COLOR: [f32; 3] = [0.8, 0.0, 0.0];
const MARKER_SUBDIVISIONS: usize = 15;

fn build_selection_markers(scene: &SceneData) -> DrawBatch {
    let selected = scene.selection().vertices();
    if selected.is_empty() || scene.mesh.vertices.is_empty() {
        return DrawBatch::default();
    }

    let radius = scene.marker_radius();
    let sphere = unit_sphere(MARKER_SUBDIVISIONS, MARKER_SUBDIVISIONS);
    let mut vertices = Vec::with_capacity(selected.len() * sphere.len());

    for &index in selected {
        let Some(center) = scene.mesh.vertices.get(index) else {
            continue;
        };
        for &(dir, normal) in &sphere {
            vertices.push(BatchVertex {
                position: [
                    center.x + radius * dir[0],
                    center.y + radius * dir[1],
                    center.z + radius * dir[2],
                ],
                normal,
                color: MARKER_COLOR,
            });
        }
    }

    DrawBatch { vertices }
}

/// Fallback geometry for a degenerate scene: a small sphere at the origin,
/// drawn until a mesh with actual faces is loaded
pub(crate) fn placeholder_batch() -> DrawBatch {
    let vertices = unit_sphere(MARKER_SUBDIVISIONS, MARKER_SUBDIVISIONS)
        .into_iter()
        .map(|(dir, normal)| BatchVertex {
            position: [0.5 * dir[0], 0.5 * dir[1], 0.5 * dir[2]],
            normal,
            color: [0.8, 0.8, 0.8],
        })
        .collect();
    DrawBatch { vertices }
}

/// Triangulated unit sphere as `(position, normal)` pairs
///
/// Positions double as normals on a unit sphere, so the pairs coincide;
/// they are kept separate for clarity at the call site.
fn unit_sphere(stacks: usize, slices: usize) -> Vec<([f32; 3], [f32; 3])> {
    let point = |i: usize, j: usize| -> [f32; 3] {
        let theta = PI * i as f32 / stacks as f32;
        let phi = 2.0 * PI * j as f32 / slices as f32;
        [
            theta.sin() * phi.cos(),
            theta.cos(),
            theta.sin() * phi.sin(),
        ]
    };

    let mut triangles = Vec::with_capacity(stacks * slices * 6);
    for i in 0..stacks {
        for j in 0..slices {
            let quad = [
                point(i, j),
                point(i + 1, j),
                point(i + 1, j + 1),
                point(i, j + 1),
            ];
            for &corner in &[quad[0], quad[1], quad[2], quad[0], quad[2], quad[3]] {
                triangles.push((corner, corner));
            }
        }
    }
    triangles
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::{Color3, Point3f, TriangleMesh};

    fn triangle_scene() -> SceneData {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2]]).unwrap();
        let mut scene = SceneData::new();
        scene.set_mesh(mesh).unwrap();
        scene
    }

    #[test]
    fn test_new_cache_is_fully_dirty() {
        let cache = RenderCache::new();
        assert_eq!(cache.dirty(), DirtyFlags::all());
    }

    #[test]
    fn test_ensure_clears_only_consumed_batches() {
        let scene = triangle_scene();
        let mut cache = RenderCache::new();

        cache.ensure(&scene, ShadingMode::HiddenLine);
        // the flat-uncolored batch is clean now
        assert_eq!(cache.batch(BatchKind::FlatUncolored).vertices.len(), 3);
        // the colored batches have not been built and stay dirty
        assert!(cache.is_dirty(DirtyFlags::DIFFUSE));
        assert!(cache.batch(BatchKind::SmoothColored).is_empty());
    }

    #[test]
    fn test_color_change_leaves_geometry_clean() {
        let mut scene = triangle_scene();
        let mut cache = RenderCache::new();
        cache.ensure(&scene, ShadingMode::SolidSmooth);
        cache.ensure(&scene, ShadingMode::SolidFlat);
        cache.ensure(&scene, ShadingMode::HiddenLine);
        assert_eq!(cache.dirty(), DirtyFlags::empty());

        let flags = scene.set_colors(&[Color3::new(1.0, 0.0, 0.0)]);
        cache.invalidate(flags);

        assert!(cache.is_dirty(DirtyFlags::DIFFUSE));
        assert!(cache.is_dirty(DirtyFlags::AMBIENT));
        assert!(cache.is_dirty(DirtyFlags::SPECULAR));
        assert!(!cache.is_dirty(DirtyFlags::POSITION));
        assert!(!cache.is_dirty(DirtyFlags::NORMAL));
    }

    #[test]
    fn test_color_invalidation_rebuilds_colored_batch() {
        let mut scene = triangle_scene();
        let mut cache = RenderCache::new();
        cache.ensure(&scene, ShadingMode::SolidFlat);
        let before = cache.batch(BatchKind::FlatColored).vertices[0].color;

        let flags = scene.set_colors(&[Color3::new(1.0, 0.0, 0.0)]);
        cache.invalidate(flags);
        cache.ensure(&scene, ShadingMode::SolidFlat);
        let after = cache.batch(BatchKind::FlatColored).vertices[0].color;

        assert_ne!(before, after);
        assert_eq!(after, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_color_invalidation_skips_uncolored_batch() {
        let mut scene = triangle_scene();
        let mut cache = RenderCache::new();
        cache.ensure(&scene, ShadingMode::HiddenLine);

        let flags = scene.set_colors(&[Color3::new(1.0, 0.0, 0.0)]);
        cache.invalidate(flags);
        cache.ensure(&scene, ShadingMode::HiddenLine);

        // the uncolored batch does not depend on color groups
        assert!(!cache.is_dirty(DirtyFlags::POSITION));
        assert_eq!(cache.batch(BatchKind::FlatUncolored).vertices[0].color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_selection_markers_follow_selection() {
        let mut scene = triangle_scene();
        let mut cache = RenderCache::new();

        cache.ensure(&scene, ShadingMode::SolidFlat);
        assert!(cache.batch(BatchKind::SelectionMarkers).is_empty());

        scene.pick_vertex(&Point3f::new(0.0, 0.0, 0.0)).unwrap();
        cache.invalidate(DirtyFlags::OVERLAY_SELECTION);
        cache.ensure(&scene, ShadingMode::SolidFlat);

        let markers = cache.batch(BatchKind::SelectionMarkers);
        assert!(!markers.is_empty());
        assert_eq!(markers.vertices[0].color, MARKER_COLOR);
        // one sphere's worth of triangles
        assert_eq!(
            markers.vertices.len(),
            MARKER_SUBDIVISIONS * MARKER_SUBDIVISIONS * 6
        );
    }

    #[test]
    fn test_smooth_and_flat_normals_differ_on_cube() {
        let mut scene = SceneData::new();
        scene.set_mesh(crate::scene::unit_cube()).unwrap();
        let mut cache = RenderCache::new();
        cache.ensure(&scene, ShadingMode::SolidFlat);
        cache.ensure(&scene, ShadingMode::SolidSmooth);

        let flat = cache.batch(BatchKind::FlatColored);
        let smooth = cache.batch(BatchKind::SmoothColored);
        assert_eq!(flat.vertices.len(), 36);
        assert_eq!(smooth.vertices.len(), 36);
        // a cube corner's averaged normal cannot equal the face normal
        assert_ne!(flat.vertices[0].normal, smooth.vertices[0].normal);
    }
}
