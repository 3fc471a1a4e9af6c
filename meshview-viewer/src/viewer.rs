//! The viewer session
//!
//! `Viewer` is the single owned object a host passes to every callback:
//! it ties the scene data, render cache, trackball camera, and input
//! controller together and turns a frame tick into an ordered list of
//! draw passes. There is no process-wide current-viewer state.

use crate::camera::{Trackball, Viewport};
use crate::input::{Action, Capabilities, Event, InputController};
use crate::render_cache::{
    placeholder_batch, BatchKind, DirtyFlags, DrawBatch, RenderCache, ShadingMode,
};
use crate::scene::SceneData;
use crate::selection::SelectionSet;
use log::debug;
use meshview_core::{Color3, Point3f, Result, TriangleMesh, Vector3f};
use nalgebra::Matrix4;
use std::path::Path;

/// Window clear color; the hidden-line fill pass paints front faces with
/// it so hidden edges vanish into the background
pub const BACKGROUND_COLOR: [f32; 3] = [0.298, 0.298, 0.502];
const WIRE_COLOR: [f32; 3] = [0.7, 0.7, 0.7];

/// Polygon rasterization mode for a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

/// Fixed-function state a pass runs under
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStyle {
    pub lighting: bool,
    pub polygon_mode: PolygonMode,
    pub depth_range: [f32; 2],
    pub polygon_offset: bool,
    /// Draw everything in this color instead of the batch colors
    pub color_override: Option<[f32; 3]>,
}

impl PassStyle {
    fn lit() -> Self {
        Self {
            lighting: true,
            polygon_mode: PolygonMode::Fill,
            depth_range: [0.0, 1.0],
            polygon_offset: false,
            color_override: None,
        }
    }

    fn unlit(color: [f32; 3]) -> Self {
        Self {
            lighting: false,
            polygon_mode: PolygonMode::Fill,
            depth_range: [0.0, 1.0],
            polygon_offset: false,
            color_override: Some(color),
        }
    }
}

/// One batch drawn under one style
#[derive(Debug)]
pub struct DrawPass<'a> {
    pub batch: &'a DrawBatch,
    pub style: PassStyle,
}

/// Everything the rasterizer needs for one frame
#[derive(Debug)]
pub struct Frame<'a> {
    pub projection: Matrix4<f32>,
    pub modelview: Matrix4<f32>,
    pub mode: ShadingMode,
    pub passes: Vec<DrawPass<'a>>,
}

/// Backend that turns frames into pixels; implemented by the host
pub trait Rasterizer {
    fn draw(&mut self, frame: &Frame<'_>);
}

/// An interactive mesh viewing session
pub struct Viewer {
    scene: SceneData,
    cache: RenderCache,
    camera: Trackball,
    input: InputController,
    mode: ShadingMode,
    placeholder: DrawBatch,
}

impl Viewer {
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    pub fn with_capabilities(caps: Capabilities) -> Self {
        Self {
            scene: SceneData::new(),
            cache: RenderCache::new(),
            camera: Trackball::new(),
            input: InputController::new(caps),
            mode: ShadingMode::SolidFlat,
            placeholder: placeholder_batch(),
        }
    }

    /// Load a mesh from a file and frame the camera on it
    ///
    /// On any load error the previous mesh and camera state are kept.
    pub fn open_mesh<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let mesh = meshview_io::read_mesh(path.as_ref())?;
        debug!(
            "opened {}: {} vertices, {} faces",
            path.as_ref().display(),
            mesh.vertex_count(),
            mesh.face_count()
        );
        self.set_mesh(mesh)
    }

    /// Save the current mesh geometry to a file
    pub fn save_mesh<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        meshview_io::write_mesh(&self.scene.mesh, path)
    }

    /// Replace the mesh, rebuild all derived state, and re-center the view
    pub fn set_mesh(&mut self, mesh: TriangleMesh) -> Result<()> {
        let flags = self.scene.set_mesh(mesh)?;
        self.cache.invalidate(flags);

        if self.scene.is_degenerate() {
            self.camera.set_scene(Point3f::origin(), 1.0);
        } else {
            let (center, radius) = self.scene.mesh.bounding_sphere();
            self.camera.set_scene(center, radius);
        }
        Ok(())
    }

    /// Replace normals; an ambiguous shape is logged and ignored
    pub fn set_normals(&mut self, normals: &[Vector3f]) {
        let flags = self.scene.set_normals(normals);
        self.cache.invalidate(flags);
    }

    /// Replace diffuse colors; ambient and specular are derived
    pub fn set_colors(&mut self, colors: &[Color3]) {
        let flags = self.scene.set_colors(colors);
        self.cache.invalidate(flags);
    }

    /// Set per-vertex UV coordinates
    pub fn set_uv(&mut self, uv: &[[f32; 2]]) {
        let flags = self.scene.set_uv(uv);
        self.cache.invalidate(flags);
    }

    /// Set UV coordinates with their own face topology
    pub fn set_uv_indexed(&mut self, uv: &[[f32; 2]], uv_faces: &[[usize; 3]]) {
        let flags = self.scene.set_uv_indexed(uv, uv_faces);
        self.cache.invalidate(flags);
    }

    /// Replace the texture channel planes
    pub fn set_texture(&mut self, width: usize, height: usize, r: Vec<u8>, g: Vec<u8>, b: Vec<u8>) {
        let flags = self.scene.set_texture(width, height, r, g, b);
        self.cache.invalidate(flags);
    }

    /// Feed a pointer event through the input controller
    ///
    /// A returned [`Action::PickRequested`] carries the 2D point; the host
    /// unprojects it (see [`Trackball::unproject`]) with its depth source
    /// of choice and completes the pick via [`Viewer::pick_vertex`] or
    /// [`Viewer::pick_face`].
    pub fn handle_event(&mut self, event: Event, viewport: Viewport) -> Action {
        self.input.handle(event, &mut self.camera, viewport)
    }

    /// Toggle the vertex nearest to a world-space point
    pub fn pick_vertex(&mut self, point: &Point3f) -> Option<usize> {
        let picked = self.scene.pick_vertex(point);
        if picked.is_some() {
            self.cache.invalidate(DirtyFlags::OVERLAY_SELECTION);
        }
        picked
    }

    /// Toggle the face whose centroid is nearest to a world-space point
    pub fn pick_face(&mut self, point: &Point3f) -> Option<usize> {
        let picked = self.scene.pick_face(point);
        if picked.is_some() {
            self.cache.invalidate(DirtyFlags::OVERLAY_SELECTION);
        }
        picked
    }

    /// Drop the whole selection
    pub fn clear_selection(&mut self) {
        let flags = self.scene.clear_selection();
        self.cache.invalidate(flags);
    }

    pub fn selection(&self) -> &SelectionSet {
        self.scene.selection()
    }

    pub fn shading_mode(&self) -> ShadingMode {
        self.mode
    }

    pub fn set_shading_mode(&mut self, mode: ShadingMode) {
        self.mode = mode;
    }

    pub fn camera(&self) -> &Trackball {
        &self.camera
    }

    pub fn scene(&self) -> &SceneData {
        &self.scene
    }

    /// Whether any attribute group is pending a rebuild
    pub fn is_dirty(&self, flags: DirtyFlags) -> bool {
        self.cache.is_dirty(flags)
    }

    /// Produce the draw passes for one frame
    ///
    /// Rebuilds exactly the stale batches the current shading mode needs,
    /// then assembles the pass list; a degenerate scene yields a single
    /// placeholder pass.
    pub fn render(&mut self, viewport: Viewport) -> Frame<'_> {
        let (projection, modelview) = self.camera.apply(viewport);

        if self.scene.is_degenerate() {
            return Frame {
                projection,
                modelview,
                mode: self.mode,
                passes: vec![DrawPass {
                    batch: &self.placeholder,
                    style: PassStyle::lit(),
                }],
            };
        }

        self.cache.ensure(&self.scene, self.mode);

        let mesh_batch = self.cache.batch(RenderCache::mode_batch(self.mode));
        let mut passes = match self.mode {
            ShadingMode::HiddenLine => vec![
                DrawPass {
                    batch: mesh_batch,
                    style: PassStyle {
                        depth_range: [0.01, 1.0],
                        ..PassStyle::unlit(BACKGROUND_COLOR)
                    },
                },
                DrawPass {
                    batch: mesh_batch,
                    style: PassStyle {
                        polygon_mode: PolygonMode::Line,
                        ..PassStyle::unlit(WIRE_COLOR)
                    },
                },
            ],
            ShadingMode::WireFrame => vec![
                DrawPass {
                    batch: mesh_batch,
                    style: PassStyle {
                        polygon_offset: true,
                        ..PassStyle::lit()
                    },
                },
                DrawPass {
                    batch: mesh_batch,
                    style: PassStyle {
                        polygon_mode: PolygonMode::Line,
                        ..PassStyle::unlit(WIRE_COLOR)
                    },
                },
            ],
            ShadingMode::SolidFlat | ShadingMode::SolidSmooth => vec![DrawPass {
                batch: mesh_batch,
                style: PassStyle::lit(),
            }],
        };

        let markers = self.cache.batch(BatchKind::SelectionMarkers);
        if !markers.is_empty() {
            passes.push(DrawPass {
                batch: markers,
                style: PassStyle::lit(),
            });
        }

        Frame {
            projection,
            modelview,
            mode: self.mode,
            passes,
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}
