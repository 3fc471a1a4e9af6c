//! Virtual-trackball camera
//!
//! Drag gestures are mapped onto a unit sphere; each motion step composes
//! a fresh axis/angle rotation in front of the accumulated rotation, so
//! the matrix never drifts beyond one incremental product per step.

use meshview_core::{Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3, Rotation3, Unit, Vector2, Vector4};
use std::f32::consts::{FRAC_PI_4, PI};

/// Viewport dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Whether a point lies inside the viewport rectangle
    pub fn contains(&self, p: Vector2<f32>) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

/// Which camera motion a drag step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    Rotate,
    Pan,
    Zoom,
}

/// Trackball camera state
///
/// The camera frames a scene given by its bounding sphere; the eye sits at
/// three radii along the view axis. Pan and zoom accumulate into a
/// translation offset (zoom is a dolly along the view axis, not a scale).
#[derive(Debug, Clone)]
pub struct Trackball {
    center: Point3f,
    radius: f32,
    trans: Vector3f,
    rotation: Matrix4<f32>,

    near: f32,
    far: f32,
    fovy: f32,

    last_point_2d: Vector2<f32>,
    last_point_3d: Vector3f,
}

impl Trackball {
    pub fn new() -> Self {
        let radius = 1.0;
        Self {
            center: Point3f::origin(),
            radius,
            trans: Vector3f::zeros(),
            rotation: Matrix4::identity(),
            near: 0.01 * radius,
            far: 10.0 * radius,
            fovy: FRAC_PI_4,
            last_point_2d: Vector2::zeros(),
            last_point_3d: Vector3f::zeros(),
        }
    }

    /// Re-center the view on a new bounding sphere
    ///
    /// The accumulated rotation is preserved; the translation offset is
    /// rescaled by the radius ratio so the framing stays proportionally
    /// identical. Near and far planes follow the new radius. Idempotent
    /// for repeated calls with the same arguments.
    pub fn set_scene(&mut self, center: Point3f, radius: f32) {
        let radius = radius.max(1.0e-6);

        self.trans *= radius / self.radius;
        self.center = center;
        self.radius = radius;

        self.near = 0.01 * radius;
        self.far = 10.0 * radius;
    }

    /// Project a screen point onto the virtual trackball sphere
    ///
    /// Screen coordinates are normalized to roughly `[-1, 1]` around the
    /// viewport center, then bent through a sine so sensitivity stays
    /// uniform out to the rim. A point outside the unit disc lands on the
    /// sphere's equator (z = 0) rather than being projected outward.
    pub fn map_to_sphere(&self, p: Vector2<f32>, viewport: Viewport) -> Vector3f {
        let x = (p.x - 0.5 * viewport.width) / viewport.width;
        let y = (0.5 * viewport.height - p.y) / viewport.height;
        let sinx = (PI * x * 0.5).sin();
        let siny = (PI * y * 0.5).sin();
        let sinx2siny2 = sinx * sinx + siny * siny;

        Vector3f::new(
            sinx,
            siny,
            if sinx2siny2 < 1.0 {
                (1.0 - sinx2siny2).sqrt()
            } else {
                0.0
            },
        )
    }

    /// Record the drag anchor for subsequent [`Trackball::drag`] steps
    pub fn begin_drag(&mut self, p: Vector2<f32>, viewport: Viewport) {
        self.last_point_2d = p;
        self.last_point_3d = self.map_to_sphere(p, viewport);
    }

    /// Perform one drag step relative to the last recorded point
    ///
    /// The recorded point is always refreshed afterwards, so every call is
    /// relative to the previous one.
    pub fn drag(&mut self, action: DragAction, p: Vector2<f32>, viewport: Viewport) {
        match action {
            DragAction::Rotate => self.rotate_step(p, viewport),
            DragAction::Pan => self.pan_step(p, viewport),
            DragAction::Zoom => self.zoom_step(p, viewport),
        }

        self.last_point_2d = p;
        self.last_point_3d = self.map_to_sphere(p, viewport);
    }

    fn rotate_step(&mut self, p: Vector2<f32>, viewport: Viewport) {
        let new_point_3d = self.map_to_sphere(p, viewport);

        let axis = self.last_point_3d.cross(&new_point_3d);
        let cos_angle = self.last_point_3d.dot(&new_point_3d);

        // no rotation axis is defined at |dot| >= 1; skip to avoid NaN
        if cos_angle.abs() < 1.0 {
            if let Some(axis) = Unit::try_new(axis, 1.0e-10) {
                let angle = 3.0 * cos_angle.acos();
                let incremental = Rotation3::from_axis_angle(&axis, angle).to_homogeneous();
                // incremental rotation acts in the current camera frame,
                // so it composes in front of the accumulated rotation
                self.rotation = incremental * self.rotation;
            }
        }
    }

    fn pan_step(&mut self, p: Vector2<f32>, viewport: Viewport) {
        // world units per pixel at the scene's depth
        let z = -self.trans.z + 3.0 * self.radius;
        let up = 2.0 * (self.fovy * 0.5).tan() * z;
        let ratio = up / viewport.height;

        let dx = (p.x - self.last_point_2d.x) * ratio;
        let dy = (self.last_point_2d.y - p.y) * ratio;

        self.trans.x += dx;
        self.trans.y += dy;
    }

    fn zoom_step(&mut self, p: Vector2<f32>, viewport: Viewport) {
        let dy = 2.0 * (p.y - self.last_point_2d.y);
        self.trans.z += 3.0 * self.radius * dy / viewport.height;
    }

    /// Current projection matrix for the given viewport
    pub fn projection_matrix(&self, viewport: Viewport) -> Matrix4<f32> {
        Perspective3::new(viewport.aspect(), self.fovy, self.near, self.far).into_inner()
    }

    /// Current modelview matrix
    ///
    /// Composition order: back the eye off by three radii, apply the pan/
    /// dolly offset, apply the accumulated rotation, then move the scene
    /// center to the origin.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3f::new(0.0, 0.0, -3.0 * self.radius))
            * Matrix4::new_translation(&self.trans)
            * self.rotation
            * Matrix4::new_translation(&(-self.center.coords))
    }

    /// Materialize `(projection, modelview)` for a frame
    ///
    /// Recomputed from state on every call; deliberately uncached.
    pub fn apply(&self, viewport: Viewport) -> (Matrix4<f32>, Matrix4<f32>) {
        (self.projection_matrix(viewport), self.view_matrix())
    }

    /// Map a screen point at the given NDC depth (`0` = near plane, `1` =
    /// far plane) back to world space
    pub fn unproject(&self, p: Vector2<f32>, depth: f32, viewport: Viewport) -> Option<Point3f> {
        let inverse = (self.projection_matrix(viewport) * self.view_matrix()).try_inverse()?;

        let ndc = Vector4::new(
            2.0 * p.x / viewport.width - 1.0,
            1.0 - 2.0 * p.y / viewport.height,
            2.0 * depth - 1.0,
            1.0,
        );
        let world = inverse * ndc;
        if world.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(Point3f::new(
            world.x / world.w,
            world.y / world.w,
            world.z / world.w,
        ))
    }

    pub fn center(&self) -> Point3f {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn translation(&self) -> Vector3f {
        self.trans
    }

    pub fn rotation(&self) -> &Matrix4<f32> {
        &self.rotation
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn fovy(&self) -> f32 {
        self.fovy
    }
}

impl Default for Trackball {
    fn default() -> Self {
        Self::new()
    }
}
