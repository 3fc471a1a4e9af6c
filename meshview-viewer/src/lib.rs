//! Interactive viewing core for meshview
//!
//! This crate ties the mesh data structures to an interactive session: a
//! virtual-trackball camera, a pointer-event state machine, vertex/face
//! picking over a spatial index, and a dirty-flag cache of GPU-ready draw
//! batches. The windowing host forwards raw input events and consumes the
//! frames this crate produces; it owns no viewer state of its own.

pub mod camera;
pub mod input;
pub mod render_cache;
pub mod scene;
pub mod selection;
pub mod viewer;

pub use camera::{DragAction, Trackball, Viewport};
pub use input::{
    Action, Capabilities, Event, InputController, Modifiers, PickKind, PointerButton,
};
pub use render_cache::{BatchKind, BatchVertex, DirtyFlags, DrawBatch, RenderCache, ShadingMode};
pub use scene::{SceneData, Texture};
pub use selection::SelectionSet;
pub use viewer::{DrawPass, Frame, PassStyle, PolygonMode, Rasterizer, Viewer, BACKGROUND_COLOR};
