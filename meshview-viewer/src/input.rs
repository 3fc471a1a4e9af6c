//! Pointer-event dispatch for the viewer
//!
//! A single state machine maps raw press/release/move events onto camera
//! drags or pick requests. The host delivers events in whatever order its
//! windowing layer produces them; the controller owns all gesture state.

use crate::camera::{DragAction, Trackball, Viewport};
use bitflags::bitflags;
use nalgebra::Vector2;

bitflags! {
    /// Keyboard modifiers accompanying a pointer event
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
    }
}

/// Pointer buttons in host-independent terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Discretized input events delivered by the host
#[derive(Debug, Clone, Copy)]
pub enum Event {
    Press {
        button: PointerButton,
        modifiers: Modifiers,
        pos: Vector2<f32>,
    },
    Release {
        button: PointerButton,
        pos: Vector2<f32>,
    },
    Motion {
        pos: Vector2<f32>,
    },
}

/// What a pick gesture targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickKind {
    Vertex,
    Face,
}

/// Gesture state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Rotating,
    Panning,
    Zooming,
    Picking(PickKind),
}

/// What a session supports, in place of a subclass chain
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Whether pick gestures are recognized at all
    pub picking: bool,
    /// Modifier that turns a press into a pick gesture
    pub pick_modifier: Modifiers,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            picking: true,
            pick_modifier: Modifiers::CTRL,
        }
    }
}

/// Outcome of feeding one event through the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Nothing to do
    None,
    /// The camera state changed; a redraw is due
    CameraChanged,
    /// A pick gesture completed at the given screen point
    PickRequested { kind: PickKind, pos: Vector2<f32> },
}

/// Maps pointer events onto camera drags and pick requests
#[derive(Debug)]
pub struct InputController {
    state: DragState,
    caps: Capabilities,
}

impl InputController {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            state: DragState::Idle,
            caps,
        }
    }

    /// Whether a drag or pick gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Feed one event through the state machine
    ///
    /// Camera drags are applied to `camera` directly; pick gestures are
    /// reported back so the session can resolve them against the scene.
    pub fn handle(&mut self, event: Event, camera: &mut Trackball, viewport: Viewport) -> Action {
        match event {
            Event::Press {
                button,
                modifiers,
                pos,
            } => {
                if self.caps.picking && modifiers.contains(self.caps.pick_modifier) {
                    // pick gestures bypass camera dragging entirely
                    self.state = DragState::Picking(match button {
                        PointerButton::Secondary => PickKind::Face,
                        _ => PickKind::Vertex,
                    });
                    return Action::None;
                }

                self.state = match button {
                    PointerButton::Primary => DragState::Rotating,
                    PointerButton::Middle => DragState::Panning,
                    PointerButton::Secondary => DragState::Zooming,
                };
                camera.begin_drag(pos, viewport);
                Action::None
            }

            Event::Motion { pos } => {
                let action = match self.state {
                    DragState::Idle | DragState::Picking(_) => return Action::None,
                    DragState::Rotating => DragAction::Rotate,
                    DragState::Panning => DragAction::Pan,
                    DragState::Zooming => DragAction::Zoom,
                };

                // out-of-bounds motion: no camera update, no anchor update
                if !viewport.contains(pos) {
                    return Action::None;
                }

                camera.drag(action, pos, viewport);
                Action::CameraChanged
            }

            Event::Release { pos, .. } => {
                let finished = self.state;
                self.state = DragState::Idle;
                match finished {
                    DragState::Picking(kind) => Action::PickRequested { kind, pos },
                    _ => Action::None,
                }
            }
        }
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}
