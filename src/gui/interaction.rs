//! Pointer state machine for the canvas: idle, panning, or dragging a node.
//!
//! The machine only decides what an input means. It never touches the store;
//! [`GraphView`](super::graph_view::GraphView) applies the returned [`Effect`].

use std::time::{Duration, Instant};

use egui::{Pos2, Vec2};

use crate::graph_utils::graph::SimId;
use super::viewport::Viewport;

// A press/release on a node counts as a click only under both limits
pub const CLICK_MAX_DURATION: Duration = Duration::from_millis(200);
pub const CLICK_MAX_DISTANCE: f32 = 5.0;

pub const WHEEL_ZOOM_IN: f32 = 1.1;
pub const WHEEL_ZOOM_OUT: f32 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDrag {
    pub sim_id: SimId,
    // Pointer position minus the node's scaled model position
    pub anchor: Vec2,
    pub pressed_at: Instant,
    pub press_pos: Pos2,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    Panning {
        // Pointer position minus the viewport offset at press time
        anchor: Vec2,
    },
    DraggingNode(NodeDrag),
}

/// What the view has to do after an input event.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    None,
    // Offset changed; needs a full render
    ViewportMoved,
    // Write the new model position and schedule the incremental path
    NodeMoved { sim_id: SimId, pos: Pos2 },
    PanEnded,
    // Resync with a full render; `clicked` carries a selection click
    DragEnded { clicked: Option<SimId> },
}

#[derive(Debug, Default)]
pub struct Interaction {
    state: InteractionState,
}

impl Interaction {
    pub fn is_idle(&self) -> bool { matches!(self.state, InteractionState::Idle) }
    pub fn is_panning(&self) -> bool { matches!(self.state, InteractionState::Panning { .. }) }

    pub fn dragged_sim(&self) -> Option<&str> {
        match &self.state {
            InteractionState::DraggingNode(drag) => Some(drag.sim_id.as_str()),
            _ => None,
        }
    }

    /// `hit` is the node under the pointer with its model position, if any.
    pub fn pointer_down(
        &mut self,
        pos: Pos2,
        button: PointerButton,
        hit: Option<(SimId, Pos2)>,
        viewport: &Viewport,
        at: Instant,
    ) -> Effect {
        if !self.is_idle() {
            return Effect::None;
        }
        match (button, hit) {
            (PointerButton::Middle, _) | (PointerButton::Primary, None) => {
                self.state = InteractionState::Panning { anchor: pos.to_vec2() - viewport.offset };
            }
            (PointerButton::Primary, Some((sim_id, sim_pos))) => {
                let anchor = pos.to_vec2() - sim_pos.to_vec2() * viewport.scale();
                self.state = InteractionState::DraggingNode(NodeDrag {
                    sim_id,
                    anchor,
                    pressed_at: at,
                    press_pos: pos,
                });
            }
            (PointerButton::Secondary, _) => {}
        }
        Effect::None
    }

    pub fn pointer_move(&mut self, pos: Pos2, viewport: &mut Viewport) -> Effect {
        match &self.state {
            InteractionState::Idle => Effect::None,
            InteractionState::Panning { anchor } => {
                viewport.offset = pos.to_vec2() - *anchor;
                Effect::ViewportMoved
            }
            InteractionState::DraggingNode(drag) => {
                let model = (pos.to_vec2() - drag.anchor) / viewport.scale();
                Effect::NodeMoved { sim_id: drag.sim_id.clone(), pos: model.to_pos2() }
            }
        }
    }

    /// `hit` is the node under the pointer at release time.
    pub fn pointer_up(&mut self, pos: Pos2, hit: Option<&str>, at: Instant) -> Effect {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => Effect::None,
            InteractionState::Panning { .. } => Effect::PanEnded,
            InteractionState::DraggingNode(drag) => {
                let quick = at.saturating_duration_since(drag.pressed_at) < CLICK_MAX_DURATION;
                let still = (pos - drag.press_pos).length() < CLICK_MAX_DISTANCE;
                let clicked = (quick && still && hit == Some(drag.sim_id.as_str())).then_some(drag.sim_id);
                Effect::DragEnded { clicked }
            }
        }
    }
}

// DOM wheel convention: positive delta scrolls down and zooms out
pub fn wheel_factor(delta_y: f32) -> Option<f32> {
    if delta_y > 0.0 {
        Some(WHEEL_ZOOM_OUT)
    } else if delta_y < 0.0 {
        Some(WHEEL_ZOOM_IN)
    } else {
        None
    }
}
