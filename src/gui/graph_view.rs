use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use egui::{Pos2, Rect};
use log::{debug, info};

use crate::graph_utils::graph::{FamilyGraph, Relationship, Sim, SimFields, SimId};
use crate::graph_utils::layout;
use crate::graph_utils::snapshot::Snapshot;
use super::interaction::{self, Effect, Interaction, PointerButton};
use super::render::{FrameScheduler, NODE_SIZE, RenderStats, Renderer, Scene};
use super::viewport::Viewport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    SimSelected(SimId),
}

/// The family canvas: store, viewport, selection and pointer handling.
///
/// Every mutation goes through the methods below. Each one ends in a full
/// render except node drags, which take the incremental path on the next
/// display refresh ([`GraphView::on_frame`]).
#[derive(Debug)]
pub struct GraphView {
    graph: FamilyGraph,
    viewport: Viewport,
    selected: Option<SimId>,
    interaction: Interaction,
    renderer: Renderer,
    frame: FrameScheduler,
    // Screen rect of the canvas; the zoom pivots around its center
    canvas: Rect,
    subscribers: Vec<Sender<ViewEvent>>,
}

impl Default for GraphView {
    fn default() -> Self { Self::new() }
}

impl GraphView {
    pub fn new() -> Self {
        let mut view = Self {
            graph: FamilyGraph::new(),
            viewport: Viewport::default(),
            selected: None,
            interaction: Interaction::default(),
            renderer: Renderer::default(),
            frame: FrameScheduler::default(),
            canvas: Rect::from_min_max(Pos2::ZERO, Pos2::ZERO),
            subscribers: Vec::new(),
        };
        view.render();
        view
    }

    pub fn from_snapshot(snapshot: Snapshot, viewport: Viewport) -> Self {
        let mut view = Self::new();
        view.viewport = viewport;
        view.import_snapshot(snapshot);
        view
    }

    // --- store operations ---

    pub fn add_sim(&mut self, fields: SimFields) -> Option<SimId> {
        let id = self.graph.add_sim(fields);
        match &id {
            Some(id) => debug!("added sim {}", id),
            None => debug!("ignored sim without a name"),
        }
        self.render();
        id
    }

    pub fn update_sim(&mut self, id: &str, fields: SimFields) {
        self.graph.update_sim(id, fields);
        self.render();
    }

    pub fn delete_sim(&mut self, id: &str) {
        if self.graph.remove_sim(id) {
            debug!("deleted sim {} and its relationships", id);
            if self.selected.as_deref() == Some(id) {
                self.selected = None;
            }
        }
        self.render();
    }

    pub fn add_relationship(&mut self, rel: Relationship) {
        if self.graph.add_relationship(rel.clone()) {
            self.render();
        } else {
            debug!("ignored duplicate {} relationship {} <-> {}", rel.kind, rel.from, rel.to);
        }
    }

    pub fn get_sim(&self, id: &str) -> Option<&Sim> { self.graph.get_sim(id) }
    pub fn all_sims(&self) -> Vec<Sim> { self.graph.all_sims() }
    pub fn relationships(&self) -> &[Relationship] { self.graph.relationships() }
    pub fn relationships_for(&self, id: &str) -> Vec<Relationship> { self.graph.relationships_for(id) }
    pub fn graph(&self) -> &FamilyGraph { &self.graph }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.selected = None;
        self.frame.cancel();
        self.render();
    }

    pub fn export_snapshot(&self) -> Snapshot { Snapshot::capture(&self.graph) }

    pub fn import_snapshot(&mut self, snapshot: Snapshot) {
        self.clear();
        let (sims, rels) = (snapshot.sims.len(), snapshot.relationships.len());
        snapshot.restore_into(&mut self.graph);
        info!("imported {} sims and {} relationships", sims, rels);
        self.render();
    }

    pub fn auto_layout(&mut self) {
        let placed = layout::apply_layout(&mut self.graph);
        debug!("layout placed {} of {} sims", placed, self.graph.sim_count());
        self.render();
    }

    // --- selection ---

    pub fn selected(&self) -> Option<&str> { self.selected.as_deref() }

    pub fn select(&mut self, id: &str) {
        self.selected = Some(id.to_string());
        self.render();
        // Drop subscribers whose receiver is gone
        self.subscribers.retain(|tx| tx.send(ViewEvent::SimSelected(id.to_string())).is_ok());
    }

    pub fn subscribe(&mut self) -> Receiver<ViewEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    // --- viewport ---

    pub fn viewport(&self) -> &Viewport { &self.viewport }

    pub fn zoom(&mut self, factor: f32) {
        self.viewport.zoom_by(factor);
        self.render();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.render();
    }

    pub fn set_canvas_rect(&mut self, rect: Rect) { self.canvas = rect; }

    pub fn to_screen(&self, model: Pos2) -> Pos2 { self.viewport.to_screen(model, self.canvas.center()) }
    pub fn from_screen(&self, screen: Pos2) -> Pos2 { self.viewport.from_screen(screen, self.canvas.center()) }

    // Topmost node under a screen position; later nodes paint over earlier ones
    pub fn hit_test(&self, screen: Pos2) -> Option<SimId> {
        let model = self.from_screen(screen);
        let sims: Vec<&Sim> = self.graph.sims().collect();
        sims.into_iter()
            .rev()
            .find(|sim| Rect::from_min_size(sim.pos(), NODE_SIZE).contains(model))
            .map(|sim| sim.id.clone())
    }

    // --- pointer input ---

    pub fn pointer_down(&mut self, pos: Pos2, button: PointerButton, at: Instant) {
        let hit = self
            .hit_test(pos)
            .and_then(|id| self.graph.get_sim(&id).map(|sim| (id, sim.pos())));
        let effect = self.interaction.pointer_down(pos, button, hit, &self.viewport, at);
        self.apply(effect);
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        let effect = self.interaction.pointer_move(pos, &mut self.viewport);
        self.apply(effect);
    }

    pub fn pointer_up(&mut self, pos: Pos2, at: Instant) {
        let hit = self.hit_test(pos);
        let effect = self.interaction.pointer_up(pos, hit.as_deref(), at);
        self.apply(effect);
    }

    pub fn wheel(&mut self, delta_y: f32) {
        if let Some(factor) = interaction::wheel_factor(delta_y) {
            self.zoom(factor);
        }
    }

    pub fn interaction(&self) -> &Interaction { &self.interaction }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None | Effect::PanEnded => {}
            Effect::ViewportMoved => self.render(),
            Effect::NodeMoved { sim_id, pos } => {
                if self.graph.set_sim_pos(&sim_id, pos) {
                    self.frame.schedule(sim_id);
                }
            }
            Effect::DragEnded { clicked } => {
                self.frame.cancel();
                match clicked {
                    Some(id) => self.select(&id),
                    None => self.render(),
                }
            }
        }
    }

    // --- rendering ---

    /// Display refresh tick: flush the pending drag update, if any.
    pub fn on_frame(&mut self) -> bool {
        match self.frame.take() {
            Some(id) => self.renderer.update_dragged(&self.graph, &id),
            None => false,
        }
    }

    pub fn has_pending_frame(&self) -> bool { self.frame.is_pending() }
    pub fn scene(&self) -> &Scene { self.renderer.scene() }
    pub fn render_stats(&self) -> RenderStats { self.renderer.stats() }

    fn render(&mut self) {
        self.renderer.render_full(&self.graph, &self.viewport, self.selected.as_deref());
    }
}
