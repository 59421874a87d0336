//! Toolkit-independent display list for the family canvas.
//!
//! A full render rebuilds the whole [`Scene`] from the store; the drag path
//! only moves one node and redraws the connectors.

use std::collections::HashMap;

use egui::{Color32, Pos2, Rect, Vec2};

use crate::graph_utils::graph::{FamilyGraph, Gender, RelationshipKind, Sim, SimId};
use super::viewport::Viewport;

// Model-space footprint of a node, anchored at its top-left corner
pub const NODE_SIZE: Vec2 = Vec2::new(160.0, 100.0);
// Approximate visual center used for connector endpoints
pub const NODE_CENTER_OFFSET: Vec2 = Vec2::new(80.0, 50.0);
pub const CONNECTOR_THICKNESS: f32 = 2.0;

pub const FEMALE_COLOR: Color32 = Color32::from_rgb(0xec, 0x48, 0x99);
pub const MALE_COLOR: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);
pub const OTHER_COLOR: Color32 = Color32::from_rgb(0x8b, 0x5c, 0xf6);

pub fn gender_color(gender: Option<Gender>) -> Color32 {
    match gender {
        Some(Gender::Female) => FEMALE_COLOR,
        Some(Gender::Male) => MALE_COLOR,
        _ => OTHER_COLOR,
    }
}

// First letter of each word, uppercased, at most two
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

pub fn detail_line(sim: &Sim) -> String {
    let stage = sim.age.as_deref().filter(|s| !s.is_empty()).unwrap_or("Adult");
    match sim.occupation.as_deref().filter(|s| !s.is_empty()) {
        Some(job) => format!("{} • {}", stage, job),
        None => stage.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AvatarVisual {
    Image(String),
    Initials { text: String, color: Color32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeVisual {
    pub sim_id: SimId,
    // Top-left anchor in model space
    pub pos: Pos2,
    pub avatar: AvatarVisual,
    pub name: String,
    pub detail: String,
    pub selected: bool,
}

impl NodeVisual {
    fn from_sim(sim: &Sim, selected: bool) -> Self {
        let avatar = match sim.avatar.as_deref().filter(|a| !a.is_empty()) {
            Some(uri) => AvatarVisual::Image(uri.to_string()),
            None => AvatarVisual::Initials {
                text: initials(&sim.name),
                color: gender_color(sim.gender),
            },
        };
        Self {
            sim_id: sim.id.clone(),
            pos: sim.pos(),
            avatar,
            name: sim.name.clone(),
            detail: detail_line(sim),
            selected,
        }
    }

    pub fn rect(&self) -> Rect { Rect::from_min_size(self.pos, NODE_SIZE) }
}

/// A thin rectangle of `length`, rotated by `angle_deg` around `origin`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectorVisual {
    pub kind: RelationshipKind,
    pub origin: Pos2,
    pub length: f32,
    pub angle_deg: f32,
}

impl ConnectorVisual {
    pub fn between(from: &Sim, to: &Sim, kind: RelationshipKind) -> Self {
        let a = from.pos() + NODE_CENTER_OFFSET;
        let b = to.pos() + NODE_CENTER_OFFSET;
        let d = b - a;
        Self {
            kind,
            origin: a,
            length: d.length(),
            angle_deg: d.y.atan2(d.x).to_degrees(),
        }
    }

    pub fn end(&self) -> Pos2 {
        let rad = self.angle_deg.to_radians();
        self.origin + Vec2::new(rad.cos(), rad.sin()) * self.length
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanvasLayer {
    pub scale: f32,
    pub offset: Vec2,
    // Drawn first so they sit behind the nodes
    pub connectors: Vec<ConnectorVisual>,
    pub nodes: Vec<NodeVisual>,
    node_index: HashMap<SimId, usize>,
}

impl CanvasLayer {
    pub fn node(&self, id: &str) -> Option<&NodeVisual> {
        self.node_index.get(id).and_then(|&i| self.nodes.get(i))
    }

    fn rebuild_connectors(&mut self, graph: &FamilyGraph) {
        self.connectors.clear();
        for rel in graph.relationships() {
            // Dangling endpoints are not drawn
            if let (Some(a), Some(b)) = (graph.get_sim(&rel.from), graph.get_sim(&rel.to)) {
                self.connectors.push(ConnectorVisual::between(a, b, rel.kind));
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Scene {
    // Placeholder shown while the tree is empty
    #[default]
    Welcome,
    Canvas(CanvasLayer),
}

impl Scene {
    pub fn canvas(&self) -> Option<&CanvasLayer> {
        match self {
            Scene::Canvas(layer) => Some(layer),
            Scene::Welcome => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub full_renders: u64,
    pub incremental_updates: u64,
}

#[derive(Debug, Default)]
pub struct Renderer {
    scene: Scene,
    stats: RenderStats,
}

impl Renderer {
    pub fn scene(&self) -> &Scene { &self.scene }
    pub fn stats(&self) -> RenderStats { self.stats }

    pub fn render_full(&mut self, graph: &FamilyGraph, viewport: &Viewport, selected: Option<&str>) {
        self.stats.full_renders += 1;
        if graph.is_empty() {
            self.scene = Scene::Welcome;
            return;
        }
        let mut layer = CanvasLayer {
            scale: viewport.scale(),
            offset: viewport.offset,
            ..Default::default()
        };
        layer.rebuild_connectors(graph);
        for sim in graph.sims() {
            let selected = selected == Some(sim.id.as_str());
            layer.node_index.insert(sim.id.clone(), layer.nodes.len());
            layer.nodes.push(NodeVisual::from_sim(sim, selected));
        }
        self.scene = Scene::Canvas(layer);
    }

    /// Drag path: move a single node and redraw every connector.
    /// Returns false when there is no canvas or no node for `id`.
    pub fn update_dragged(&mut self, graph: &FamilyGraph, id: &str) -> bool {
        let Scene::Canvas(layer) = &mut self.scene else { return false };
        let (Some(&index), Some(sim)) = (layer.node_index.get(id), graph.get_sim(id)) else {
            return false;
        };
        layer.nodes[index].pos = sim.pos();
        layer.rebuild_connectors(graph);
        self.stats.incremental_updates += 1;
        true
    }
}

/// Single-slot pending visual update, flushed once per display refresh.
/// Scheduling while an update is pending replaces it.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: Option<SimId>,
}

impl FrameScheduler {
    pub fn schedule(&mut self, id: SimId) { self.pending = Some(id); }
    pub fn cancel(&mut self) { self.pending = None; }
    pub fn is_pending(&self) -> bool { self.pending.is_some() }
    pub fn take(&mut self) -> Option<SimId> { self.pending.take() }
}
