//! Generational layout over "parent" edges.
//!
//! Roots are sims without an incoming parent edge. A breadth-first walk from
//! all roots assigns each reachable sim the depth at which it is first
//! dequeued; sims of one generation are spread left to right on one row.
//! Sims that no root reaches (e.g. a parent cycle) are left where they are.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use egui::Pos2;

use super::graph::{FamilyGraph, RelationshipKind, SimId};

pub const LAYOUT_ORIGIN: Pos2 = Pos2::new(100.0, 100.0);
pub const HORIZONTAL_SPACING: f32 = 200.0;
pub const VERTICAL_SPACING: f32 = 150.0;

/// Generation number per reachable sim.
pub fn compute_generations(graph: &FamilyGraph) -> HashMap<SimId, usize> {
    generation_rows(graph)
        .into_iter()
        .flat_map(|(generation, ids)| ids.into_iter().map(move |id| (id, generation)))
        .collect()
}

// Rows keep the order in which the walk reached each sim
fn generation_rows(graph: &FamilyGraph) -> BTreeMap<usize, Vec<SimId>> {
    let has_parent: HashSet<&str> = graph
        .relationships()
        .iter()
        .filter(|rel| rel.kind == RelationshipKind::Parent)
        .map(|rel| rel.to.as_str())
        .collect();

    let mut queue: VecDeque<(SimId, usize)> = graph
        .sims()
        .filter(|sim| !has_parent.contains(sim.id.as_str()))
        .map(|sim| (sim.id.clone(), 0))
        .collect();

    let mut processed: HashSet<SimId> = HashSet::new();
    let mut rows: BTreeMap<usize, Vec<SimId>> = BTreeMap::new();

    while let Some((id, generation)) = queue.pop_front() {
        if !processed.insert(id.clone()) {
            continue;
        }
        rows.entry(generation).or_default().push(id.clone());

        for rel in graph.relationships() {
            if rel.kind != RelationshipKind::Parent || rel.from != id {
                continue;
            }
            // Dangling child ids are skipped
            if graph.contains(&rel.to) && !processed.contains(&rel.to) {
                queue.push_back((rel.to.clone(), generation + 1));
            }
        }
    }
    rows
}

/// Compute target positions for every reachable sim.
pub fn compute_layout(graph: &FamilyGraph) -> HashMap<SimId, Pos2> {
    let mut positions = HashMap::new();
    for (generation, ids) in generation_rows(graph) {
        for (index, id) in ids.into_iter().enumerate() {
            let pos = Pos2::new(
                LAYOUT_ORIGIN.x + index as f32 * HORIZONTAL_SPACING,
                LAYOUT_ORIGIN.y + generation as f32 * VERTICAL_SPACING,
            );
            positions.insert(id, pos);
        }
    }
    positions
}

/// Move sims to their generational positions. Returns how many were placed.
pub fn apply_layout(graph: &mut FamilyGraph) -> usize {
    let positions = compute_layout(graph);
    for (id, pos) in &positions {
        graph.set_sim_pos(id, *pos);
    }
    positions.len()
}
