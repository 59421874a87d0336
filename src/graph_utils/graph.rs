use std::collections::HashMap;
use std::fmt;

use egui::Pos2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Ids are plain strings so hand-written snapshots ("sim_1") load untouched
pub type SimId = String;

// Default placement for sims added without a position
const DEFAULT_ORIGIN: (f32, f32) = (400.0, 200.0);
const DEFAULT_STEP: (f32, f32) = (50.0, 30.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Parent,
    Spouse,
    Sibling,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 3] = [
        RelationshipKind::Parent,
        RelationshipKind::Spouse,
        RelationshipKind::Sibling,
    ];
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationshipKind::Parent => "parent",
            RelationshipKind::Spouse => "spouse",
            RelationshipKind::Sibling => "sibling",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sim {
    pub id: SimId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    // Life stage tag (baby, child, teen, young-adult, adult, elder...), display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspiration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub x: f32,
    pub y: f32,
}

impl Sim {
    pub fn pos(&self) -> Pos2 { Pos2::new(self.x, self.y) }

    pub fn set_pos(&mut self, pos: Pos2) {
        self.x = pos.x;
        self.y = pos.y;
    }

    // Case-insensitive match against name, traits and occupation
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        if term.is_empty() {
            return true;
        }
        let hit = |field: &Option<String>| {
            field.as_deref().map(|v| v.to_lowercase().contains(&term)).unwrap_or(false)
        };
        self.name.to_lowercase().contains(&term) || hit(&self.traits) || hit(&self.occupation)
    }
}

/// Field set used both to create a sim and to patch an existing one.
///
/// On `add_sim` a missing `id` is generated and missing coordinates are
/// staggered from the current sim count. On `update_sim` every `Some` field
/// overwrites the stored value and `id` is ignored (ids never change).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimFields {
    pub id: Option<SimId>,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<String>,
    pub traits: Option<String>,
    pub aspiration: Option<String>,
    pub occupation: Option<String>,
    pub avatar: Option<String>,
    pub notes: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl SimFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    fn merge_into(self, sim: &mut Sim) {
        if let Some(v) = self.name { sim.name = v; }
        if let Some(v) = self.gender { sim.gender = Some(v); }
        if let Some(v) = self.age { sim.age = Some(v); }
        if let Some(v) = self.traits { sim.traits = Some(v); }
        if let Some(v) = self.aspiration { sim.aspiration = Some(v); }
        if let Some(v) = self.occupation { sim.occupation = Some(v); }
        if let Some(v) = self.avatar { sim.avatar = Some(v); }
        if let Some(v) = self.notes { sim.notes = Some(v); }
        if let Some(v) = self.x { sim.x = v; }
        if let Some(v) = self.y { sim.y = v; }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub from: SimId,
    pub to: SimId,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
}

impl Relationship {
    pub fn new(from: impl Into<SimId>, to: impl Into<SimId>, kind: RelationshipKind) -> Self {
        Self { from: from.into(), to: to.into(), kind }
    }

    pub fn touches(&self, id: &str) -> bool { self.from == id || self.to == id }

    // Same kind between the same unordered pair. Parent edges are included on
    // purpose: a second parent edge in either direction is a duplicate.
    pub fn is_equivalent(&self, other: &Relationship) -> bool {
        self.kind == other.kind
            && ((self.from == other.from && self.to == other.to)
                || (self.from == other.to && self.to == other.from))
    }
}

/// Sims keyed by id plus the relationship sequence in insertion order.
#[derive(Clone, Debug, Default)]
pub struct FamilyGraph {
    sims: HashMap<SimId, Sim>,
    // Insertion order of ids; gives sims a stable iteration order
    order: Vec<SimId>,
    relationships: Vec<Relationship>,
}

impl FamilyGraph {
    pub fn new() -> Self { Self::default() }

    pub fn generate_id() -> SimId { format!("sim_{}", Uuid::now_v7().simple()) }

    /// Add a sim and return its id. A sim needs a name: fields without one
    /// (or with only whitespace) are rejected with `None`.
    pub fn add_sim(&mut self, fields: SimFields) -> Option<SimId> {
        if fields.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return None;
        }
        let count = self.sims.len() as f32;
        let id = fields.id.clone().unwrap_or_else(Self::generate_id);
        let (x, y) = match (fields.x, fields.y) {
            (Some(x), Some(y)) => (x, y),
            _ => (
                DEFAULT_ORIGIN.0 + count * DEFAULT_STEP.0,
                DEFAULT_ORIGIN.1 + count * DEFAULT_STEP.1,
            ),
        };
        let mut sim = Sim {
            id: id.clone(),
            name: String::new(),
            gender: None,
            age: None,
            traits: None,
            aspiration: None,
            occupation: None,
            avatar: None,
            notes: None,
            x,
            y,
        };
        SimFields { x: None, y: None, ..fields }.merge_into(&mut sim);
        self.insert_sim(sim);
        Some(id)
    }

    // Insert as-is; an existing id is overwritten in place (last write wins)
    pub fn insert_sim(&mut self, sim: Sim) {
        if !self.sims.contains_key(&sim.id) {
            self.order.push(sim.id.clone());
        }
        self.sims.insert(sim.id.clone(), sim);
    }

    pub fn update_sim(&mut self, id: &str, fields: SimFields) -> bool {
        if let Some(sim) = self.sims.get_mut(id) {
            fields.merge_into(sim);
            true
        } else {
            false
        }
    }

    pub fn set_sim_pos(&mut self, id: &str, pos: Pos2) -> bool {
        if let Some(sim) = self.sims.get_mut(id) {
            sim.set_pos(pos);
            true
        } else {
            false
        }
    }

    pub fn remove_sim(&mut self, id: &str) -> bool {
        if self.sims.remove(id).is_some() {
            self.order.retain(|o| o != id);
            // Cascade delete relationships involving this sim
            self.relationships.retain(|rel| !rel.touches(id));
            true
        } else {
            false
        }
    }

    // Append unless an equivalent relationship exists; endpoints are not validated
    pub fn add_relationship(&mut self, rel: Relationship) -> bool {
        if self.relationships.iter().any(|r| r.is_equivalent(&rel)) {
            return false;
        }
        self.relationships.push(rel);
        true
    }

    // Replace the sequence verbatim, duplicates included
    pub fn set_relationships(&mut self, rels: Vec<Relationship>) { self.relationships = rels; }

    pub fn clear(&mut self) {
        self.sims.clear();
        self.order.clear();
        self.relationships.clear();
    }

    pub fn get_sim(&self, id: &str) -> Option<&Sim> { self.sims.get(id) }
    pub fn contains(&self, id: &str) -> bool { self.sims.contains_key(id) }
    pub fn sim_count(&self) -> usize { self.sims.len() }
    pub fn is_empty(&self) -> bool { self.sims.is_empty() }

    pub fn sims(&self) -> impl Iterator<Item = &Sim> {
        self.order.iter().filter_map(|id| self.sims.get(id))
    }

    pub fn all_sims(&self) -> Vec<Sim> { self.sims().cloned().collect() }

    pub fn relationships(&self) -> &[Relationship] { &self.relationships }

    pub fn relationships_for(&self, id: &str) -> Vec<Relationship> {
        self.relationships.iter().filter(|rel| rel.touches(id)).cloned().collect()
    }

    pub fn find_sim_ids_matching(&self, term: &str) -> Vec<SimId> {
        self.sims().filter(|sim| sim.matches(term)).map(|sim| sim.id.clone()).collect()
    }
}
