use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::graph::{FamilyGraph, Gender, Relationship, RelationshipKind, Sim};

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub sim_count: usize,
}

/// Serializable form of the whole tree, shared by import/export and autosave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "Snapshot::default_version")]
    pub version: String,
    #[serde(default)]
    pub sims: Vec<Sim>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub metadata: SnapshotMetadata,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            sims: Vec::new(),
            relationships: Vec::new(),
            metadata: SnapshotMetadata::default(),
        }
    }
}

impl Snapshot {
    fn default_version() -> String { SNAPSHOT_VERSION.to_string() }

    pub fn capture(graph: &FamilyGraph) -> Self {
        let created = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            version: Self::default_version(),
            sims: graph.all_sims(),
            relationships: graph.relationships().to_vec(),
            metadata: SnapshotMetadata { created, sim_count: graph.sim_count() },
        }
    }

    // Loads into an already cleared graph. Duplicate ids: last one wins.
    pub fn restore_into(self, graph: &mut FamilyGraph) {
        for sim in self.sims {
            graph.insert_sim(sim);
        }
        graph.set_relationships(self.relationships);
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let snapshot: Self = serde_json::from_str(s)?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The Goth household, handy as a first tree to play with.
    pub fn example_family() -> Self {
        let sim = |id: &str, name: &str, gender, age: &str, traits: &str, aspiration: &str, occupation: &str, x, y, notes: &str| Sim {
            id: id.into(),
            name: name.into(),
            gender: Some(gender),
            age: Some(age.into()),
            traits: Some(traits.into()),
            aspiration: Some(aspiration.into()),
            occupation: Some(occupation.into()),
            avatar: None,
            notes: Some(notes.into()),
            x,
            y,
        };
        let sims = vec![
            sim("sim_1", "Bella Goth", Gender::Female, "adult", "Family-Oriented, Romantic, Creative", "Successful Lineage", "Politician", 300.0, 100.0, "Matriarch of the Goth family"),
            sim("sim_2", "Mortimer Goth", Gender::Male, "adult", "Bookworm, Genius, Family-Oriented", "Renaissance Sim", "Scientist", 500.0, 100.0, "Patriarch of the Goth family"),
            sim("sim_3", "Cassandra Goth", Gender::Female, "young-adult", "Creative, Perfectionist, Music Lover", "Musical Genius", "Musician", 250.0, 300.0, "Eldest daughter"),
            sim("sim_4", "Alexander Goth", Gender::Male, "child", "Creative, Outgoing", "Artistic Prodigy", "", 450.0, 300.0, "Youngest son"),
            sim("sim_5", "Cornelia Goth", Gender::Female, "elder", "Proper, Snob, Art Lover", "Fabulously Wealthy", "Retired", 550.0, -100.0, "Mortimer's mother"),
        ];
        let relationships = vec![
            Relationship::new("sim_1", "sim_2", RelationshipKind::Spouse),
            Relationship::new("sim_1", "sim_3", RelationshipKind::Parent),
            Relationship::new("sim_2", "sim_3", RelationshipKind::Parent),
            Relationship::new("sim_1", "sim_4", RelationshipKind::Parent),
            Relationship::new("sim_2", "sim_4", RelationshipKind::Parent),
            Relationship::new("sim_3", "sim_4", RelationshipKind::Sibling),
            Relationship::new("sim_5", "sim_2", RelationshipKind::Parent),
        ];
        let sim_count = sims.len();
        Self {
            version: Self::default_version(),
            sims,
            relationships,
            metadata: SnapshotMetadata { created: String::new(), sim_count },
        }
    }
}
