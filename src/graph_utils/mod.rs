pub mod graph;
pub mod layout;
pub mod snapshot;
