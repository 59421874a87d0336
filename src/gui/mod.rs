pub mod frontend;
pub mod graph_view;
pub mod interaction;
pub mod render;
pub mod viewport;
