pub mod feed;
pub mod graph;
