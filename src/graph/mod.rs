//! Protein interaction graph
//!
//! This module implements the graph side of the pipeline:
//! - Undirected simple graph keyed by accession, nodes in insertion order
//! - Self-loop handling chosen per run (`SelfLoopPolicy`)
//! - Reduction to the largest connected component as an independent copy

pub mod component;
pub mod interaction;

// Re-export main types
pub use component::{connected_components, giant_component};
pub use interaction::{InteractionGraph, SelfLoopPolicy};
pub use interactome_graph_algorithms::WccResult;
