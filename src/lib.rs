//! Interactome embeddings
//!
//! Turns a BioGRID release into per-protein embedding vectors for the human
//! protein-protein interaction network.
//!
//! # Pipeline
//!
//! 1. [`fetch`]: download the release archive once per release
//! 2. [`source`]: stream the tab3 member, keeping human-human pairs with accessions
//! 3. [`graph`]: fold pairs into an undirected simple graph, reduce it to its
//!    largest connected component
//! 4. [`trainer`]: train node2vec embeddings with an external program
//! 5. [`vectors`] / [`store`]: write tabbed vectors + vocabulary and a
//!    per-release binary artifact that later runs reuse
//! 6. [`visualize`]: PCA scatter plot of the embedding space
//!
//! ## Example Usage
//!
//! ```rust
//! use interactome::graph::{giant_component, InteractionGraph, SelfLoopPolicy};
//! use interactome::source::HumanInteractions;
//!
//! let input = "SWISS-PROT Accessions Interactor A\tSWISS-PROT Accessions Interactor B\t\
//!              Organism Name Interactor A\tOrganism Name Interactor B\n\
//!              P1\tP2\tHomo sapiens\tHomo sapiens\n\
//!              P2\tP3\tHomo sapiens\tHomo sapiens\n\
//!              P4\tP5\tHomo sapiens\tHomo sapiens\n\
//!              P6\tP7\tMus musculus\tHomo sapiens\n";
//!
//! let pairs = HumanInteractions::new(input.as_bytes()).unwrap();
//! let graph = InteractionGraph::from_pairs(pairs, SelfLoopPolicy::Keep).unwrap();
//! assert_eq!(graph.node_count(), 5);
//!
//! let giant = giant_component(&graph);
//! assert_eq!(giant.accessions().collect::<Vec<_>>(), vec!["P1", "P2", "P3"]);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod fetch;
pub mod graph;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod trainer;
pub mod vectors;
pub mod visualize;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, PipelineConfig};
pub use fetch::{ArchiveFetcher, FetchError, FetchResult};
pub use graph::{giant_component, InteractionGraph, SelfLoopPolicy};
pub use pipeline::{Pipeline, PipelineError, PipelineResult, RunSummary};
pub use source::{HumanInteractions, SourceError, SourceResult};
pub use store::{CachedEmbeddings, EmbeddingStore, StoreError, StoreResult};
pub use trainer::{CommandTrainer, EmbeddingTrainer, Hyperparameters, TrainError, TrainResult};
pub use vectors::{load_tabbed, save_tabbed, KeyedVectors, VectorsError, VectorsResult};
pub use visualize::{PlotError, PlotResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
