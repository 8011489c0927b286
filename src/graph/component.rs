//! Giant-component reduction

use super::interaction::InteractionGraph;
use interactome_graph_algorithms::{weakly_connected_components, WccResult};
use tracing::info;

/// Connected components of the graph, enumerated by earliest-inserted member
pub fn connected_components(graph: &InteractionGraph) -> WccResult {
    weakly_connected_components(&graph.view())
}

/// Independent copy of the largest connected component.
///
/// When several components share the maximum size, the one containing the
/// earliest-inserted accession wins. An empty graph reduces to an empty graph.
pub fn giant_component(graph: &InteractionGraph) -> InteractionGraph {
    let components = connected_components(graph);
    let Some(members) = components.largest() else {
        return InteractionGraph::new(graph.self_loop_policy());
    };

    let giant = graph.induced_subgraph(members);
    info!(
        components = components.len(),
        nodes_before = graph.node_count(),
        edges_before = graph.edge_count(),
        nodes_after = giant.node_count(),
        edges_after = giant.edge_count(),
        "Reduced graph to its largest connected component"
    );
    giant
}
