//! Undirected simple graph of protein accessions
//!
//! Nodes are kept in first-insertion order and addressed by a dense index, so
//! every traversal over the graph is reproducible across runs on the same input.

use indexmap::IndexSet;
use interactome_graph_algorithms::GraphView;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What to do with a record that pairs an accession with itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfLoopPolicy {
    /// Add the node and a loop edge
    #[default]
    Keep,
    /// Ignore the record; neither node nor edge is added
    Drop,
}

/// Interaction graph
///
/// Duplicate interactions collapse into one edge; multiplicity is not kept.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    /// Accession -> dense index, in insertion order
    nodes: IndexSet<String, FxBuildHasher>,
    /// Sorted neighbor sets; a self-loop lists the node itself
    adjacency: Vec<BTreeSet<usize>>,
    edge_count: usize,
    self_loops: SelfLoopPolicy,
}

impl InteractionGraph {
    pub fn new(self_loops: SelfLoopPolicy) -> Self {
        Self {
            self_loops,
            ..Self::default()
        }
    }

    /// Fold a fallible pair stream into a graph, stopping at the first error
    pub fn from_pairs<I, E>(pairs: I, self_loops: SelfLoopPolicy) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<(String, String), E>>,
    {
        let mut graph = Self::new(self_loops);
        for pair in pairs {
            let (a, b) = pair?;
            graph.add_edge(a, b);
        }
        Ok(graph)
    }

    pub fn self_loop_policy(&self) -> SelfLoopPolicy {
        self.self_loops
    }

    /// Insert a node if absent and return its index
    pub fn add_node(&mut self, accession: impl Into<String>) -> usize {
        let (idx, inserted) = self.nodes.insert_full(accession.into());
        if inserted {
            self.adjacency.push(BTreeSet::new());
        }
        idx
    }

    /// Insert an undirected edge. Returns true if the edge is new.
    pub fn add_edge(&mut self, a: impl Into<String>, b: impl Into<String>) -> bool {
        let a = a.into();
        let b = b.into();
        if a == b && self.self_loops == SelfLoopPolicy::Drop {
            return false;
        }

        let u = self.add_node(a);
        let v = self.add_node(b);
        self.link(u, v)
    }

    fn link(&mut self, u: usize, v: usize) -> bool {
        let inserted = self.adjacency[u].insert(v);
        if inserted {
            if u != v {
                self.adjacency[v].insert(u);
            }
            self.edge_count += 1;
        }
        inserted
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Accession stored at a dense index
    pub fn accession(&self, idx: usize) -> Option<&str> {
        self.nodes.get_index(idx).map(String::as_str)
    }

    pub fn index_of(&self, accession: &str) -> Option<usize> {
        self.nodes.get_index_of(accession)
    }

    pub fn contains_node(&self, accession: &str) -> bool {
        self.nodes.contains(accession)
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(u), Some(v)) => self.adjacency[u].contains(&v),
            _ => false,
        }
    }

    /// Accessions in insertion order
    pub fn accessions(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(String::as_str)
    }

    /// Neighbor indices of a node, ascending
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[idx].iter().copied()
    }

    /// Number of distinct neighbors; a self-loop counts once
    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    /// Every undirected edge once, as `(i, j)` with `i <= j`
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, neighbors)| {
            neighbors.range(u..).map(move |&v| (u, v))
        })
    }

    /// Every undirected edge once, by accession
    pub fn accession_edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.edges().map(|(u, v)| (self.nodes[u].as_str(), self.nodes[v].as_str()))
    }

    /// Dense CSR view for the algorithms crate
    pub fn view(&self) -> GraphView {
        GraphView::from_adjacency_list(self.adjacency.iter().map(|n| n.iter().copied()))
    }

    /// Copy of the subgraph induced by `members`.
    ///
    /// Nodes keep the order given in `members`; every edge with both endpoints
    /// in the set is copied. Out-of-range indices are ignored. The result
    /// owns all of its data.
    pub fn induced_subgraph(&self, members: &[usize]) -> InteractionGraph {
        let mut sub = InteractionGraph::new(self.self_loops);
        let mut remap = vec![None; self.node_count()];

        for &old in members {
            if let Some(accession) = self.nodes.get_index(old) {
                remap[old] = Some(sub.add_node(accession.clone()));
            }
        }

        for &old_u in members {
            let Some(u) = remap.get(old_u).copied().flatten() else {
                continue;
            };
            for &old_v in self.adjacency[old_u].range(old_u..) {
                if let Some(v) = remap[old_v] {
                    sub.link(u, v);
                }
            }
        }

        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> InteractionGraph {
        let mut g = InteractionGraph::new(SelfLoopPolicy::Keep);
        for (a, b) in edges {
            g.add_edge(*a, *b);
        }
        g
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut g = InteractionGraph::new(SelfLoopPolicy::Keep);
        assert!(g.add_edge("P1", "P2"));
        assert!(!g.add_edge("P1", "P2"));
        assert!(!g.add_edge("P2", "P1"));

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.contains_edge("P2", "P1"));
    }

    #[test]
    fn test_insertion_order() {
        let g = graph(&[("B", "A"), ("C", "B")]);

        assert_eq!(g.accessions().collect::<Vec<_>>(), vec!["B", "A", "C"]);
        assert_eq!(g.index_of("C"), Some(2));
        assert_eq!(g.accession(1), Some("A"));
        assert_eq!(g.accession(3), None);
    }

    #[test]
    fn test_self_loop_kept() {
        let g = graph(&[("P1", "P1"), ("P1", "P2")]);

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 2);
        assert!(g.contains_edge("P1", "P1"));
        assert_eq!(g.edges().collect::<Vec<_>>(), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_self_loop_dropped() {
        let mut g = InteractionGraph::new(SelfLoopPolicy::Drop);
        assert!(!g.add_edge("P1", "P1"));
        g.add_edge("P2", "P3");

        assert!(!g.contains_node("P1"));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_from_pairs_propagates_error() {
        let pairs: Vec<Result<(String, String), &str>> = vec![
            Ok(("A".into(), "B".into())),
            Err("bad line"),
            Ok(("C".into(), "D".into())),
        ];

        let result = InteractionGraph::from_pairs(pairs, SelfLoopPolicy::Keep);

        assert_eq!(result.err(), Some("bad line"));
    }

    #[test]
    fn test_edges_listed_once() {
        let g = graph(&[("A", "B"), ("B", "C"), ("C", "A")]);

        let mut edges: Vec<_> = g.accession_edges().collect();
        edges.sort();

        assert_eq!(edges, vec![("A", "B"), ("A", "C"), ("B", "C")]);
        assert_eq!(g.degree(0), 2);
    }

    #[test]
    fn test_view_is_symmetric() {
        let g = graph(&[("A", "B"), ("B", "C")]);

        let view = g.view();

        assert_eq!(view.node_count, 3);
        assert_eq!(view.neighbors(0), &[1]);
        assert_eq!(view.neighbors(1), &[0, 2]);
        assert_eq!(view.neighbors(2), &[1]);
    }

    #[test]
    fn test_induced_subgraph_copies() {
        let g = graph(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "D")]);

        let mut sub = g.induced_subgraph(&[2, 3]);

        assert_eq!(sub.accessions().collect::<Vec<_>>(), vec!["C", "D"]);
        assert_eq!(sub.edge_count(), 2);
        assert!(sub.contains_edge("C", "D"));
        assert!(sub.contains_edge("D", "D"));
        assert!(!sub.contains_node("B"));

        // Mutating the copy leaves the source untouched
        sub.add_edge("C", "Z");
        assert!(!g.contains_node("Z"));
        assert_eq!(g.edge_count(), 4);
    }
}
