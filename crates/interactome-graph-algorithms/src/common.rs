//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of an undirected graph topology for algorithm execution.

/// Dense node index (0..N)
pub type NodeIndex = usize;

/// A dense, integer-indexed view of an undirected graph using Compressed Sparse Row (CSR) format.
///
/// Every undirected edge `{u, v}` appears in the neighbor lists of both `u` and `v`.
/// A self-loop appears once in its node's list.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbor indices
    pub targets: Vec<NodeIndex>,
}

impl GraphView {
    /// Number of neighbor entries stored for a node
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Neighbors of a node
    pub fn neighbors(&self, idx: NodeIndex) -> &[NodeIndex] {
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        &self.targets[start..end]
    }

    /// Flatten adjacency lists into CSR.
    ///
    /// `adjacency[i]` lists the neighbors of node `i`; the caller is responsible
    /// for listing each undirected edge on both sides.
    pub fn from_adjacency_list<I, N>(adjacency: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: IntoIterator<Item = NodeIndex>,
    {
        let mut offsets = vec![0];
        let mut targets = Vec::new();

        for neighbors in adjacency {
            targets.extend(neighbors);
            offsets.push(targets.len());
        }

        GraphView {
            node_count: offsets.len() - 1,
            offsets,
            targets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_layout() {
        // 0 - 1 - 2, 3 isolated
        let view = GraphView::from_adjacency_list(vec![vec![1], vec![0, 2], vec![1], vec![]]);

        assert_eq!(view.node_count, 4);
        assert_eq!(view.offsets, vec![0, 1, 3, 4, 4]);
        assert_eq!(view.neighbors(1), &[0, 2]);
        assert_eq!(view.degree(3), 0);
        assert!(view.neighbors(3).is_empty());
    }

    #[test]
    fn test_empty_view() {
        let view = GraphView::from_adjacency_list(Vec::<Vec<usize>>::new());
        assert_eq!(view.node_count, 0);
        assert_eq!(view.offsets, vec![0]);
    }
}
