//! Connected components over undirected views
//!
//! Union-find with path compression and union by rank. Component enumeration is
//! deterministic: components are numbered in order of their smallest node index.

use super::common::{GraphView, NodeIndex};

/// Result of WCC algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WccResult {
    /// Components in enumeration order, members sorted ascending
    pub components: Vec<Vec<NodeIndex>>,
    /// Node index -> position in `components`
    pub node_component: Vec<usize>,
}

impl WccResult {
    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Node count of each component, in enumeration order
    pub fn component_sizes(&self) -> Vec<usize> {
        self.components.iter().map(Vec::len).collect()
    }

    /// The component with the most nodes.
    ///
    /// Ties go to the component enumerated first, i.e. the one holding the
    /// lowest node index.
    pub fn largest(&self) -> Option<&[NodeIndex]> {
        let mut best: Option<&Vec<NodeIndex>> = None;
        for component in &self.components {
            match best {
                Some(current) if current.len() >= component.len() => {}
                _ => best = Some(component),
            }
        }
        best.map(Vec::as_slice)
    }
}

/// Union-Find data structure
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            self.parent[i] = self.find(self.parent[i]); // Path compression
        }
        self.parent[i]
    }

    pub fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i != root_j {
            if self.rank[root_i] < self.rank[root_j] {
                self.parent[root_i] = root_j;
            } else if self.rank[root_i] > self.rank[root_j] {
                self.parent[root_j] = root_i;
            } else {
                self.parent[root_j] = root_i;
                self.rank[root_i] += 1;
            }
        }
    }

    pub fn connected(&mut self, i: usize, j: usize) -> bool {
        self.find(i) == self.find(j)
    }
}

/// Weakly Connected Components (WCC)
///
/// Finds all disjoint subgraphs in the graph. On an undirected view these are
/// exactly the connected components.
pub fn weakly_connected_components(view: &GraphView) -> WccResult {
    let n = view.node_count;
    let mut uf = UnionFind::new(n);

    // Iterate all edges and Union connected nodes
    for u_idx in 0..n {
        for &v_idx in view.neighbors(u_idx) {
            uf.union(u_idx, v_idx);
        }
    }

    // Number components by first appearance of their root
    let mut root_component: Vec<Option<usize>> = vec![None; n];
    let mut components: Vec<Vec<NodeIndex>> = Vec::new();
    let mut node_component = Vec::with_capacity(n);

    for i in 0..n {
        let root = uf.find(i);
        let component = match root_component[root] {
            Some(c) => c,
            None => {
                components.push(Vec::new());
                let c = components.len() - 1;
                root_component[root] = Some(c);
                c
            }
        };
        components[component].push(i);
        node_component.push(component);
    }

    WccResult {
        components,
        node_component,
    }
}
