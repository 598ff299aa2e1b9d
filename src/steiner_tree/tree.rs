use crate::error::{SteinerError, SteinerResult};
use crate::graph::{EdgeIndex, EdgeWeight, Graph, NodeIndex, WeightedGraph};
use crate::util::ordered;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// One step of the greedy construction: the shortest path from `attachment` (already in the tree)
/// to `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct Splice {
    pub target: NodeIndex,
    pub attachment: NodeIndex,
    pub path: Vec<NodeIndex>,
    pub weight: EdgeWeight,
}

/// Result of the approximation: the edges of the tree, the vertices they span and the total weight.
///
/// `weight` is the sum of the spliced path weights, each truncated toward zero.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SteinerTree {
    edges: BTreeSet<EdgeIndex>,
    vertices: BTreeSet<NodeIndex>,
    splices: Vec<Splice>,
    weight: u64,
}

impl SteinerTree {
    /// Tree consisting only of `root`.
    pub fn new(root: NodeIndex) -> Self {
        Self {
            vertices: BTreeSet::from([root]),
            ..Self::default()
        }
    }

    /// Add all vertices and edges of `splice.path` to the tree.
    pub(crate) fn splice<G: WeightedGraph + ?Sized>(
        &mut self,
        graph: &G,
        splice: Splice,
    ) -> SteinerResult<()> {
        let edges = splice
            .path
            .windows(2)
            .map(|pair| {
                graph
                    .find_edge(pair[0], pair[1])
                    .ok_or(SteinerError::InconsistentPath {
                        from: splice.attachment,
                        to: splice.target,
                    })
            })
            .collect::<SteinerResult<Vec<_>>>()?;
        let added = splice.weight.trunc();
        let overflow = SteinerError::WeightOverflow {
            total: self.weight,
            added,
        };
        // `as u64` saturates, so anything this large can't be added
        if added >= u64::MAX as EdgeWeight {
            return Err(overflow);
        }
        self.weight = self.weight.checked_add(added as u64).ok_or(overflow)?;
        self.edges.extend(edges);
        self.vertices.extend(splice.path.iter().copied());
        self.splices.push(splice);
        Ok(())
    }

    pub fn edges(&self) -> &BTreeSet<EdgeIndex> {
        &self.edges
    }

    pub fn vertices(&self) -> &BTreeSet<NodeIndex> {
        &self.vertices
    }

    pub fn contains_vertex(&self, vertex: NodeIndex) -> bool {
        self.vertices.contains(&vertex)
    }

    /// The greedy steps in the order they were taken.
    pub fn splices(&self) -> &[Splice] {
        &self.splices
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sum of the (untruncated) weights of the tree edges.
    pub fn edge_weight_in<G: WeightedGraph + ?Sized>(&self, graph: &G) -> EdgeWeight {
        self.edges.iter().map(|&e| graph.edge_weight(e)).sum()
    }

    /// Neighbors of `vertex` using tree edges only.
    pub fn neighbors<'a, G: WeightedGraph + ?Sized>(
        &'a self,
        graph: &'a G,
        vertex: NodeIndex,
    ) -> impl Iterator<Item = NodeIndex> + 'a {
        self.edges.iter().filter_map(move |&e| {
            let (a, b) = graph.edge_endpoints(e);
            if a == vertex {
                Some(b)
            } else if b == vertex {
                Some(a)
            } else {
                None
            }
        })
    }

    /// Vertices with exactly one incident tree edge.
    pub fn find_leaves<G: WeightedGraph + ?Sized>(&self, graph: &G) -> Vec<NodeIndex> {
        self.vertices
            .iter()
            .copied()
            .filter(|&v| self.neighbors(graph, v).count() == 1)
            .collect()
    }

    /// Set the mark of every tree edge. Other marks are left alone.
    pub fn mark_in(&self, graph: &mut Graph) {
        for &e in &self.edges {
            graph.set_mark(e, true);
        }
    }

    /// Write the tree in the PACE solution format (`VALUE w` followed by 1-based edges).
    pub fn write<W: Write, G: WeightedGraph + ?Sized>(
        &self,
        writer: &mut W,
        graph: &G,
    ) -> io::Result<()> {
        writeln!(writer, "VALUE {}", self.edge_weight_in(graph))?;
        for &e in &self.edges {
            let (a, b) = graph.edge_endpoints(e);
            let (a, b) = ordered(a, b);
            writeln!(writer, "{} {}", a + 1, b + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::shortcut_test_graph;
    use crate::util::TestResult;

    fn splice(target: NodeIndex, path: Vec<NodeIndex>, weight: EdgeWeight) -> Splice {
        Splice {
            target,
            attachment: path[0],
            path,
            weight,
        }
    }

    #[test]
    fn test_new_tree() {
        let tree = SteinerTree::new(3);
        assert!(tree.is_empty());
        assert_eq!(tree.weight(), 0);
        assert!(tree.contains_vertex(3));
        assert_eq!(tree.vertices().len(), 1);
    }

    #[test]
    fn test_splice() -> TestResult {
        let graph = shortcut_test_graph()?;
        let mut tree = SteinerTree::new(0);
        tree.splice(&graph, splice(2, vec![0, 1, 2], 2.0))?;
        tree.splice(&graph, splice(3, vec![1, 3], 2.0))?;
        assert_eq!(tree.weight(), 4);
        assert_eq!(tree.edge_weight_in(&graph), 4.0);
        assert_eq!(
            tree.vertices().iter().copied().collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert_eq!(tree.edges().len(), 3);
        let mut leaves = tree.find_leaves(&graph);
        leaves.sort_unstable();
        assert_eq!(leaves, vec![0, 2, 3]);
        let mut neighbors = tree.neighbors(&graph, 1).collect::<Vec<_>>();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![0, 2, 3]);
        assert_eq!(tree.splices().len(), 2);
        Ok(())
    }

    #[test]
    fn test_splice_truncates_weight() -> TestResult {
        let mut graph = Graph::new(2);
        graph.add_edge(0, 1, 2.75)?;
        let mut tree = SteinerTree::new(0);
        tree.splice(&graph, splice(1, vec![0, 1], 2.75))?;
        assert_eq!(tree.weight(), 2);
        assert_eq!(tree.edge_weight_in(&graph), 2.75);
        Ok(())
    }

    #[test]
    fn test_splice_weight_overflow() -> TestResult {
        let graph = Graph::new(2);
        let mut tree = SteinerTree::new(0);
        tree.splice(&graph, splice(0, vec![0], 1e19))?;
        assert_eq!(tree.weight(), 10_000_000_000_000_000_000);
        assert_eq!(
            tree.splice(&graph, splice(1, vec![1], 1e19)),
            Err(SteinerError::WeightOverflow {
                total: 10_000_000_000_000_000_000,
                added: 1e19
            })
        );
        assert!(tree.splice(&graph, splice(1, vec![1], 1e20)).is_err());
        assert_eq!(tree.splices().len(), 1);
        assert!(!tree.contains_vertex(1));
        Ok(())
    }

    #[test]
    fn test_splice_missing_edge() -> TestResult {
        let graph = shortcut_test_graph()?;
        let mut tree = SteinerTree::new(0);
        assert_eq!(
            tree.splice(&graph, splice(3, vec![0, 3], 3.0)),
            Err(SteinerError::InconsistentPath { from: 0, to: 3 })
        );
        Ok(())
    }

    #[test]
    fn test_write() -> TestResult {
        let graph = shortcut_test_graph()?;
        let mut tree = SteinerTree::new(0);
        tree.splice(&graph, splice(2, vec![0, 1, 2], 2.0))?;
        let mut out = Vec::new();
        tree.write(&mut out, &graph)?;
        // edge 0 is `2 1`, edge 2 is `2 3` in the input
        assert_eq!(String::from_utf8(out)?, "VALUE 2\n1 2\n2 3\n");
        Ok(())
    }

    #[test]
    fn test_mark_in() -> TestResult {
        let mut graph = shortcut_test_graph()?;
        let mut tree = SteinerTree::new(0);
        tree.splice(&graph, splice(2, vec![0, 1, 2], 2.0))?;
        tree.mark_in(&mut graph);
        assert_eq!(graph.marked_edges().collect::<Vec<_>>(), vec![0, 2]);
        Ok(())
    }
}
