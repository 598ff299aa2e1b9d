use crate::error::{SteinerError, SteinerResult};
use crate::graph::{EdgeWeight, NodeIndex, WeightedGraph};
use std::ops::{Index, IndexMut, Range};
use tracing::debug;

/// A shortest path together with its total weight.
/// The path includes both endpoints; it is empty iff the endpoints are disconnected.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortestPath {
    distance: EdgeWeight,
    path: Vec<NodeIndex>,
}

impl ShortestPath {
    pub fn new(path: Vec<NodeIndex>, distance: EdgeWeight) -> Self {
        Self { path, distance }
    }

    pub fn distance(&self) -> EdgeWeight {
        self.distance
    }

    pub fn path(&self) -> &[NodeIndex] {
        &self.path
    }
}

/// Dense square matrix stored row by row.
#[derive(Clone, Debug, PartialEq)]
struct SquareMatrix<T> {
    cells: Vec<T>,
    dimension: usize,
}

impl<T: Clone> SquareMatrix<T> {
    fn filled(dimension: usize, value: T) -> Self {
        Self {
            cells: vec![value; dimension * dimension],
            dimension,
        }
    }
}

impl<T> SquareMatrix<T> {
    fn index_range(&self, index: usize) -> Range<usize> {
        let start = index * self.dimension;
        start..start + self.dimension
    }
}

/// This allows for neat two-dimensional indexing (e.g. `m[a][b]`).
impl<T> Index<usize> for SquareMatrix<T> {
    type Output = [T];

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[self.index_range(index)]
    }
}

impl<T> IndexMut<usize> for SquareMatrix<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let range = self.index_range(index);
        &mut self.cells[range]
    }
}

/// All-pairs shortest path weights and a next-hop matrix for path reconstruction.
///
/// Built once by Floyd-Warshall in `O(V^3)`; read-only afterwards. The matrices are indexed by
/// vertex id, so they only stay meaningful as long as the graph they were computed from keeps
/// its vertices and edges.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortestPaths {
    weights: SquareMatrix<EdgeWeight>,
    next_hops: SquareMatrix<Option<NodeIndex>>,
}

/// Compute all-pairs shortest paths of `graph`.
pub fn compute_shortest_paths<G: WeightedGraph + ?Sized>(graph: &G) -> ShortestPaths {
    ShortestPaths::new(graph)
}

impl ShortestPaths {
    pub fn new<G: WeightedGraph + ?Sized>(graph: &G) -> Self {
        let n = graph.num_vertices();
        debug!(vertices = n, "computing all-pairs shortest paths");
        let mut res = ShortestPaths {
            weights: SquareMatrix::filled(n, EdgeWeight::INFINITY),
            next_hops: SquareMatrix::filled(n, None),
        };
        res.initialize(graph);
        res.floyd_warshall();
        res
    }

    /// Direct edges only: `0` on the diagonal, the edge weight between neighbors,
    /// infinity everywhere else.
    fn initialize<G: WeightedGraph + ?Sized>(&mut self, graph: &G) {
        for i in graph.vertices() {
            for j in graph.vertices() {
                if i == j {
                    self.weights[i][j] = 0.0;
                    self.next_hops[i][j] = Some(i);
                } else if let Some(edge) = graph.find_edge(i, j) {
                    self.weights[i][j] = graph.edge_weight(edge);
                    self.next_hops[i][j] = Some(j);
                }
            }
        }
    }

    /// Based on the pseudo-code
    /// [on Wikipedia](https://en.wikipedia.org/wiki/Floyd%E2%80%93Warshall_algorithm#Path_reconstruction).
    ///
    /// `k` has to be the outermost loop. Only strict improvements are taken, so on ties the
    /// path found first is kept.
    fn floyd_warshall(&mut self) {
        let n = self.num_vertices();
        for k in 0..n {
            for i in 0..n {
                let ik = self.weights[i][k];
                if ik == EdgeWeight::INFINITY {
                    continue;
                }
                for j in 0..n {
                    let new_dist = ik + self.weights[k][j];
                    if new_dist < self.weights[i][j] {
                        self.weights[i][j] = new_dist;
                        self.next_hops[i][j] = self.next_hops[i][k];
                    }
                }
            }
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.weights.dimension
    }

    /// Weight of the shortest path from `from` to `to`; infinity if there is none.
    ///
    /// # Panics
    /// If either vertex is out of range.
    pub fn path_weight(&self, from: NodeIndex, to: NodeIndex) -> EdgeWeight {
        self.weights[from][to]
    }

    /// Like [ShortestPaths::path_weight] but returns an error for out-of-range vertices.
    pub fn checked_path_weight(&self, from: NodeIndex, to: NodeIndex) -> SteinerResult<EdgeWeight> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        Ok(self.path_weight(from, to))
    }

    /// # Panics
    /// If either vertex is out of range.
    pub fn is_reachable(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.path_weight(from, to) < EdgeWeight::INFINITY
    }

    /// Vertices of the shortest path from `from` to `to`, both included.
    ///
    /// Returns `[from]` if `from == to` and an empty path if `to` is unreachable.
    pub fn path(&self, from: NodeIndex, to: NodeIndex) -> SteinerResult<Vec<NodeIndex>> {
        self.check_vertex(from)?;
        self.check_vertex(to)?;
        if from == to {
            return Ok(vec![from]);
        }
        if self.next_hops[from][to].is_none() {
            return Ok(vec![]);
        }
        let mut current = from;
        let mut path = vec![from];
        // A simple path has fewer than `V` hops.
        for _ in 0..self.num_vertices() {
            current = self.next_hops[current][to]
                .ok_or(SteinerError::InconsistentPath { from, to })?;
            path.push(current);
            if current == to {
                return Ok(path);
            }
        }
        Err(SteinerError::InconsistentPath { from, to })
    }

    pub fn shortest_path(&self, from: NodeIndex, to: NodeIndex) -> SteinerResult<ShortestPath> {
        let path = self.path(from, to)?;
        Ok(ShortestPath::new(path, self.path_weight(from, to)))
    }

    fn check_vertex(&self, vertex: NodeIndex) -> SteinerResult<()> {
        if vertex < self.num_vertices() {
            Ok(())
        } else {
            Err(SteinerError::VertexOutOfRange {
                vertex,
                num_vertices: self.num_vertices(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{
        disconnected_test_graph, shortcut_test_graph, small_test_graph, square_test_graph,
        steiner_example_wiki,
    };
    use crate::graph::Graph;
    use crate::util::TestResult;
    use proptest::prelude::*;

    fn path_edge_weight(graph: &Graph, path: &[NodeIndex]) -> EdgeWeight {
        path.windows(2)
            .map(|w| {
                let edge = graph.find_edge(w[0], w[1]).expect("path uses a missing edge");
                graph.edge_weight(edge)
            })
            .sum()
    }

    #[test]
    fn test_shortest_path_matrix_1() -> TestResult {
        let graph = small_test_graph()?;
        let spm = ShortestPaths::new(&graph);
        assert_eq!(spm.shortest_path(0, 1)?, ShortestPath::new(vec![0, 1], 1.0));
        assert_eq!(spm.shortest_path(1, 2)?, ShortestPath::new(vec![1, 2], 2.0));
        // tie: the direct edge is found first and kept
        assert_eq!(spm.shortest_path(0, 2)?, ShortestPath::new(vec![0, 2], 3.0));
        Ok(())
    }

    #[test]
    fn test_shortest_path_matrix_2() -> TestResult {
        let graph = shortcut_test_graph()?;
        let spm = ShortestPaths::new(&graph);
        assert_eq!(spm.shortest_path(0, 2)?, ShortestPath::new(vec![0, 1, 2], 2.0));
        assert_eq!(spm.shortest_path(3, 0)?, ShortestPath::new(vec![3, 1, 0], 3.0));
        assert_eq!(spm.shortest_path(3, 2)?, ShortestPath::new(vec![3, 1, 2], 3.0));
        Ok(())
    }

    #[test]
    fn test_shortest_path_matrix_3() -> TestResult {
        let graph = steiner_example_wiki()?;
        let spm = ShortestPaths::new(&graph);
        assert_eq!(
            spm.shortest_path(11, 0)?,
            ShortestPath::new(vec![11, 10, 8, 4, 0], (10 + 15 + 30 + 25) as f64)
        );
        assert_eq!(
            spm.shortest_path(6, 9)?,
            ShortestPath::new(vec![6, 7, 9], (50 + 20) as f64)
        );
        assert_eq!(
            spm.shortest_path(6, 11)?,
            ShortestPath::new(vec![6, 7, 9, 10, 11], (10 + 40 + 50 + 20) as f64)
        );
        assert_eq!(
            spm.shortest_path(6, 0)?,
            ShortestPath::new(vec![6, 3, 2, 1, 0], (30 + 50 + 30 + 15) as f64)
        );
        Ok(())
    }

    #[test]
    fn test_square() -> TestResult {
        let graph = square_test_graph()?;
        let spm = compute_shortest_paths(&graph);
        assert_eq!(spm.path_weight(0, 2), 2.0);
        let path = spm.path(0, 2)?;
        assert!(path == vec![0, 1, 2] || path == vec![0, 3, 2]);
        Ok(())
    }

    #[test]
    fn test_path_to_self() -> TestResult {
        let graph = disconnected_test_graph()?;
        let spm = ShortestPaths::new(&graph);
        for v in graph.vertices() {
            assert_eq!(spm.path(v, v)?, vec![v]);
            assert_eq!(spm.path_weight(v, v), 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_unreachable() -> TestResult {
        let graph = disconnected_test_graph()?;
        let spm = ShortestPaths::new(&graph);
        assert_eq!(spm.path_weight(0, 4), EdgeWeight::INFINITY);
        assert!(!spm.is_reachable(4, 0));
        assert!(spm.is_reachable(0, 2));
        assert_eq!(spm.path(0, 4)?, Vec::<NodeIndex>::new());
        Ok(())
    }

    #[test]
    fn test_out_of_range() -> TestResult {
        let spm = ShortestPaths::new(&small_test_graph()?);
        assert_eq!(spm.checked_path_weight(0, 2)?, 3.0);
        assert_eq!(
            spm.checked_path_weight(7, 0),
            Err(SteinerError::VertexOutOfRange {
                vertex: 7,
                num_vertices: 3
            })
        );
        assert_eq!(
            spm.path(0, 3),
            Err(SteinerError::VertexOutOfRange {
                vertex: 3,
                num_vertices: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_empty_graph() {
        let spm = ShortestPaths::new(&Graph::new(0));
        assert_eq!(spm.num_vertices(), 0);
    }

    #[test]
    fn test_inconsistent_next_hops() -> TestResult {
        let mut spm = ShortestPaths::new(&square_test_graph()?);
        // 0 -> 1 -> 0 -> ... never reaches 2
        spm.next_hops[0][2] = Some(1);
        spm.next_hops[1][2] = Some(0);
        assert_eq!(
            spm.path(0, 2),
            Err(SteinerError::InconsistentPath { from: 0, to: 2 })
        );
        Ok(())
    }

    /// Random graphs with small integer weights, so sums are exact.
    fn random_graph() -> impl Strategy<Value = Graph> {
        (1usize..10).prop_flat_map(|n| {
            prop::collection::vec((0..n, 0..n, 0u32..20), 0..(n * 2)).prop_map(move |edges| {
                let mut graph = Graph::new(n);
                for (a, b, w) in edges {
                    if a != b {
                        graph.add_edge(a, b, w as f64).unwrap();
                    }
                }
                graph
            })
        })
    }

    proptest! {
        #[test]
        fn path_weight_matches_path(graph in random_graph()) {
            let spm = ShortestPaths::new(&graph);
            for u in graph.vertices() {
                for v in graph.vertices() {
                    let path = spm.path(u, v).unwrap();
                    if spm.is_reachable(u, v) {
                        prop_assert_eq!(path.first(), Some(&u));
                        prop_assert_eq!(path.last(), Some(&v));
                        prop_assert_eq!(path_edge_weight(&graph, &path), spm.path_weight(u, v));
                    } else {
                        prop_assert!(path.is_empty());
                    }
                }
            }
        }

        #[test]
        fn triangle_inequality_and_symmetry(graph in random_graph()) {
            let spm = ShortestPaths::new(&graph);
            let n = graph.num_vertices();
            for i in 0..n {
                prop_assert_eq!(spm.path(i, i).unwrap(), vec![i]);
                for j in 0..n {
                    prop_assert_eq!(spm.path_weight(i, j), spm.path_weight(j, i));
                    for k in 0..n {
                        prop_assert!(
                            spm.path_weight(i, j) <= spm.path_weight(i, k) + spm.path_weight(k, j)
                        );
                    }
                }
            }
        }
    }
}
