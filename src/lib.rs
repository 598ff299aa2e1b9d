//! All-pairs shortest paths (Floyd-Warshall with path reconstruction) and a greedy
//! nearest-target approximation of Steiner trees built on top of them.

mod error;
mod graph;
mod shortest_paths;
mod steiner_tree;
mod util;

pub use error::{SteinerError, SteinerResult};
pub use graph::{
    parse_graph, EdgeIndex, EdgeWeight, Graph, NodeIndex, ParseError, WeightedGraph,
    MAX_EDGE_WEIGHT,
};
pub use shortest_paths::{compute_shortest_paths, ShortestPath, ShortestPaths};
pub use steiner_tree::algorithms::{approximate, approximate_steiner_tree, approximate_with};
pub use steiner_tree::tree::{Splice, SteinerTree};
