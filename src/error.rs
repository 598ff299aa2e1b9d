use crate::graph::{EdgeWeight, NodeIndex};
use thiserror::Error;

/// Errors raised by graph construction, shortest path queries and the Steiner tree approximation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SteinerError {
    /// A caller-supplied argument is unusable, e.g. an empty target list.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A vertex id outside of `0..num_vertices`.
    #[error("vertex {vertex} is out of range (graph has {num_vertices} vertices)")]
    VertexOutOfRange {
        vertex: NodeIndex,
        num_vertices: usize,
    },

    /// The edge can't be added to the graph.
    #[error("invalid edge {from} -- {to}: {reason}")]
    InvalidEdge {
        from: NodeIndex,
        to: NodeIndex,
        reason: String,
    },

    /// The target lies in a different connected component than the partial tree.
    #[error("target {target} is not reachable from the tree")]
    TargetUnreachable { target: NodeIndex },

    /// The total tree weight does not fit into a `u64`.
    #[error("tree weight overflows: {total} + {added}")]
    WeightOverflow { total: u64, added: EdgeWeight },

    /// The next-hop matrix does not lead from `from` to `to` within `num_vertices` steps.
    /// This is a bug, not a property of the input.
    #[error("inconsistent next-hop matrix: no terminating path from {from} to {to}")]
    InconsistentPath { from: NodeIndex, to: NodeIndex },
}

pub type SteinerResult<T> = Result<T, SteinerError>;
