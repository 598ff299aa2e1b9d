use crate::error::{SteinerError, SteinerResult};
use crate::graph::{EdgeWeight, Graph, NodeIndex, WeightedGraph};
use crate::shortest_paths::ShortestPaths;
use crate::steiner_tree::tree::{Splice, SteinerTree};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Closest `(target, attachment)` pair between the unconnected targets and the tree.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ClosestPair {
    target: NodeIndex,
    attachment: NodeIndex,
    distance: EdgeWeight,
}

/// Greedy nearest-target Steiner tree approximation.
///
/// Starts with `targets[0]` and repeatedly splices in the shortest path to the unconnected target
/// closest to any vertex already in the tree. This is a heuristic; the result is not necessarily
/// minimal.
///
/// Ties are broken deterministically: targets are compared in ascending id order, then tree
/// vertices in ascending id order, and a candidate only wins with a strictly smaller distance.
/// So on equal distances the lowest target id is connected first, attached to the lowest tree
/// vertex id.
///
/// # Errors
/// - [SteinerError::InvalidArgument] if `targets` is empty.
/// - [SteinerError::VertexOutOfRange] if a target is not a vertex of `graph`.
/// - [SteinerError::TargetUnreachable] if some target is in another connected component than
///   `targets[0]`.
pub fn approximate<G: WeightedGraph + ?Sized>(
    graph: &G,
    targets: &[NodeIndex],
) -> SteinerResult<SteinerTree> {
    check_targets(targets, graph.num_vertices())?;
    let shortest_paths = ShortestPaths::new(graph);
    approximate_with(graph, &shortest_paths, targets)
}

/// Like [approximate] but reuses shortest paths that were already computed for `graph`.
pub fn approximate_with<G: WeightedGraph + ?Sized>(
    graph: &G,
    shortest_paths: &ShortestPaths,
    targets: &[NodeIndex],
) -> SteinerResult<SteinerTree> {
    if shortest_paths.num_vertices() != graph.num_vertices() {
        return Err(SteinerError::InvalidArgument(format!(
            "shortest paths cover {} vertices but the graph has {}",
            shortest_paths.num_vertices(),
            graph.num_vertices()
        )));
    }
    let (&root, rest) = check_targets(targets, graph.num_vertices())?;
    let mut tree = SteinerTree::new(root);
    let mut remaining = rest.iter().copied().collect::<BTreeSet<_>>();
    while let Some(closest) = closest_pair(&remaining, tree.vertices(), shortest_paths) {
        if closest.distance == EdgeWeight::INFINITY {
            return Err(SteinerError::TargetUnreachable {
                target: closest.target,
            });
        }
        let path = shortest_paths.path(closest.attachment, closest.target)?;
        debug!(
            terminal = closest.target,
            attachment = closest.attachment,
            distance = closest.distance,
            hops = path.len().saturating_sub(1),
            "connecting terminal"
        );
        tree.splice(
            graph,
            Splice {
                target: closest.target,
                attachment: closest.attachment,
                path,
                weight: closest.distance,
            },
        )?;
        remaining.remove(&closest.target);
    }
    debug!(
        edges = tree.edges().len(),
        weight = tree.weight(),
        "greedy Steiner tree complete"
    );
    Ok(tree)
}

/// Run [approximate] and mark every edge of the resulting tree in `graph`.
///
/// Returns the total (truncated) weight. Marks that are already set stay set, so reset them with
/// [Graph::reset_marks] first to observe only this tree. On error no marks are touched.
pub fn approximate_steiner_tree(graph: &mut Graph, targets: &[NodeIndex]) -> SteinerResult<u64> {
    let tree = approximate(&*graph, targets)?;
    tree.mark_in(graph);
    Ok(tree.weight())
}

/// Split off the root and validate the targets.
fn check_targets(
    targets: &[NodeIndex],
    num_vertices: usize,
) -> SteinerResult<(&NodeIndex, &[NodeIndex])> {
    let split = targets
        .split_first()
        .ok_or_else(|| SteinerError::InvalidArgument("the target list is empty".to_string()))?;
    if let Some(&vertex) = targets.iter().find(|&&t| t >= num_vertices) {
        return Err(SteinerError::VertexOutOfRange {
            vertex,
            num_vertices,
        });
    }
    Ok(split)
}

/// `O(|targets| * |selected|)` scan for the closest pair. `None` iff `targets` or `selected` is
/// empty. The distance is infinite if no target can be reached, in which case the lowest target
/// is returned.
fn closest_pair(
    targets: &BTreeSet<NodeIndex>,
    selected: &BTreeSet<NodeIndex>,
    shortest_paths: &ShortestPaths,
) -> Option<ClosestPair> {
    let mut best: Option<ClosestPair> = None;
    for &target in targets {
        for &attachment in selected {
            let distance = shortest_paths.path_weight(attachment, target);
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(ClosestPair {
                    target,
                    attachment,
                    distance,
                });
            }
        }
    }
    trace!(?best, "closest pair");
    best
}
