use crate::graph::{EdgeId, NodeId};

/// One decision point of the [`SbpGraph`](crate::SbpGraph): a list of candidate costs plus
/// the adjacency of the node.
///
/// Nodes are never freed. Once a node is eliminated or merged, it is no longer live, but it
/// stays in the arena of its graph so that its final choice can be resolved by the finalizer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbpNode {
    pub(crate) id: NodeId,
    pub(crate) cost: Vec<f64>,
    pub(crate) edges_in: Vec<EdgeId>,
    pub(crate) edges_out: Vec<EdgeId>,
    pub(crate) children: Vec<Child>,
    pub(crate) merged: Option<MergedPair>,
    pub(crate) final_choice: Option<usize>,
    /// Position in the live list of the graph, `None` once the node is absorbed.
    pub(crate) live_index: Option<usize>,
    pub(crate) layer: Option<usize>,
    pub(crate) original: bool,
}

/// A degree-one node detached into its parent.
///
/// `choice[p]` is the candidate of the child that minimizes
/// `child.cost[c] + edge(p, c)` for the parent candidate `p`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Child {
    pub(crate) node: NodeId,
    pub(crate) edge: EdgeId,
    pub(crate) choice: Vec<usize>,
}

/// The halves of a node created by merging.
///
/// `pairs[m] = (i, j)` means the merged candidate `m` selects candidate `i` of `first` and
/// candidate `j` of `second`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergedPair {
    pub(crate) first: NodeId,
    pub(crate) second: NodeId,
    pub(crate) pairs: Vec<(usize, usize)>,
    pub(crate) common_edge: Option<EdgeId>,
}

impl SbpNode {
    pub(crate) fn new(id: NodeId, cost: Vec<f64>, original: bool) -> SbpNode {
        SbpNode {
            id,
            cost,
            edges_in: Vec::new(),
            edges_out: Vec::new(),
            children: Vec::new(),
            merged: None,
            final_choice: None,
            live_index: None,
            layer: None,
            original,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn candidate_count(&self) -> usize {
        self.cost.len()
    }

    /// The own cost of every candidate.
    ///
    /// For a node which absorbed children, this includes their minimal contribution.
    pub fn cost(&self) -> &[f64] {
        &self.cost
    }

    pub fn edges_in(&self) -> &[EdgeId] {
        &self.edges_in
    }

    pub fn edges_out(&self) -> &[EdgeId] {
        &self.edges_out
    }

    /// The total number of incident edges (both directions).
    pub fn degree(&self) -> usize {
        self.edges_in.len() + self.edges_out.len()
    }

    /// Nodes absorbed into this node by degree-one elimination.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().map(|it| it.node)
    }

    /// The two halves of a node created by merging, or `None` for any other node.
    pub fn merged_halves(&self) -> Option<(NodeId, NodeId)> {
        self.merged.as_ref().map(|it| (it.first, it.second))
    }

    /// The resolved candidate index, `None` until the node is assigned.
    pub fn final_choice(&self) -> Option<usize> {
        self.final_choice
    }

    /// True if the node is still part of the reduced graph.
    pub fn is_live(&self) -> bool {
        self.live_index.is_some()
    }

    /// True if the node was added by the user (as opposed to a node created by merging).
    pub fn is_original(&self) -> bool {
        self.original
    }

    /// Longest-path depth of the node, if computed by
    /// [`SbpGraph::compute_layers`](crate::SbpGraph::compute_layers).
    pub fn layer(&self) -> Option<usize> {
        self.layer
    }

    /// The smallest own cost over all candidates.
    pub fn min_cost(&self) -> f64 {
        self.cost.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Index of the cheapest candidate (first one wins on ties).
    pub fn cheapest_candidate(&self) -> usize {
        let mut best = 0;
        for (index, cost) in self.cost.iter().enumerate() {
            if *cost < self.cost[best] {
                best = index;
            }
        }
        best
    }

    /// The current candidate of a live node. Nodes that were not assigned yet
    /// count as candidate `0`.
    pub(crate) fn current_choice(&self) -> usize {
        self.final_choice.unwrap_or(0)
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeId) {
        self.edges_in.retain(|it| *it != edge);
        self.edges_out.retain(|it| *it != edge);
    }
}
