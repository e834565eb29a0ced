//! The SBP graph: an arena of candidate nodes and cost edges.
//!
//! Nodes and edges are referenced through the stable handles [`NodeId`] and [`EdgeId`].
//! Reduction never frees anything; eliminated nodes and edges are *absorbed* by the element
//! that replaced them, and the finalizer later walks these ownership links back to resolve
//! the choice of every node the user added.
//!
//! The graph also keeps a snapshot of the original relations (user-provided node costs and
//! edge tables), which is used to evaluate a solution on the original problem once the
//! reduced graph no longer resembles it.

mod builder;
mod edge;
mod node;

#[cfg(test)]
mod tests;

pub use builder::SbpGraphBuilder;
pub use edge::{EdgeKind, SbpEdge};
pub use node::SbpNode;
pub(crate) use node::{Child, MergedPair};

use crate::cost_table::CostTable;
use crate::error::{SbpError, SbpResult};
use crate::{FORBIDDEN_COST, normalize_cost};
use std::fmt::{Display, Formatter};

/// Handle of a node in one [`SbpGraph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(usize);

/// Handle of an edge in one [`SbpGraph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> NodeId {
        NodeId(index)
    }

    /// Nodes are numbered in the order of creation, starting from zero.
    pub fn index(self) -> usize {
        self.0
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// An edge of the original problem, preserved for evaluating the final assignment.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct Relation {
    pub(crate) edge: EdgeId,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) cost: CostTable,
}

/// A mutable cost-minimization graph.
///
/// Build it using [`SbpGraph::add_node`] and [`SbpGraph::add_edge`] (or through
/// [`SbpGraphBuilder`]), then either run the whole [`SbpOptimization`](crate::SbpOptimization)
/// or drive the individual phases manually.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbpGraph {
    pub(crate) nodes: Vec<SbpNode>,
    pub(crate) edges: Vec<SbpEdge>,
    pub(crate) live: Vec<NodeId>,
    pub(crate) origin_cost: Vec<Vec<f64>>,
    pub(crate) relations: Vec<Relation>,
    pub(crate) graph_cost: f64,
    pub(crate) merge_threshold: usize,
    /// Number of eliminations and merges performed so far.
    pub(crate) eliminations: usize,
    pub(crate) overlap_applied: bool,
}

impl Default for SbpGraph {
    fn default() -> Self {
        SbpGraph::new()
    }
}

/// Merging never creates nodes with more candidates than this (default).
pub const DEFAULT_MERGE_THRESHOLD: usize = 100;

impl SbpGraph {
    pub fn new() -> SbpGraph {
        SbpGraph {
            nodes: Vec::new(),
            edges: Vec::new(),
            live: Vec::new(),
            origin_cost: Vec::new(),
            relations: Vec::new(),
            graph_cost: 0.0,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            eliminations: 0,
            overlap_applied: false,
        }
    }

    /// Add a node with the given per-candidate cost.
    ///
    /// Costs of `+inf` (or anything above [`FORBIDDEN_COST`]) are stored as
    /// [`FORBIDDEN_COST`]. Fails if `cost` is empty or contains `NaN` or `-inf`, or if the
    /// graph is already reduced.
    pub fn add_node(&mut self, cost: Vec<f64>) -> SbpResult<NodeId> {
        if self.is_reduced() {
            return Err(SbpError::AlreadyReduced);
        }
        let id = NodeId(self.nodes.len());
        if cost.is_empty() {
            return Err(SbpError::EmptyCandidates(id));
        }
        let cost = cost
            .iter()
            .enumerate()
            .map(|(index, it)| {
                normalize_cost(*it).ok_or_else(|| {
                    SbpError::InvalidCost(format!("cost of candidate {index} of node {id}"))
                })
            })
            .collect::<SbpResult<Vec<f64>>>()?;
        self.origin_cost.push(cost.clone());
        self.insert_node(SbpNode::new(id, cost, true));
        Ok(id)
    }

    /// Add an edge between two distinct nodes of this graph.
    ///
    /// The table must have `count(start)` rows and `count(end)` columns. Several edges
    /// between the same pair of nodes are allowed and are later summed. Entries are
    /// validated and capped like the costs of [`SbpGraph::add_node`].
    pub fn add_edge(&mut self, start: NodeId, end: NodeId, cost: CostTable) -> SbpResult<EdgeId> {
        if self.is_reduced() {
            return Err(SbpError::AlreadyReduced);
        }
        for node in [start, end] {
            if node.0 >= self.nodes.len() {
                return Err(SbpError::UnknownNode(node));
            }
        }
        if start == end {
            return Err(SbpError::SelfLoop(start));
        }
        let expected = (self.candidate_count(start), self.candidate_count(end));
        if cost.shape() != expected {
            return Err(SbpError::ShapeMismatch {
                start,
                end,
                expected,
                actual: cost.shape(),
            });
        }
        if cost.iter().any(|it| normalize_cost(it).is_none()) {
            return Err(SbpError::InvalidCost(format!("cost table of edge {start} -> {end}")));
        }
        let cost = cost.map(|it| it.min(FORBIDDEN_COST));
        let id = self.insert_edge(start, end, cost.clone(), EdgeKind::Plain);
        self.relations.push(Relation {
            edge: id,
            start,
            end,
            cost,
        });
        Ok(id)
    }

    /// Access a node of this graph.
    ///
    /// # Panics
    ///
    /// Panics if the node does not belong to this graph.
    pub fn node(&self, id: NodeId) -> &SbpNode {
        &self.nodes[id.0]
    }

    /// Access an edge of this graph.
    ///
    /// # Panics
    ///
    /// Panics if the edge does not belong to this graph.
    pub fn edge(&self, id: EdgeId) -> &SbpEdge {
        &self.edges[id.0]
    }

    /// Total number of nodes ever created (including absorbed and merged nodes).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All edges ever created, including absorbed ones.
    pub fn edges(&self) -> &[SbpEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes of the reduced graph.
    pub fn live_nodes(&self) -> &[NodeId] {
        &self.live
    }

    pub fn live_node_count(&self) -> usize {
        self.live.len()
    }

    /// Edges of the reduced graph (every edge is reported once, by its start node).
    pub fn live_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.live
            .iter()
            .flat_map(|node| self.nodes[node.0].edges_out.iter().copied())
    }

    /// Nodes added through [`SbpGraph::add_node`], in the order of creation.
    pub fn original_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|it| it.original).map(|it| it.id)
    }

    pub fn candidate_count(&self, node: NodeId) -> usize {
        self.nodes[node.0].cost.len()
    }

    pub fn merge_threshold(&self) -> usize {
        self.merge_threshold
    }

    pub fn set_merge_threshold(&mut self, threshold: usize) {
        self.merge_threshold = threshold;
    }

    /// The cost stored by the last call to [`SbpGraph::compute_cost`].
    pub fn graph_cost(&self) -> f64 {
        self.graph_cost
    }

    /// True once any elimination or merge modified the graph.
    pub fn is_reduced(&self) -> bool {
        self.eliminations > 0
    }

    /// Assign a candidate to a node directly.
    ///
    /// # Panics
    ///
    /// Panics if the candidate is out of range.
    pub fn set_choice(&mut self, node: NodeId, choice: usize) {
        let node = &mut self.nodes[node.0];
        assert!(choice < node.cost.len(), "Candidate out of range.");
        node.final_choice = Some(choice);
    }

    /// Evaluate the reduced graph under the current choices: the own cost of every live node
    /// plus the cost of every live edge. The result is also stored as
    /// [`SbpGraph::graph_cost`].
    pub fn compute_cost(&mut self) -> f64 {
        let mut total = 0.0;
        for node in &self.live {
            let node = &self.nodes[node.0];
            let choice = node.current_choice();
            total += node.cost[choice];
            for edge in &node.edges_out {
                let edge = &self.edges[edge.0];
                total += edge.cost.get(choice, self.nodes[edge.end.0].current_choice());
            }
        }
        self.graph_cost = total;
        total
    }

    /// Evaluate the original problem (the nodes and edges added by the user, with overlap
    /// adjustment applied) under the current choices of the original nodes.
    pub fn original_cost(&self) -> f64 {
        let mut total = 0.0;
        for (index, cost) in self.origin_cost.iter().enumerate() {
            total += cost[self.nodes[index].current_choice()];
        }
        for relation in &self.relations {
            let start = self.nodes[relation.start.0].current_choice();
            let end = self.nodes[relation.end.0].current_choice();
            total += relation.cost.get(start, end);
        }
        total
    }

    /// Incident edges of a node: incoming edges first, then outgoing ones.
    pub(crate) fn incident_edges(&self, node: NodeId) -> Vec<EdgeId> {
        let node = &self.nodes[node.0];
        let mut result = Vec::with_capacity(node.degree());
        result.extend_from_slice(&node.edges_in);
        result.extend_from_slice(&node.edges_out);
        result
    }

    pub(crate) fn insert_node(&mut self, mut node: SbpNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.id = id;
        node.live_index = Some(self.live.len());
        self.live.push(id);
        self.nodes.push(node);
        id
    }

    /// Create an edge and register it in the adjacency of both endpoints.
    pub(crate) fn insert_edge(
        &mut self,
        start: NodeId,
        end: NodeId,
        cost: CostTable,
        kind: EdgeKind,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(SbpEdge::new(id, start, end, cost, kind));
        self.nodes[start.0].edges_out.push(id);
        self.nodes[end.0].edges_in.push(id);
        id
    }

    /// Remove an edge from the adjacency of both endpoints.
    pub(crate) fn detach_edge(&mut self, edge: EdgeId) {
        let (start, end) = (self.edges[edge.0].start, self.edges[edge.0].end);
        self.nodes[start.0].edges_out.retain(|it| *it != edge);
        self.nodes[end.0].edges_in.retain(|it| *it != edge);
    }

    /// Remove a node from the live list.
    pub(crate) fn retire_node(&mut self, node: NodeId) {
        let Some(index) = self.nodes[node.0].live_index.take() else {
            return;
        };
        self.live.swap_remove(index);
        if let Some(moved) = self.live.get(index) {
            self.nodes[moved.0].live_index = Some(index);
        }
    }

    /// Verify the structural invariants of the reduced graph.
    ///
    /// Every live node has a cost per candidate and a valid choice (if any), every edge of a
    /// live node connects it to another live node, is registered on both sides and its table
    /// matches the candidate counts of its endpoints.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        for (index, node) in self.live.iter().enumerate() {
            let data = &self.nodes[node.0];
            if data.live_index != Some(index) {
                return Err(format!("Live index of {node} is out of sync."));
            }
            if data.cost.is_empty() {
                return Err(format!("Live node {node} has no candidates."));
            }
            if let Some(choice) = data.final_choice {
                if choice >= data.cost.len() {
                    return Err(format!("Choice {choice} of {node} is out of range."));
                }
            }
            for edge in &data.edges_out {
                let e = &self.edges[edge.0];
                if e.start != *node || !self.nodes[e.end.0].is_live() {
                    return Err(format!("Outgoing edge {edge} of {node} is not live."));
                }
                if !self.nodes[e.end.0].edges_in.contains(edge) {
                    return Err(format!("Edge {edge} is missing in the inputs of {}.", e.end));
                }
            }
            for edge in &data.edges_in {
                let e = &self.edges[edge.0];
                if e.end != *node || !self.nodes[e.start.0].is_live() {
                    return Err(format!("Incoming edge {edge} of {node} is not live."));
                }
                if !self.nodes[e.start.0].edges_out.contains(edge) {
                    return Err(format!("Edge {edge} is missing in the outputs of {}.", e.start));
                }
            }
        }
        for edge in &self.edges {
            let expected = (
                self.candidate_count(edge.start),
                self.candidate_count(edge.end),
            );
            if edge.cost.shape() != expected {
                return Err(format!(
                    "Edge {} has shape {:?}, expected {:?}.",
                    edge.id,
                    edge.cost.shape(),
                    expected
                ));
            }
        }
        Ok(())
    }
}
